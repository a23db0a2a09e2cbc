use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &App,
    title: String,
    body: Option<String>,
    resonance: f32,
    phrases: Vec<String>,
    wake_order: Option<i32>,
    format: &OutputFormat,
) -> Result<()> {
    let bloom = app
        .storage
        .create_bloom(title, body.unwrap_or_default(), resonance, phrases, wake_order)
        .context("Failed to create bloom")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&bloom)?);
        }
        OutputFormat::Plain => {
            println!("Created bloom \"{}\"", bloom.title);
            println!("  Resonance: {:.2}", bloom.resonance);
            if let Some(order) = bloom.wake_order {
                println!("  Wake order: {}", order);
            }
            if !bloom.wake_phrases.is_empty() {
                println!("  Wake phrases: {}", bloom.wake_phrases.len());
            }
            println!("  ID: {}", bloom.id);
        }
    }

    Ok(())
}
