use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, query: &str, order: &str, format: &OutputFormat) -> Result<()> {
    let order = match order.trim() {
        "-" => None,
        n => Some(
            n.parse::<i32>()
                .with_context(|| format!("Invalid wake order '{}', expected a number or '-'", n))?,
        ),
    };

    let bloom = app.find_bloom(query)?;
    let bloom = app
        .storage
        .set_wake_order(&bloom.id, order)
        .context("Failed to set wake order")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": bloom.id,
                "wakeOrder": bloom.wake_order,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => match bloom.wake_order {
            Some(n) => println!("\"{}\" now wakes at position {}", bloom.title, n),
            None => println!("Cleared wake order of \"{}\"", bloom.title),
        },
    }
    Ok(())
}
