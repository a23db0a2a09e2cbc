use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run_add(app: &App, query: &str, phrase: &str, format: &OutputFormat) -> Result<()> {
    let bloom = app.find_bloom(query)?;
    let bloom = app
        .storage
        .add_phrase(&bloom.id, phrase)
        .context("Failed to add wake phrase")?;

    match format {
        OutputFormat::Json => print_phrases(&bloom.id, &bloom.wake_phrases)?,
        OutputFormat::Plain => {
            println!(
                "Added wake phrase to \"{}\" ({} total)",
                bloom.title,
                bloom.wake_phrases.len()
            );
        }
    }
    Ok(())
}

pub fn run_remove(app: &App, query: &str, phrase: &str, format: &OutputFormat) -> Result<()> {
    let bloom = app.find_bloom(query)?;
    let bloom = app
        .storage
        .remove_phrase(&bloom.id, phrase)
        .context("Failed to remove wake phrase")?;

    match format {
        OutputFormat::Json => print_phrases(&bloom.id, &bloom.wake_phrases)?,
        OutputFormat::Plain => {
            println!(
                "Removed wake phrase from \"{}\" ({} left)",
                bloom.title,
                bloom.wake_phrases.len()
            );
        }
    }
    Ok(())
}

pub fn run_list(app: &App, query: &str, format: &OutputFormat) -> Result<()> {
    let bloom = app.find_bloom(query)?;

    match format {
        OutputFormat::Json => print_phrases(&bloom.id, &bloom.wake_phrases)?,
        OutputFormat::Plain => {
            if bloom.wake_phrases.is_empty() {
                println!("(no wake phrases)");
            }
            for phrase in &bloom.wake_phrases {
                println!("  - {}", phrase);
            }
        }
    }
    Ok(())
}

fn print_phrases(id: &str, phrases: &[String]) -> Result<()> {
    let output = serde_json::json!({
        "id": id,
        "wakePhrases": phrases,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
