use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let bloom = app.find_bloom(query)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&bloom)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::bloom_line(&bloom, app.config.bar_width, use_color));
            let activated = match bloom.last_activated {
                Some(at) => format!(
                    "woken {} times, last {}",
                    bloom.activation_count,
                    at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                ),
                None => "never woken".to_string(),
            };
            println!("{}", terminal::paint(&activated, Color::DIM, use_color));
            println!();
            println!("{}", terminal::content_block(&bloom));
        }
    }

    Ok(())
}
