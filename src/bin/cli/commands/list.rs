use anyhow::Result;

use bloomwake_lib::blooms::PhraseFilter;
use bloomwake_lib::ritual::order_blooms;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, filter: PhraseFilter, format: &OutputFormat, use_color: bool) -> Result<()> {
    let blooms: Vec<_> = order_blooms(app.list_blooms()?)
        .into_iter()
        .filter(|b| filter.matches(b))
        .collect();

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = blooms
                .iter()
                .map(|b| {
                    serde_json::json!({
                        "id": b.id,
                        "title": b.title,
                        "resonance": b.resonance,
                        "wakeOrder": b.wake_order,
                        "phraseCount": b.wake_phrases.len(),
                        "activationCount": b.activation_count,
                        "lastActivated": b.last_activated,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if blooms.is_empty() {
                println!("(no blooms)");
            }
            for bloom in &blooms {
                println!("{}", terminal::bloom_line(bloom, app.config.bar_width, use_color));
                println!("  {}", terminal::paint(&bloom.id, Color::GRAY, use_color));
            }
        }
    }

    Ok(())
}
