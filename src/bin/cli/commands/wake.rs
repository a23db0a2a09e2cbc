use anyhow::{Context, Result};

use bloomwake_lib::blooms::{ActivationFilter, Bloom, KnowledgeStore};
use bloomwake_lib::ritual::{
    ChainResponse, ChainedRitual, PhraseResolver, RitualSession, SessionOptions, TerminalInput,
};

use crate::app::App;
use crate::render::terminal::{self, Color, TerminalPresenter};
use crate::{OutputFormat, WakeArgs};

pub fn run(app: &App, args: &WakeArgs, format: &OutputFormat, use_color: bool) -> Result<()> {
    if let Some(phrase) = &args.respond {
        let (bloom_id, session) = chain_step(args)?;
        let classifier = app.classifier();
        let secret = app.config.resolve_secret();
        let response = ChainedRitual::new(&app.storage, &classifier, &secret).respond(bloom_id, phrase, session)?;
        return print_chain(&response);
    }

    if args.skip {
        let (bloom_id, session) = chain_step(args)?;
        let classifier = app.classifier();
        let secret = app.config.resolve_secret();
        let response = ChainedRitual::new(&app.storage, &classifier, &secret).skip(bloom_id, session)?;
        return print_chain(&response);
    }

    let blooms = fetch(app, args)?;

    if args.begin {
        let classifier = app.classifier();
        let secret = app.config.resolve_secret();
        let response = ChainedRitual::new(&app.storage, &classifier, &secret)
            .with_activation(!args.no_activate)
            .begin(blooms, &mut PhraseResolver::from_entropy())?;
        return print_chain(&response);
    }

    if args.engage {
        return engage(app, args, blooms, format, use_color);
    }

    cascade(app, args, &blooms, format, use_color)
}

fn fetch(app: &App, args: &WakeArgs) -> Result<Vec<Bloom>> {
    let filter = ActivationFilter {
        min_resonance: args.min_resonance,
        activated_within_days: args.days,
    };
    let limit = args.limit.unwrap_or(app.config.default_limit);
    app.storage
        .fetch_candidates(limit, &filter)
        .context("Failed to fetch blooms")
}

fn chain_step(args: &WakeArgs) -> Result<(&str, &str)> {
    let bloom_id = args.bloom_id.as_deref().context("--bloom-id is required")?;
    let session = args.session.as_deref().context("--session is required")?;
    Ok((bloom_id, session))
}

fn print_chain(response: &ChainResponse) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

fn engage(app: &App, args: &WakeArgs, blooms: Vec<Bloom>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let classifier = app.classifier();
    let options = SessionOptions {
        set_missing: args.set_missing,
        activate: !args.no_activate,
    };

    let mut input = TerminalInput::new().context("Failed to open terminal input")?;
    let mut presenter = TerminalPresenter::new(use_color, app.config.bar_width);
    if matches!(format, OutputFormat::Json) {
        presenter = presenter.without_summary();
    }

    let mut session = RitualSession::new(&app.storage, &classifier, PhraseResolver::from_entropy(), options);
    let report = session.run(blooms, &mut input, &mut presenter)?;

    if matches!(format, OutputFormat::Json) {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

/// Print the ordered blooms with their content, no recall asked
fn cascade(app: &App, args: &WakeArgs, blooms: &[Bloom], format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(blooms)?);
        }
        OutputFormat::Plain => {
            if blooms.is_empty() {
                println!("Nothing to wake.");
            }
            for (i, bloom) in blooms.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!(
                    "{} {}",
                    terminal::paint(&format!("{}.", i + 1), Color::GRAY, use_color),
                    terminal::bloom_line(bloom, app.config.bar_width, use_color)
                );
                println!("{}", terminal::content_block(bloom));
            }
        }
    }

    if !args.no_activate && !blooms.is_empty() {
        let ids: Vec<String> = blooms.iter().map(|b| b.id.clone()).collect();
        if let Err(e) = app.storage.mark_activated(&ids) {
            log::warn!("Failed to mark blooms as activated: {}", e);
        }
    }
    Ok(())
}
