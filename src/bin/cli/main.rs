mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use bloomwake_lib::blooms::PhraseFilter;
use bloomwake_lib::ritual::RitualError;

/// Exit status when the ritual is refused for lack of a terminal
const EXIT_NOT_INTERACTIVE: i32 = 2;

#[derive(Parser)]
#[command(name = "bloomwake", about = "Recall-gated wake ritual over a bloom store", version)]
struct Cli {
    /// Data directory (default: platform local data dir)
    #[arg(long, global = true, env = "BLOOMWAKE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new bloom
    Add {
        /// Bloom title
        title: String,
        /// Body text (use "-" to read from stdin)
        #[arg(long)]
        body: Option<String>,
        /// Importance between 0 and 1
        #[arg(long, default_value = "0.5")]
        resonance: f32,
        /// Wake phrase (repeatable)
        #[arg(long = "phrase")]
        phrases: Vec<String>,
        /// Explicit position in the ritual
        #[arg(long, allow_negative_numbers = true)]
        wake_order: Option<i32>,
    },

    /// List blooms in ritual order
    List {
        /// Only blooms with a wake phrase
        #[arg(long)]
        has_wake_phrase: bool,

        /// Only blooms without a wake phrase
        #[arg(long, conflicts_with = "has_wake_phrase")]
        missing_wake_phrase: bool,
    },

    /// Show a bloom's content
    Show {
        /// Bloom id or title (case-insensitive prefix match)
        bloom: String,
    },

    /// Manage wake phrases
    #[command(subcommand)]
    Phrase(PhraseCommand),

    /// Set or clear a bloom's wake order
    Order {
        /// Bloom id or title
        bloom: String,
        /// Position, or "-" to clear
        #[arg(allow_hyphen_values = true)]
        order: String,
    },

    /// Run the wake ritual
    Wake(WakeArgs),
}

#[derive(Subcommand)]
enum PhraseCommand {
    /// Add a wake phrase
    Add { bloom: String, phrase: String },
    /// Remove a wake phrase
    Remove { bloom: String, phrase: String },
    /// List wake phrases
    List { bloom: String },
}

#[derive(Args)]
pub struct WakeArgs {
    /// Maximum blooms (default from ritual.toml)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Every bloom at or above this resonance (overrides --limit)
    #[arg(long)]
    pub min_resonance: Option<f32>,

    /// After the core blooms, add blooms activated within this many days
    #[arg(long)]
    pub days: Option<i64>,

    /// Do not record activation
    #[arg(long)]
    pub no_activate: bool,

    /// Interactive recall of each bloom's wake phrase
    #[arg(short, long, conflicts_with_all = ["begin", "respond", "skip"])]
    pub engage: bool,

    /// Prompt for a phrase when a bloom has none
    #[arg(short = 's', long, requires = "engage")]
    pub set_missing: bool,

    /// Start a chained ritual and print the session token
    #[arg(long, conflicts_with_all = ["respond", "skip"])]
    pub begin: bool,

    /// Answer the current bloom of a chained ritual
    #[arg(long, value_name = "PHRASE", requires_all = ["bloom_id", "session"], conflicts_with = "skip")]
    pub respond: Option<String>,

    /// Skip the current bloom of a chained ritual
    #[arg(long, requires_all = ["bloom_id", "session"])]
    pub skip: bool,

    /// Bloom the chained step applies to
    #[arg(long)]
    pub bloom_id: Option<String>,

    /// Session token from the previous chained step
    #[arg(long)]
    pub session: Option<String>,
}

/// Read content from stdin when given as "-"
fn resolve_content(content: Option<String>) -> anyhow::Result<Option<String>> {
    match content.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)?;
            Ok(Some(buf))
        }
        _ => Ok(content),
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    if let Err(e) = run(cli, use_color) {
        eprintln!("Error: {:#}", e);
        let code = match e.downcast_ref::<RitualError>() {
            Some(RitualError::NonInteractiveInput) => EXIT_NOT_INTERACTIVE,
            _ => 1,
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli, use_color: bool) -> anyhow::Result<()> {
    let app = app::App::new(cli.data_dir)?;

    match cli.command {
        Command::Add {
            title,
            body,
            resonance,
            phrases,
            wake_order,
        } => {
            let body = resolve_content(body)?;
            commands::add::run(&app, title, body, resonance, phrases, wake_order, &cli.format)?;
        }
        Command::List {
            has_wake_phrase,
            missing_wake_phrase,
        } => {
            let filter = if has_wake_phrase {
                PhraseFilter::WithPhrase
            } else if missing_wake_phrase {
                PhraseFilter::WithoutPhrase
            } else {
                PhraseFilter::Any
            };
            commands::list::run(&app, filter, &cli.format, use_color)?;
        }
        Command::Show { bloom } => {
            commands::show::run(&app, &bloom, &cli.format, use_color)?;
        }
        Command::Phrase(subcmd) => match subcmd {
            PhraseCommand::Add { bloom, phrase } => {
                commands::phrase::run_add(&app, &bloom, &phrase, &cli.format)?;
            }
            PhraseCommand::Remove { bloom, phrase } => {
                commands::phrase::run_remove(&app, &bloom, &phrase, &cli.format)?;
            }
            PhraseCommand::List { bloom } => {
                commands::phrase::run_list(&app, &bloom, &cli.format)?;
            }
        },
        Command::Order { bloom, order } => {
            commands::order::run(&app, &bloom, &order, &cli.format)?;
        }
        Command::Wake(args) => {
            commands::wake::run(&app, &args, &cli.format, use_color)?;
        }
    }

    Ok(())
}
