use std::io::Write;

use bloomwake_lib::blooms::{Bloom, StoreError};
use bloomwake_lib::ritual::summary::resonance_meter;
use bloomwake_lib::ritual::{MatchVerdict, RitualObserver, SessionOutcome, SessionReport, MAX_ATTEMPTS};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const ITALIC: &str = "\x1b[3m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in a color when colors are on
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// One-line bloom summary: title, resonance meter, wake order, phrase count
pub fn bloom_line(bloom: &Bloom, bar_width: usize, use_color: bool) -> String {
    let order = bloom
        .wake_order
        .map(|o| format!(" #{}", o))
        .unwrap_or_default();
    let phrases = match bloom.wake_phrases.len() {
        0 => "no phrase".to_string(),
        1 => "1 phrase".to_string(),
        n => format!("{} phrases", n),
    };

    format!(
        "{}{}  {}  {}",
        paint(&bloom.title, Color::BOLD, use_color),
        paint(&order, Color::CYAN, use_color),
        paint(&resonance_meter(bloom.resonance, bar_width), Color::YELLOW, use_color),
        paint(&phrases, Color::GRAY, use_color),
    )
}

/// Indented body text
pub fn content_block(bloom: &Bloom) -> String {
    bloom
        .content()
        .lines()
        .map(|l| format!("  {}", l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draws the interactive ritual on stdout
pub struct TerminalPresenter {
    use_color: bool,
    bar_width: usize,
    show_summary: bool,
}

impl TerminalPresenter {
    pub fn new(use_color: bool, bar_width: usize) -> Self {
        Self {
            use_color,
            bar_width,
            show_summary: true,
        }
    }

    /// Leave the closing summary to the caller
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    fn prompt(&self, label: &str) {
        print!("{} ", paint(label, Color::CYAN, self.use_color));
        if let Err(e) = std::io::stdout().flush() {
            log::warn!("Failed to flush prompt: {}", e);
        }
    }
}

impl RitualObserver for TerminalPresenter {
    fn session_started(&mut self, total: usize) {
        if total == 0 {
            println!("Nothing to wake.");
        } else {
            println!(
                "{}",
                paint(&format!("Waking {} blooms. Ctrl-C to stop.", total), Color::DIM, self.use_color)
            );
        }
    }

    fn bloom_presented(&mut self, position: usize, total: usize, bloom: &Bloom) {
        println!();
        println!(
            "{} {}",
            paint(&format!("[{}/{}]", position, total), Color::GRAY, self.use_color),
            paint(&bloom.title, Color::BOLD, self.use_color)
        );
        println!(
            "  resonance {}",
            paint(&resonance_meter(bloom.resonance, self.bar_width), Color::YELLOW, self.use_color)
        );
    }

    fn phrase_missing(&mut self, _bloom: &Bloom, prompting: bool) {
        if prompting {
            println!("  No wake phrase yet. Enter one, or leave blank to skip.");
            self.prompt("  new phrase>");
        } else {
            println!("{}", paint("  No wake phrase, skipping.", Color::DIM, self.use_color));
        }
    }

    fn phrase_saved(&mut self, _bloom: &Bloom) {
        println!("{}", paint("  Saved. Now recall it.", Color::GREEN, self.use_color));
    }

    fn phrase_save_failed(&mut self, _bloom: &Bloom, error: &StoreError) {
        println!(
            "{}",
            paint(
                &format!("  Could not save the phrase ({}); using it for this session only.", error),
                Color::YELLOW,
                self.use_color
            )
        );
    }

    fn awaiting_input(&mut self, attempt: u8) {
        self.prompt(&format!("  [{}/{}] wake phrase>", attempt, MAX_ATTEMPTS));
    }

    fn verdict(&mut self, verdict: MatchVerdict, _attempt: u8) {
        let (text, color) = match verdict {
            MatchVerdict::Exact => ("  \u{2713} exact", Color::GREEN),
            MatchVerdict::Close => ("  \u{2713} close enough", Color::GREEN),
            MatchVerdict::Partial => ("  ~ partly there", Color::YELLOW),
            MatchVerdict::Wrong => ("  \u{2717} not it", Color::RED),
        };
        println!("{}", paint(text, color, self.use_color));
    }

    fn hint(&mut self, hint: &str) {
        println!("{}", paint(&format!("  hint: {}", hint), Color::CYAN, self.use_color));
    }

    fn phrase_revealed(&mut self, phrase: &str) {
        println!(
            "{}",
            paint(&format!("  The phrase was \"{}\"", phrase), Color::YELLOW, self.use_color)
        );
    }

    fn bloom_resolved(&mut self, bloom: &Bloom, outcome: SessionOutcome) {
        let body = content_block(bloom);
        match outcome {
            SessionOutcome::Skipped => println!("{}", paint(&body, Color::DIM, self.use_color)),
            _ => println!("{}", body),
        }
    }

    fn awaiting_continue(&mut self, _position: usize, _total: usize) {
        println!();
        self.prompt("  (Enter to continue)");
    }

    fn session_finished(&mut self, report: &SessionReport) {
        if !self.show_summary {
            return;
        }
        println!();
        if report.cancelled {
            println!("{}", paint("Ritual interrupted.", Color::YELLOW, self.use_color));
        }
        for line in report.summary.render(self.bar_width) {
            println!("{}", line);
        }
    }
}
