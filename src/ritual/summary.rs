//! Per-bloom outcomes and the session tally

use serde::{Deserialize, Serialize};

/// Terminal classification of one bloom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Exact or Close within three attempts
    Remembered,
    /// Three attempts without Exact or Close
    NeededHelp,
    /// No phrase to ask for, or the user declined to set one
    Skipped,
}

/// Outcome counts for a session. Only resolved blooms are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub remembered: u32,
    pub needed_help: u32,
    pub skipped: u32,
}

impl SessionSummary {
    pub fn record(&mut self, outcome: SessionOutcome) {
        match outcome {
            SessionOutcome::Remembered => self.remembered += 1,
            SessionOutcome::NeededHelp => self.needed_help += 1,
            SessionOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.remembered + self.needed_help + self.skipped
    }

    pub fn count(&self, outcome: SessionOutcome) -> u32 {
        match outcome {
            SessionOutcome::Remembered => self.remembered,
            SessionOutcome::NeededHelp => self.needed_help,
            SessionOutcome::Skipped => self.skipped,
        }
    }

    /// Plain-text report: one `x/total` line per counter, remembered with a meter
    pub fn render(&self, bar_width: usize) -> Vec<String> {
        let total = self.total();
        vec![
            format!(
                "remembered:   {}/{}  {}",
                self.remembered,
                total,
                meter_fraction(self.remembered, total, bar_width)
            ),
            format!("needed help:  {}/{}", self.needed_help, total),
            format!("skipped:      {}/{}", self.skipped, total),
        ]
    }
}

/// Meter of `width` cells, `filled` of them solid
pub fn meter(filled: usize, width: usize) -> String {
    let filled = filled.min(width);
    format!("{}{}", "\u{25CF}".repeat(filled), "\u{25CB}".repeat(width - filled))
}

/// Meter for `part / whole`, rounded down; empty when `whole` is zero
pub fn meter_fraction(part: u32, whole: u32, width: usize) -> String {
    let filled = if whole == 0 {
        0
    } else {
        (part as usize * width) / whole as usize
    };
    meter(filled, width)
}

/// Meter for a resonance value in [0, 1]
pub fn resonance_meter(resonance: f32, width: usize) -> String {
    let filled = (resonance.clamp(0.0, 1.0) * width as f32).round() as usize;
    meter(filled, width)
}
