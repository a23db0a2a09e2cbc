//! Line input for the interactive ritual

use std::io::{self, IsTerminal};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::runtime::Runtime;
use tokio::sync::Notify;

/// What a single read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// One line, without its trailing newline
    Line(String),
    /// The operator asked to stop
    Interrupted,
    /// No more input
    Closed,
}

/// Source of operator input. Reads block until a line or an interrupt arrives.
pub trait InputSource {
    /// Whether a person is on the other end
    fn is_interactive(&self) -> bool;

    fn read_line(&mut self) -> io::Result<InputEvent>;
}

/// Stdin raced against Ctrl-C.
///
/// Ctrl-C is caught for as long as this value lives. An interrupt that lands
/// outside a read is held and ends the next read instead.
pub struct TerminalInput {
    runtime: Option<Runtime>,
    lines: Lines<BufReader<Stdin>>,
    interrupt: Arc<Notify>,
}

impl TerminalInput {
    pub fn new() -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let interrupt = Arc::new(Notify::new());

        let notify = Arc::clone(&interrupt);
        runtime.spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                notify.notify_one();
            }
        });
        // Let the listener register before any prompt is shown
        runtime.block_on(tokio::task::yield_now());

        let lines = runtime.block_on(async { BufReader::new(tokio::io::stdin()).lines() });

        Ok(Self {
            runtime: Some(runtime),
            lines,
            interrupt,
        })
    }
}

impl InputSource for TerminalInput {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn read_line(&mut self) -> io::Result<InputEvent> {
        let Self {
            runtime,
            lines,
            interrupt,
        } = self;
        let runtime = runtime
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "input runtime shut down"))?;

        runtime.block_on(async {
            tokio::select! {
                biased;
                _ = interrupt.notified() => Ok(InputEvent::Interrupted),
                line = lines.next_line() => line.map(|line| match line {
                    Some(line) => InputEvent::Line(line),
                    None => InputEvent::Closed,
                }),
            }
        })
    }
}

impl Drop for TerminalInput {
    fn drop(&mut self) {
        // The stdin reader parks a blocking thread; don't wait for it.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Pre-recorded input; reads past the end report `Closed`
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    events: std::collections::VecDeque<InputEvent>,
    interactive: bool,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: lines.into_iter().map(|l| InputEvent::Line(l.into())).collect(),
            interactive: true,
        }
    }

    pub fn from_events(events: Vec<InputEvent>) -> Self {
        Self {
            events: events.into(),
            interactive: true,
        }
    }

    /// Report the source as piped rather than a terminal
    pub fn piped(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn read_line(&mut self) -> io::Result<InputEvent> {
        Ok(self.events.pop_front().unwrap_or(InputEvent::Closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_replays_then_closes() {
        let mut input = ScriptedInput::new(["first", "second"]);
        assert!(input.is_interactive());
        assert_eq!(input.read_line().unwrap(), InputEvent::Line("first".into()));
        assert_eq!(input.read_line().unwrap(), InputEvent::Line("second".into()));
        assert_eq!(input.read_line().unwrap(), InputEvent::Closed);
        assert_eq!(input.remaining(), 0);
    }

    #[test]
    fn test_piped_input_is_not_interactive() {
        let input = ScriptedInput::new(Vec::<String>::new()).piped();
        assert!(!input.is_interactive());
    }
}
