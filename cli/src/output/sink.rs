//! Live console mirroring of script transcripts.

use owo_colors::OwoColorize as _;

use crate::application::ports::OutputSink;
use crate::domain::execution::{Stream, TranscriptLine};
use crate::output::Styles;

/// Mirrors script stdout to stdout and script stderr to stderr, indented
/// under the action's status line.
pub struct ConsoleSink {
    enabled: bool,
    styles: Styles,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(enabled: bool, styles: Styles) -> Self {
        Self { enabled, styles }
    }

    /// A sink that prints nothing (quiet and JSON modes).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false, Styles::default())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl OutputSink for ConsoleSink {
    fn line(&self, line: &TranscriptLine) {
        if !self.enabled {
            return;
        }
        match line.stream {
            Stream::Stdout => println!("    {}", line.text.style(self.styles.dim)),
            Stream::Stderr => eprintln!("    {}", line.text.style(self.styles.script_stderr)),
        }
    }
}
