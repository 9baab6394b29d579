//! Output styles using owo-colors stylesheet pattern.

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Info messages (blue)
    pub info: Style,
    /// Dimmed/secondary text
    pub dim: Style,
    /// Bold text
    pub bold: Style,
    /// Headers/section titles
    pub header: Style,
    /// Mirrored script stderr
    pub script_stderr: Style,
}

impl Styles {
    /// Stylesheet for a terminal, colored only when `use_colors` is set.
    #[must_use]
    pub fn for_terminal(use_colors: bool) -> Self {
        let mut styles = Self::default();
        if use_colors {
            styles.colorize();
        }
        styles
    }

    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.script_stderr = Style::new().truecolor(204, 120, 50);
    }
}
