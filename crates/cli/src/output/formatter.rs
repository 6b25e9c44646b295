//! Formatter for messages on stderr
//!
//! Every error is a single human-readable line. Colors are used only when
//! stderr supports them and `--no-color` is not set.

use console::style;

use super::OutputConfig;

/// Formatter for CLI diagnostics
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && console::colors_enabled_stderr()
    }

    /// Output an error message
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.error_line(message));
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.warning_line(message));
    }

    fn error_line(&self, message: &str) -> String {
        let marker = if self.colors_enabled() {
            style("✗").red().to_string()
        } else {
            "✗".to_string()
        };
        format!("{marker} {}", single_line(message))
    }

    fn warning_line(&self, message: &str) -> String {
        let marker = if self.colors_enabled() {
            style("⚠").yellow().to_string()
        } else {
            "⚠".to_string()
        };
        format!("{marker} {}", single_line(message))
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

/// Collapse a multi-line message so every error stays on one line
fn single_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}
