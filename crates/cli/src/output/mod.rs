//! Output utilities
//!
//! Contract lines go to stdout through the façade console. Errors, warnings
//! and the multipart status line go to stderr.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::SpinnerStatus;

use s3c_core::{Console, HiddenStatus, StatusLine};

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Disable colored output
    pub no_color: bool,
    /// Disable the multipart status line
    pub no_progress: bool,
}

/// Console wired to the process streams
pub fn stdio_console(config: &OutputConfig) -> Console<'static> {
    let status: Box<dyn StatusLine> = if config.no_progress {
        Box::new(HiddenStatus)
    } else {
        Box::new(SpinnerStatus::new())
    };
    Console::new(
        Box::new(std::io::stdout().lock()),
        Box::new(std::io::stderr()),
        status,
    )
}
