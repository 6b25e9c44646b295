//! Status line for multipart uploads
//!
//! Draws the façade's animated status text on stderr with indicatif, so the
//! line is overwritten in place and hidden when stderr is not a terminal.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use s3c_core::StatusLine;

/// Single overwritten line on stderr
#[derive(Debug)]
pub struct SpinnerStatus {
    bar: ProgressBar,
}

impl SpinnerStatus {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        // The frame is part of the message
        let style = ProgressStyle::with_template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        Self { bar }
    }

    /// Check if the line is drawn at all
    pub fn is_visible(&self) -> bool {
        !self.bar.is_hidden()
    }
}

impl Default for SpinnerStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLine for SpinnerStatus {
    fn show(&mut self, line: &str) {
        self.bar.set_message(line.to_string());
    }

    fn clear(&mut self) {
        self.bar.finish_and_clear();
    }
}
