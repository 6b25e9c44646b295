//! Multipart upload driver
//!
//! Polls a running [`ChunkedUpload`] on a fixed interval and redraws a single
//! status line until the transfer reaches a terminal state. The driver never
//! reports completion on its own; it only relays what the transfer says.

use std::time::Duration;

use crate::error::Result;
use crate::traits::{ChunkedUpload, TransferProgress};

/// Delay between two progress polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Rotating indicator shown in front of the status text
pub const SPINNER_FRAMES: [&str; 4] = ["[ - ]", "[ \\ ]", "[ | ]", "[ / ]"];

/// A terminal line that is overwritten in place
pub trait StatusLine {
    /// Replace the current line with `line`
    fn show(&mut self, line: &str);

    /// Remove the line so the next output starts clean
    fn clear(&mut self);
}

/// Status line that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct HiddenStatus;

impl StatusLine for HiddenStatus {
    fn show(&mut self, _line: &str) {}

    fn clear(&mut self) {}
}

/// Produces successive status lines with a rotating indicator
#[derive(Debug, Default)]
pub struct StatusAnimation {
    frame: usize,
}

impl StatusAnimation {
    /// Next frame for `progress`, e.g. `[ - ] InProgress: 40%`
    pub fn render(&mut self, progress: TransferProgress) -> String {
        let frame = SPINNER_FRAMES[self.frame % SPINNER_FRAMES.len()];
        self.frame = self.frame.wrapping_add(1);
        format!("{frame} {progress}")
    }
}

/// Block until `upload` finishes, redrawing `status` after every poll
///
/// Order per iteration is poll, render, sleep. Dropping the returned future
/// drops the upload handle, which releases the transfer.
pub async fn drive_upload(
    upload: Box<dyn ChunkedUpload>,
    status: &mut dyn StatusLine,
    interval: Duration,
) -> Result<()> {
    let mut animation = StatusAnimation::default();
    loop {
        let progress = upload.progress();
        if progress.state.is_terminal() {
            tracing::debug!(%progress, "transfer reached terminal state");
            break;
        }
        status.show(&animation.render(progress));
        tokio::time::sleep(interval).await;
    }
    status.clear();
    upload.finish().await
}
