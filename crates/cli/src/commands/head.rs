//! head command - Check existence
//!
//! Reports whether a bucket or objects exist, one line per target.

use clap::Args;
use s3c_core::command::HeadCommand;
use s3c_core::config::Defaults;
use s3c_core::Command;

use super::PresignArgs;

/// Check whether a bucket or objects exist
#[derive(Args, Debug)]
pub struct HeadArgs {
    /// BUCKET or BUCKET/KEY
    pub target: String,

    /// More keys in the same bucket
    pub keys: Vec<String>,

    #[command(flatten)]
    pub presign: PresignArgs,
}

impl HeadArgs {
    pub fn into_command(self, defaults: &Defaults) -> Command {
        Command::Head(HeadCommand {
            presign: self.presign.resolve(defaults),
            target: self.target,
            keys: self.keys,
        })
    }
}
