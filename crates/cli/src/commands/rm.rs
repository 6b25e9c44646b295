//! delete command - Remove objects or a bucket
//!
//! `BUCKET` alone removes the bucket, one key removes one object, and two or
//! more keys go out as a single batched request.

use clap::Args;
use s3c_core::command::DeleteCommand;
use s3c_core::config::Defaults;
use s3c_core::Command;

use super::PresignArgs;

/// Remove objects or a bucket
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// BUCKET or BUCKET/KEY
    pub target: String,

    /// More keys in the same bucket
    pub keys: Vec<String>,

    #[command(flatten)]
    pub presign: PresignArgs,
}

impl DeleteArgs {
    pub fn into_command(self, defaults: &Defaults) -> Command {
        Command::Delete(DeleteCommand {
            presign: self.presign.resolve(defaults),
            target: self.target,
            keys: self.keys,
        })
    }
}
