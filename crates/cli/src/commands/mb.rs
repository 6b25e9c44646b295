//! create-bucket command - Make bucket

use clap::Args;
use s3c_core::command::CreateBucketCommand;
use s3c_core::Command;

/// Create a bucket
#[derive(Args, Debug)]
pub struct CreateBucketArgs {
    /// Bucket name
    pub bucket: String,
}

impl CreateBucketArgs {
    pub fn into_command(self) -> Command {
        Command::CreateBucket(CreateBucketCommand {
            bucket: self.bucket,
        })
    }
}
