//! list command - List buckets and objects
//!
//! Without a target, lists buckets. With `BUCKET[/PREFIX]`, lists the object
//! keys under the prefix.

use clap::Args;
use s3c_core::command::ListCommand;
use s3c_core::Command;

/// List buckets or objects
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Bucket, optionally followed by /PREFIX
    pub target: Option<String>,

    /// Follow continuation tokens until every key has been listed
    #[arg(long)]
    pub all: bool,
}

impl ListArgs {
    pub fn into_command(self) -> Command {
        Command::List(ListCommand {
            target: self.target,
            all: self.all,
        })
    }
}
