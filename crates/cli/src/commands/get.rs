//! download and cat commands
//!
//! `download` writes each object to a file named after the key's base name
//! in the current directory. `cat` writes the bytes to stdout.

use clap::Args;
use s3c_core::command::GetCommand;
use s3c_core::config::Defaults;

use super::{PresignArgs, parse_key_val};

/// Fetch one or more objects
#[derive(Args, Debug)]
pub struct GetArgs {
    /// BUCKET/KEY
    pub target: String,

    /// More keys in the same bucket
    pub keys: Vec<String>,

    /// Extra query parameter sent with every request (KEY=VALUE)
    #[arg(short = 'q', long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub query: Vec<(String, String)>,

    #[command(flatten)]
    pub presign: PresignArgs,
}

impl GetArgs {
    pub fn into_get(self, defaults: &Defaults) -> GetCommand {
        GetCommand {
            presign: self.presign.resolve(defaults),
            target: self.target,
            keys: self.keys,
            query: self.query.into_iter().collect(),
        }
    }
}
