//! upload command - Upload files or inline content
//!
//! With no files, `--data` becomes the object body. With one file, the key
//! defaults to the file name. With several files, the key part of the target
//! is used as a prefix for each file name.

use std::path::PathBuf;

use clap::Args;
use s3c_core::command::UploadCommand;
use s3c_core::config::Defaults;
use s3c_core::Command;

use super::{PresignArgs, parse_key_val};

/// Upload objects
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// BUCKET/KEY, or BUCKET[/PREFIX] with several files
    pub target: String,

    /// Local files to upload
    pub files: Vec<PathBuf>,

    /// Inline content used when no file is given
    #[arg(long, conflicts_with = "files")]
    pub data: Option<String>,

    /// Content type for every uploaded object (guessed from the file name otherwise)
    #[arg(long)]
    pub content_type: Option<String>,

    /// User metadata attached to every object (KEY=VALUE)
    #[arg(short = 'm', long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub metadata: Vec<(String, String)>,

    #[command(flatten)]
    pub presign: PresignArgs,
}

impl UploadArgs {
    pub fn into_command(self, defaults: &Defaults) -> Command {
        Command::Upload(UploadCommand {
            presign: self.presign.resolve(defaults),
            target: self.target,
            files: self.files,
            data: self.data,
            content_type: self.content_type,
            metadata: self.metadata.into_iter().collect(),
        })
    }
}
