//! mpu command - Multipart upload
//!
//! Uploads one large file in parts and shows a status line until the store
//! reports the upload complete.

use std::path::PathBuf;

use clap::Args;
use s3c_core::command::MultipartUploadCommand;
use s3c_core::config::Defaults;
use s3c_core::Command;

use super::parse_key_val;

/// Upload a large file in parts
#[derive(Args, Debug)]
pub struct MpuArgs {
    /// BUCKET or BUCKET/KEY (the key defaults to the file name)
    pub target: String,

    /// Local file to upload
    pub file: PathBuf,

    /// Minimum part size in MiB
    #[arg(long, value_name = "MIB")]
    pub part_size: Option<u64>,

    /// Content type (guessed from the file name otherwise)
    #[arg(long)]
    pub content_type: Option<String>,

    /// User metadata (KEY=VALUE)
    #[arg(short = 'm', long = "meta", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub metadata: Vec<(String, String)>,
}

impl MpuArgs {
    pub fn into_command(self, defaults: &Defaults) -> Command {
        Command::MultipartUpload(MultipartUploadCommand {
            part_size_mib: self.part_size.unwrap_or(defaults.part_size_mib),
            target: self.target,
            file: self.file,
            content_type: self.content_type,
            metadata: self.metadata.into_iter().collect(),
        })
    }
}
