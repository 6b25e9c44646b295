//! Command model
//!
//! A fully-resolved request handed to the façade by the CLI layer. Targets are
//! kept as raw `container[/item]` tokens; the router splits them.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::traits::KeyValues;

/// One request per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(ListCommand),
    Head(HeadCommand),
    Download(GetCommand),
    Cat(GetCommand),
    Delete(DeleteCommand),
    CreateBucket(CreateBucketCommand),
    Upload(UploadCommand),
    MultipartUpload(MultipartUploadCommand),
}

impl Command {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::List(_) => "list",
            Command::Head(_) => "head",
            Command::Download(_) => "download",
            Command::Cat(_) => "cat",
            Command::Delete(_) => "delete",
            Command::CreateBucket(_) => "create-bucket",
            Command::Upload(_) => "upload",
            Command::MultipartUpload(_) => "mpu",
        }
    }
}

/// Produce a signed URL instead of transferring bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presign {
    pub ttl_minutes: u64,
}

impl Presign {
    pub fn minutes(ttl_minutes: u64) -> Self {
        Self { ttl_minutes }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListCommand {
    /// `None` lists buckets; `container[/prefix]` lists objects
    pub target: Option<String>,
    /// Follow continuation tokens until the listing is exhausted
    pub all: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadCommand {
    pub target: String,
    /// Additional items in the same container
    pub keys: Vec<String>,
    pub presign: Option<Presign>,
}

/// Shared payload of download and cat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCommand {
    pub target: String,
    pub keys: Vec<String>,
    /// Store-specific query parameters added to every GET
    pub query: KeyValues,
    pub presign: Option<Presign>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCommand {
    pub target: String,
    pub keys: Vec<String>,
    pub presign: Option<Presign>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketCommand {
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCommand {
    /// `container[/item]`, or `container[/prefix]` with several files
    pub target: String,
    pub files: Vec<PathBuf>,
    /// Inline content used when no file is given
    pub data: Option<String>,
    /// Explicit content type; guessed per file when absent
    pub content_type: Option<String>,
    pub metadata: KeyValues,
    pub presign: Option<Presign>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartUploadCommand {
    pub target: String,
    pub file: PathBuf,
    pub content_type: Option<String>,
    pub metadata: KeyValues,
    /// Minimum part size in MiB
    pub part_size_mib: u64,
}

impl MultipartUploadCommand {
    /// Part size in bytes; sizes that do not fit in a `u64` are rejected
    pub fn part_size_bytes(&self) -> Result<u64> {
        self.part_size_mib.checked_mul(1 << 20).ok_or_else(|| {
            Error::Config(format!("part size of {} MiB is too large", self.part_size_mib))
        })
    }
}
