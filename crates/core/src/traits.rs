//! ObjectStore trait definition
//!
//! This trait defines the interface for S3-compatible storage operations.
//! It allows the façade to be decoupled from the specific S3 SDK implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::io::AsyncRead;

use crate::address::Address;
use crate::error::{Error, Result};

/// Key/value pairs: user metadata on uploads, custom query parameters on reads
pub type KeyValues = BTreeMap<String, String>;

/// Content type used when neither the caller nor the file extension provides one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Streaming object body returned by [`ObjectStore::get_object`]
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Result of a list operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    /// Object keys, in the order the store returned them
    pub keys: Vec<String>,

    /// Whether the result is truncated (more items available)
    pub truncated: bool,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// Options for list operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Prefix to filter by
    pub prefix: Option<String>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// Payload of a single-request upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectBody {
    /// Inline content built from a string
    Bytes(Vec<u8>),
    /// Local file streamed as the object body
    File(PathBuf),
}

/// Attributes attached to every uploaded object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: String,
    pub metadata: KeyValues,
}

impl PutOptions {
    /// Build upload options, dropping metadata entries with an empty key or value
    pub fn new(content_type: impl Into<String>, metadata: &KeyValues) -> Self {
        Self {
            content_type: content_type.into(),
            metadata: non_empty_pairs(metadata),
        }
    }
}

/// Pick the content type for an upload
///
/// An explicit type always wins. Otherwise the type is guessed from the file
/// extension, falling back to `application/octet-stream`.
pub fn resolve_content_type(explicit: Option<&str>, file: Option<&Path>) -> String {
    if let Some(content_type) = explicit {
        return content_type.to_string();
    }
    file.and_then(|path| mime_guess::from_path(path).first())
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

/// Copy of `pairs` without entries whose key or value is empty
pub fn non_empty_pairs(pairs: &KeyValues) -> KeyValues {
    pairs
        .iter()
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// HTTP method a presigned URL is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Get,
    Put,
    Delete,
    Head,
}

impl PresignMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresignMethod::Get => "GET",
            PresignMethod::Put => "PUT",
            PresignMethod::Delete => "DELETE",
            PresignMethod::Head => "HEAD",
        }
    }
}

impl std::fmt::Display for PresignMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a chunked upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Waiting,
    InProgress,
    Completed,
    Failed,
    Canceled,
}

impl TransferState {
    /// Whether the transfer can no longer make progress
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Completed | TransferState::Failed | TransferState::Canceled
        )
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransferState::Waiting => "Waiting",
            TransferState::InProgress => "InProgress",
            TransferState::Completed => "Completed",
            TransferState::Failed => "Failed",
            TransferState::Canceled => "Canceled",
        };
        f.write_str(name)
    }
}

/// Snapshot of a chunked upload, polled from the transfer engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub state: TransferState,
    /// 0..=100
    pub percent_complete: u8,
}

impl TransferProgress {
    pub fn new(state: TransferState, percent_complete: u8) -> Self {
        Self {
            state,
            percent_complete: percent_complete.min(100),
        }
    }
}

impl std::fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}%", self.state, self.percent_complete)
    }
}

/// Everything the store needs to start a chunked upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedUploadRequest {
    pub address: Address,
    pub file: PathBuf,
    pub options: PutOptions,
    /// Minimum part size in bytes; the store picks the exact boundaries
    pub part_size: u64,
}

/// Handle to an upload running in the background
///
/// Part transfers happen concurrently inside the implementation. Callers only
/// observe the progress snapshot and the final outcome.
#[async_trait]
pub trait ChunkedUpload: Send {
    /// Current state and percentage, never ahead of the real transfer
    fn progress(&self) -> TransferProgress;

    /// Whether the transfer has reached a terminal state
    fn is_done(&self) -> bool {
        self.progress().state.is_terminal()
    }

    /// Stop the transfer and release its resources
    fn cancel(&mut self);

    /// Wait for the transfer to end, surfacing failure or cancellation as an error
    async fn finish(self: Box<Self>) -> Result<()>;
}

/// Trait for S3-compatible storage operations
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List bucket names in the order the store returns them
    async fn list_buckets(&self) -> Result<Vec<String>>;

    /// List object keys in a bucket, one page per call
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Check if an object exists
    async fn object_exists(&self, address: &Address) -> Result<bool>;

    /// Open an object for streaming, with extra query parameters on the request
    async fn get_object(&self, address: &Address, query: &KeyValues) -> Result<ObjectReader>;

    /// Upload an object in a single request
    async fn put_object(
        &self,
        address: &Address,
        body: ObjectBody,
        options: &PutOptions,
    ) -> Result<()>;

    /// Delete one object
    async fn delete_object(&self, address: &Address) -> Result<()>;

    /// Delete several objects in one quiet request
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()>;

    /// Create a bucket
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete a bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Sign a URL granting `method` on `address` until `expires_at`
    async fn presign(
        &self,
        method: PresignMethod,
        address: &Address,
        expires_at: Timestamp,
    ) -> Result<String>;

    /// Start an upload split into parts; returns as soon as the transfer is scheduled
    async fn start_chunked_upload(
        &self,
        request: ChunkedUploadRequest,
    ) -> Result<Box<dyn ChunkedUpload>>;
}

/// Error for a transfer that ended without completing
pub fn transfer_error(progress: TransferProgress, detail: Option<String>) -> Error {
    let detail = detail.unwrap_or_else(|| "no further detail".to_string());
    match progress.state {
        TransferState::Canceled => Error::General(format!("upload canceled: {detail}")),
        _ => Error::General(format!("upload {}: {detail}", progress.state)),
    }
}
