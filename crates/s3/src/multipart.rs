//! Multipart upload support
//!
//! Uploads a local file as a multipart upload running on a background task.
//! Parts are read straight from the file and sent concurrently; progress is
//! the number of bytes acknowledged by the store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_smithy_types::byte_stream::Length;
use futures::{StreamExt, TryStreamExt, stream};
use humansize::{BINARY, format_size};
use tokio::task::JoinHandle;

use s3c_core::traits::transfer_error;
use s3c_core::{
    Address, ChunkedUpload, ChunkedUploadRequest, Error, PutOptions, Result, TransferProgress,
    TransferState,
};

use crate::client::map_sdk_error;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartConfig {
    /// Part size in bytes
    pub part_size: u64,

    /// Number of concurrent part uploads
    pub concurrency: usize,
}

impl MultipartConfig {
    pub fn new(part_size: u64, concurrency: usize) -> Self {
        Self {
            part_size: part_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE),
            concurrency: concurrency.max(1),
        }
    }

    /// Calculate appropriate part size for a file
    pub fn calculate_part_size(&self, file_size: u64) -> u64 {
        // If file fits in one part, use minimum
        if file_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        let parts = file_size.div_ceil(self.part_size);

        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            // Need larger parts to fit within 10,000 limit
            let required_size = file_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Calculate number of parts for a file; an empty file is still one part
pub fn calculate_parts(file_size: u64, part_size: u64) -> usize {
    (file_size.div_ceil(part_size) as usize).max(1)
}

/// Get byte range for a part
pub fn part_byte_range(part_number: i32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = ((part_number as u64 - 1) * part_size).min(total_size);
    let end = (start + part_size).min(total_size);
    (start, end)
}

/// State visible to both the handle and the background task
#[derive(Debug)]
struct Shared {
    total: u64,
    sent: AtomicU64,
    state: AtomicU8,
    upload_id: Mutex<Option<String>>,
}

impl Shared {
    fn new(total: u64) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            state: AtomicU8::new(encode(TransferState::Waiting)),
            upload_id: Mutex::new(None),
        }
    }

    fn state(&self) -> TransferState {
        decode(self.state.load(Ordering::Acquire))
    }

    /// Terminal states are final
    fn set_state(&self, state: TransferState) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (!decode(current).is_terminal()).then_some(encode(state))
            });
    }

    fn progress(&self) -> TransferProgress {
        let state = self.state();
        let percent = match state {
            TransferState::Completed => 100,
            _ if self.total == 0 => 0,
            _ => {
                let sent = self.sent.load(Ordering::Acquire).min(self.total);
                // Completion is only reported by the store
                (sent.saturating_mul(100) / self.total).min(99) as u8
            }
        };
        TransferProgress::new(state, percent)
    }
}

fn encode(state: TransferState) -> u8 {
    match state {
        TransferState::Waiting => 0,
        TransferState::InProgress => 1,
        TransferState::Completed => 2,
        TransferState::Failed => 3,
        TransferState::Canceled => 4,
    }
}

fn decode(value: u8) -> TransferState {
    match value {
        0 => TransferState::Waiting,
        1 => TransferState::InProgress,
        2 => TransferState::Completed,
        3 => TransferState::Failed,
        _ => TransferState::Canceled,
    }
}

/// Everything the background task needs to reach the store
#[derive(Debug, Clone)]
struct Target {
    client: aws_sdk_s3::Client,
    address: Address,
}

impl Target {
    async fn abort(&self, upload_id: &str) {
        let result = self
            .client
            .abort_multipart_upload()
            .bucket(&self.address.container)
            .key(&self.address.item)
            .upload_id(upload_id)
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(
                address = %self.address,
                upload_id,
                error = %map_sdk_error(e),
                "failed to abort multipart upload"
            );
        }
    }
}

/// A multipart upload running on a tokio task
pub struct S3ChunkedUpload {
    target: Target,
    shared: Arc<Shared>,
    task: Option<JoinHandle<Result<()>>>,
}

impl S3ChunkedUpload {
    /// Schedule the upload; returns once the source file has been sized
    pub(crate) async fn start(
        client: aws_sdk_s3::Client,
        request: ChunkedUploadRequest,
        concurrency: usize,
    ) -> Result<Self> {
        let total = tokio::fs::metadata(&request.file).await?.len();
        let config = MultipartConfig::new(request.part_size, concurrency);
        let part_size = config.calculate_part_size(total);

        tracing::info!(
            address = %request.address,
            size = %format_size(total, BINARY),
            part_size = %format_size(part_size, BINARY),
            parts = calculate_parts(total, part_size),
            concurrency = config.concurrency,
            "scheduling multipart upload"
        );

        let target = Target {
            client,
            address: request.address.clone(),
        };
        let shared = Arc::new(Shared::new(total));
        let job = Job {
            target: target.clone(),
            shared: shared.clone(),
            file: request.file,
            options: request.options,
            part_size,
            concurrency: config.concurrency,
        };
        let task = tokio::spawn(job.run());

        Ok(Self {
            target,
            shared,
            task: Some(task),
        })
    }

    /// Stop the task and abort the upload on the store in the background
    fn release(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        self.shared.set_state(TransferState::Canceled);

        let upload_id = self.shared.upload_id.lock().ok().and_then(|id| id.clone());
        if let (Some(upload_id), Ok(runtime)) =
            (upload_id, tokio::runtime::Handle::try_current())
        {
            let target = self.target.clone();
            runtime.spawn(async move { target.abort(&upload_id).await });
        }
    }
}

#[async_trait]
impl ChunkedUpload for S3ChunkedUpload {
    fn progress(&self) -> TransferProgress {
        self.shared.progress()
    }

    fn cancel(&mut self) {
        tracing::info!(address = %self.target.address, "canceling multipart upload");
        self.release();
    }

    async fn finish(mut self: Box<Self>) -> Result<()> {
        let Some(task) = self.task.take() else {
            return Err(transfer_error(self.shared.progress(), None));
        };
        match task.await {
            Ok(result) => result,
            Err(e) => {
                self.shared.set_state(TransferState::Canceled);
                Err(transfer_error(self.shared.progress(), Some(e.to_string())))
            }
        }
    }
}

impl Drop for S3ChunkedUpload {
    fn drop(&mut self) {
        self.release();
    }
}

/// The background half of an upload
struct Job {
    target: Target,
    shared: Arc<Shared>,
    file: PathBuf,
    options: PutOptions,
    part_size: u64,
    concurrency: usize,
}

impl Job {
    async fn run(self) -> Result<()> {
        let result = self.transfer().await;
        match &result {
            Ok(()) => self.shared.set_state(TransferState::Completed),
            Err(e) => {
                tracing::error!(
                    address = %self.target.address,
                    error = %e,
                    "multipart upload failed"
                );
                self.shared.set_state(TransferState::Failed);
                let upload_id = self.shared.upload_id.lock().ok().and_then(|id| id.clone());
                if let Some(upload_id) = upload_id {
                    self.target.abort(&upload_id).await;
                }
            }
        }
        result
    }

    async fn transfer(&self) -> Result<()> {
        let address = &self.target.address;
        let metadata: HashMap<String, String> =
            self.options.metadata.clone().into_iter().collect();
        let created = self
            .target
            .client
            .create_multipart_upload()
            .bucket(&address.container)
            .key(&address.item)
            .content_type(&self.options.content_type)
            .set_metadata((!metadata.is_empty()).then_some(metadata))
            .send()
            .await
            .map_err(map_sdk_error)?;
        let upload_id = created
            .upload_id()
            .ok_or_else(|| Error::General("store returned no upload id".into()))?
            .to_string();
        if let Ok(mut slot) = self.shared.upload_id.lock() {
            *slot = Some(upload_id.clone());
        }
        self.shared.set_state(TransferState::InProgress);
        tracing::debug!(%address, %upload_id, "multipart upload created");

        let total_parts = calculate_parts(self.shared.total, self.part_size);
        let mut parts: Vec<CompletedPart> = stream::iter(1..=total_parts as i32)
            .map(|part_number| self.upload_part(&upload_id, part_number))
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;
        parts.sort_by_key(|part| part.part_number());

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(parts))
            .build();
        self.target
            .client
            .complete_multipart_upload()
            .bucket(&address.container)
            .key(&address.item)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(map_sdk_error)?;

        tracing::info!(%address, %upload_id, parts = total_parts, "multipart upload completed");
        Ok(())
    }

    async fn upload_part(&self, upload_id: &str, part_number: i32) -> Result<CompletedPart> {
        let (start, end) = part_byte_range(part_number, self.part_size, self.shared.total);
        let body = ByteStream::read_from()
            .path(&self.file)
            .offset(start)
            .length(Length::Exact(end - start))
            .build()
            .await
            .map_err(|e| Error::General(format!("failed to read part {part_number}: {e}")))?;

        let response = self
            .target
            .client
            .upload_part()
            .bucket(&self.target.address.container)
            .key(&self.target.address.item)
            .upload_id(upload_id)
            .part_number(part_number)
            .body(body)
            .send()
            .await
            .map_err(map_sdk_error)?;

        self.shared.sent.fetch_add(end - start, Ordering::AcqRel);
        tracing::debug!(part_number, bytes = end - start, "part uploaded");

        Ok(CompletedPart::builder()
            .part_number(part_number)
            .set_e_tag(response.e_tag().map(str::to_string))
            .build())
    }
}
