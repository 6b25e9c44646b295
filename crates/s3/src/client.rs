//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3c-core.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use jiff::Timestamp;

use s3c_core::traits::{KeyValues, ObjectReader, non_empty_pairs};
use s3c_core::{
    Address, ChunkedUpload, ChunkedUploadRequest, Error, ListOptions, ListResult, ObjectBody,
    ObjectStore, PresignMethod, Profile, PutOptions, Result,
};

use crate::multipart::S3ChunkedUpload;

/// Region that must not be sent as a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    profile: Profile,
}

impl S3Client {
    /// Create a new S3 client from a profile
    pub async fn new(profile: Profile) -> Result<Self> {
        profile.validate()?;

        let timeout = profile.timeout_config();
        let retry = profile.retry_config();

        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(profile.region.clone()))
            .endpoint_url(&profile.endpoint)
            .timeout_config(
                aws_config::timeout::TimeoutConfig::builder()
                    .connect_timeout(Duration::from_millis(timeout.connect_ms))
                    .read_timeout(Duration::from_millis(timeout.read_ms))
                    .build(),
            )
            .retry_config(
                aws_config::retry::RetryConfig::standard()
                    .with_max_attempts(retry.max_attempts.max(1))
                    .with_initial_backoff(Duration::from_millis(retry.initial_backoff_ms))
                    .with_max_backoff(Duration::from_millis(retry.max_backoff_ms)),
            );

        let loader = if profile.is_anonymous() {
            tracing::debug!(profile = %profile.name, "using anonymous requests");
            loader.no_credentials()
        } else {
            let credentials = aws_credential_types::Credentials::new(
                &profile.access_key,
                &profile.secret_key,
                None, // session token
                None, // expiry
                "s3cli-static-credentials",
            );
            loader.credentials_provider(credentials)
        };

        let config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(profile.path_style)
            .build();

        tracing::debug!(
            profile = %profile.name,
            endpoint = %profile.endpoint,
            region = %profile.region,
            path_style = profile.path_style,
            "S3 client ready"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            profile,
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Profile this client was built from
    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

/// Sort an SDK failure into the store-reported or transport category
pub(crate) fn map_sdk_error<E>(err: SdkError<E, HttpResponse>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match &err {
        SdkError::ServiceError(service) => {
            let status = service.raw().status().as_u16();
            let inner = service.err();
            let message = inner
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
            classify(status, inner.code().unwrap_or_default(), message)
        }
        _ => Error::Network(DisplayErrorContext(&err).to_string()),
    }
}

fn classify(status: u16, code: &str, message: String) -> Error {
    match (status, code) {
        (404, _) | (_, "NoSuchKey" | "NoSuchBucket" | "NotFound") => Error::NotFound(message),
        (403, _) | (_, "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch") => {
            Error::Auth(message)
        }
        _ => Error::Service(message),
    }
}

/// Encode extra GET parameters, skipping empty keys and values
fn query_string(query: &KeyValues) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(non_empty_pairs(query))
        .finish()
}

/// Presign lifetime, refusing expiries that are already in the past
fn expires_in(expires_at: Timestamp) -> Result<Duration> {
    let remaining = expires_at.duration_since(Timestamp::now());
    Duration::try_from(remaining)
        .map_err(|_| Error::General(format!("presign expiry {expires_at} is in the past")))
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(bucket);

        if let Some(prefix) = &options.prefix {
            request = request.prefix(prefix);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request.send().await.map_err(map_sdk_error)?;

        Ok(ListResult {
            keys: response
                .contents()
                .iter()
                .filter_map(|object| object.key().map(str::to_string))
                .collect(),
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match map_sdk_error(e) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn object_exists(&self, address: &Address) -> Result<bool> {
        let result = self
            .inner
            .head_object()
            .bucket(&address.container)
            .key(&address.item)
            .send()
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) => match map_sdk_error(e) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn get_object(&self, address: &Address, query: &KeyValues) -> Result<ObjectReader> {
        let request = self
            .inner
            .get_object()
            .bucket(&address.container)
            .key(&address.item);

        let extra = query_string(query);
        let result = if extra.is_empty() {
            request.send().await
        } else {
            tracing::debug!(%address, query = %extra, "adding query parameters");
            request
                .customize()
                .mutate_request(move |req| {
                    let uri = req.uri().to_string();
                    let separator = if uri.contains('?') { '&' } else { '?' };
                    if let Err(e) = req.set_uri(format!("{uri}{separator}{extra}")) {
                        tracing::warn!(error = %e, "could not add query parameters");
                    }
                })
                .send()
                .await
        };
        let response = result.map_err(map_sdk_error)?;

        Ok(Box::new(Box::pin(response.body.into_async_read())))
    }

    async fn put_object(
        &self,
        address: &Address,
        body: ObjectBody,
        options: &PutOptions,
    ) -> Result<()> {
        let body = match body {
            ObjectBody::Bytes(data) => ByteStream::from(data),
            ObjectBody::File(path) => ByteStream::from_path(&path)
                .await
                .map_err(|e| Error::Io(std::io::Error::other(e)))?,
        };

        let mut request = self
            .inner
            .put_object()
            .bucket(&address.container)
            .key(&address.item)
            .content_type(&options.content_type)
            .body(body);

        for (key, value) in &options.metadata {
            request = request.metadata(key, value);
        }

        request.send().await.map_err(map_sdk_error)?;
        tracing::debug!(%address, content_type = %options.content_type, "object uploaded");
        Ok(())
    }

    async fn delete_object(&self, address: &Address) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&address.container)
            .key(&address.item)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::General(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| Error::General(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(map_sdk_error)?;

        // Quiet mode only reports failures
        let errors = response.errors();
        if let Some(first) = errors.first() {
            let failed: Vec<&str> = errors.iter().filter_map(|e| e.key()).collect();
            tracing::warn!(bucket, ?failed, "batched delete reported failures");
            return Err(Error::Service(format!(
                "failed to delete {} of {} objects: {}",
                errors.len(),
                keys.len(),
                first.message().unwrap_or("no message")
            )));
        }

        Ok(())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.inner.create_bucket().bucket(bucket);

        let region = self.profile.region.as_str();
        if !region.is_empty() && region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn presign(
        &self,
        method: PresignMethod,
        address: &Address,
        expires_at: Timestamp,
    ) -> Result<String> {
        let config = PresigningConfig::expires_in(expires_in(expires_at)?)
            .map_err(|e| Error::General(format!("invalid presign expiry: {e}")))?;

        let bucket = &address.container;
        let key = &address.item;
        let request = match method {
            PresignMethod::Get => self
                .inner
                .get_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(map_sdk_error)?,
            PresignMethod::Put => self
                .inner
                .put_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(map_sdk_error)?,
            PresignMethod::Delete => self
                .inner
                .delete_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(map_sdk_error)?,
            PresignMethod::Head => self
                .inner
                .head_object()
                .bucket(bucket)
                .key(key)
                .presigned(config)
                .await
                .map_err(map_sdk_error)?,
        };

        Ok(request.uri().to_string())
    }

    async fn start_chunked_upload(
        &self,
        request: ChunkedUploadRequest,
    ) -> Result<Box<dyn ChunkedUpload>> {
        let upload = S3ChunkedUpload::start(
            self.inner.clone(),
            request,
            self.profile.multipart_concurrency,
        )
        .await?;
        Ok(Box::new(upload))
    }
}
