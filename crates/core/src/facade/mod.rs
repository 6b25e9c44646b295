//! Object Operation Façade
//!
//! Routes one resolved [`Command`] to the store primitives that implement it
//! and writes the result lines. Every `container[/item]` argument goes through
//! [`split`]; presign mode is checked before any transfer or deletion.
//!
//! Stdout lines are part of the observable contract:
//!
//! - `- NAME` per bucket, `* KEY` per object
//! - `TS head TARGET BOOL`, `TS download FILE`, `TS delete TARGET`,
//!   `TS create BUCKET`, `TS upload BUCKET/KEY`
//! - a bare URL in presign mode
//!
//! where `TS` is the UTC time the line was written.

mod batch;
mod multipart;
mod presign;
mod upload;

pub use batch::{BatchDeleteSet, DeleteTarget, plan_delete};
pub use multipart::{
    HiddenStatus, POLL_INTERVAL, SPINNER_FRAMES, StatusAnimation, StatusLine, drive_upload,
};
pub use presign::{PresignGate, PresignedRequest};
pub use upload::{UploadTarget, plan_upload};

use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use jiff::Timestamp;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::address::{Address, base_name, split};
use crate::command::{
    Command, CreateBucketCommand, DeleteCommand, GetCommand, HeadCommand, ListCommand,
    MultipartUploadCommand, UploadCommand,
};
use crate::error::{Error, Result};
use crate::traits::{
    ChunkedUploadRequest, ListOptions, ObjectBody, ObjectStore, PresignMethod, PutOptions,
    non_empty_pairs, resolve_content_type,
};

/// Where the façade writes
pub struct Console<'a> {
    out: Box<dyn Write + 'a>,
    err: Box<dyn Write + 'a>,
    status: Box<dyn StatusLine + 'a>,
}

impl<'a> Console<'a> {
    pub fn new(
        out: Box<dyn Write + 'a>,
        err: Box<dyn Write + 'a>,
        status: Box<dyn StatusLine + 'a>,
    ) -> Self {
        Self { out, err, status }
    }

    fn line(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn stamped(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.out, "{} {line}", Timestamp::now())?;
        Ok(())
    }

    fn warn(&mut self, line: impl Display) {
        // stderr is best effort; the failure is already in the log
        let _ = writeln!(self.err, "{line}");
    }
}

/// Tunables that are not part of a command
#[derive(Debug, Clone)]
pub struct FacadeOptions {
    /// Delay between multipart progress polls
    pub poll_interval: Duration,
    /// Directory that downloads are written to
    pub download_dir: PathBuf,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            download_dir: PathBuf::from("."),
        }
    }
}

/// Dispatches commands against one store handle
pub struct Facade<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    console: Console<'a>,
    options: FacadeOptions,
}

impl<'a, S: ObjectStore + ?Sized> Facade<'a, S> {
    pub fn new(store: &'a S, console: Console<'a>) -> Self {
        Self {
            store,
            console,
            options: FacadeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: FacadeOptions) -> Self {
        self.options = options;
        self
    }

    /// Run one command to completion
    pub async fn dispatch(&mut self, command: Command) -> Result<()> {
        tracing::debug!(command = command.name(), "dispatching");
        let result = match command {
            Command::List(cmd) => self.list(cmd).await,
            Command::Head(cmd) => self.head(cmd).await,
            Command::Download(cmd) => self.download(cmd).await,
            Command::Cat(cmd) => self.cat(cmd).await,
            Command::Delete(cmd) => self.delete(cmd).await,
            Command::CreateBucket(cmd) => self.create_bucket(cmd).await,
            Command::Upload(cmd) => self.upload(cmd).await,
            Command::MultipartUpload(cmd) => self.multipart_upload(cmd).await,
        };
        self.console.out.flush()?;
        result
    }

    async fn list(&mut self, cmd: ListCommand) -> Result<()> {
        let Some(target) = cmd.target else {
            for name in self.store.list_buckets().await? {
                self.console.line(format_args!("- {name}"))?;
            }
            return Ok(());
        };

        let address = split(&target);
        address.require_container()?;
        let mut options = ListOptions {
            prefix: (!address.item.is_empty()).then(|| address.item.clone()),
            ..Default::default()
        };

        loop {
            let page = self
                .store
                .list_objects(&address.container, options.clone())
                .await?;
            for key in &page.keys {
                self.console.line(format_args!("* {key}"))?;
            }
            match page.continuation_token {
                Some(token) if cmd.all && page.truncated => {
                    tracing::debug!(bucket = %address.container, "fetching next page");
                    options.continuation_token = Some(token);
                }
                _ => break,
            }
        }
        Ok(())
    }

    async fn head(&mut self, cmd: HeadCommand) -> Result<()> {
        let primary = split(&cmd.target);
        primary.require_container()?;
        let gate = PresignGate::new(cmd.presign);

        let mut targets = vec![primary.clone()];
        targets.extend(cmd.keys.iter().map(|key| primary.with_item(key.as_str())));

        for address in targets {
            let exists = if address.is_container() {
                self.store.bucket_exists(&address.container).await?
            } else {
                if let Some(signed) = gate.sign(self.store, PresignMethod::Head, &address).await? {
                    self.console.line(&signed.url)?;
                    continue;
                }
                self.store.object_exists(&address).await?
            };
            self.console.stamped(format_args!("head {address} {exists}"))?;
        }
        Ok(())
    }

    async fn download(&mut self, cmd: GetCommand) -> Result<()> {
        let gate = PresignGate::new(cmd.presign);
        let query = non_empty_pairs(&cmd.query);

        for address in get_targets(&cmd)? {
            if let Some(signed) = gate.sign(self.store, PresignMethod::Get, &address).await? {
                self.console.line(&signed.url)?;
                continue;
            }

            let file_name = address.base_name().ok_or_else(|| {
                Error::InvalidAddress(format!("cannot derive a file name from '{address}'"))
            })?;
            let path = self.options.download_dir.join(&file_name);

            let mut reader = self.store.get_object(&address, &query).await?;
            let mut file = tokio::fs::File::create(&path).await?;
            let bytes = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;

            tracing::debug!(%address, bytes, path = %path.display(), "downloaded");
            self.console.stamped(format_args!("download {file_name}"))?;
        }
        Ok(())
    }

    async fn cat(&mut self, cmd: GetCommand) -> Result<()> {
        let gate = PresignGate::new(cmd.presign);
        let query = non_empty_pairs(&cmd.query);
        let mut buffer = vec![0u8; 64 * 1024];

        for address in get_targets(&cmd)? {
            if let Some(signed) = gate.sign(self.store, PresignMethod::Get, &address).await? {
                self.console.line(&signed.url)?;
                continue;
            }

            let mut reader = self.store.get_object(&address, &query).await?;
            loop {
                let n = reader.read(&mut buffer).await?;
                if n == 0 {
                    break;
                }
                self.console.out.write_all(&buffer[..n])?;
            }
        }
        Ok(())
    }

    async fn delete(&mut self, cmd: DeleteCommand) -> Result<()> {
        let gate = PresignGate::new(cmd.presign);

        match plan_delete(&split(&cmd.target), &cmd.keys)? {
            DeleteTarget::Container(bucket) => {
                gate.reject("bucket deletion")?;
                self.store.delete_bucket(&bucket).await?;
                self.console.stamped(format_args!("delete {bucket}"))
            }
            DeleteTarget::Object(address) => {
                if let Some(signed) = gate.sign(self.store, PresignMethod::Delete, &address).await?
                {
                    return self.console.line(&signed.url);
                }
                self.store.delete_object(&address).await?;
                self.console.stamped(format_args!("delete {address}"))
            }
            DeleteTarget::Batch(batch) => {
                gate.reject("batched delete")?;
                let bucket = batch.container().to_string();
                tracing::debug!(%bucket, count = batch.len(), "batched delete");
                self.store.delete_objects(&bucket, batch.into_keys()).await?;
                self.console.stamped("delete Objects success")
            }
        }
    }

    async fn create_bucket(&mut self, cmd: CreateBucketCommand) -> Result<()> {
        Address::new(cmd.bucket.as_str(), "").require_container()?;
        self.store.create_bucket(&cmd.bucket).await?;
        self.console.stamped(format_args!("create {}", cmd.bucket))
    }

    async fn upload(&mut self, cmd: UploadCommand) -> Result<()> {
        let gate = PresignGate::new(cmd.presign);
        let plan = plan_upload(&split(&cmd.target), &cmd.files)?;

        for target in plan {
            let address = target.address;
            if let Some(signed) = gate.sign(self.store, PresignMethod::Put, &address).await? {
                self.console.line(&signed.url)?;
                continue;
            }

            let content_type =
                resolve_content_type(cmd.content_type.as_deref(), target.file.as_deref());
            let options = PutOptions::new(content_type, &cmd.metadata);
            let body = match target.file {
                Some(path) => ObjectBody::File(path),
                None => ObjectBody::Bytes(cmd.data.clone().unwrap_or_default().into_bytes()),
            };

            match self.store.put_object(&address, body, &options).await {
                Ok(()) => self.console.stamped(format_args!("upload {address}"))?,
                Err(e) => {
                    tracing::error!(
                        %address,
                        transport = e.is_transport(),
                        error = ?e,
                        "upload failed, continuing with the next file"
                    );
                    self.console.warn(format_args!("upload {address} failed: {e}"));
                }
            }
        }
        Ok(())
    }

    async fn multipart_upload(&mut self, cmd: MultipartUploadCommand) -> Result<()> {
        let target = split(&cmd.target);
        target.require_container()?;
        let item = if target.item.is_empty() {
            base_name(&cmd.file).ok_or_else(|| {
                Error::InvalidAddress(format!(
                    "cannot derive an object key from '{}'",
                    cmd.file.display()
                ))
            })?
        } else {
            target.item.clone()
        };
        let address = target.with_item(item);

        let content_type = resolve_content_type(cmd.content_type.as_deref(), Some(&cmd.file));
        let request = ChunkedUploadRequest {
            address: address.clone(),
            file: cmd.file.clone(),
            options: PutOptions::new(content_type, &cmd.metadata),
            part_size: cmd.part_size_bytes()?,
        };

        tracing::info!(%address, part_size = request.part_size, "starting multipart upload");
        let upload = self.store.start_chunked_upload(request).await?;
        drive_upload(upload, self.console.status.as_mut(), self.options.poll_interval).await?;
        tracing::info!(%address, "multipart upload complete");

        self.console.stamped(format_args!("upload {address}"))
    }
}

/// Primary item first, then the extra keys, all in the primary's container
fn get_targets(cmd: &GetCommand) -> Result<Vec<Address>> {
    let primary = split(&cmd.target);
    primary.require_container()?;

    let mut targets = Vec::with_capacity(cmd.keys.len() + 1);
    if !primary.is_container() {
        targets.push(primary.clone());
    }
    targets.extend(cmd.keys.iter().map(|key| primary.with_item(key.as_str())));

    if targets.is_empty() {
        primary.require_item()?;
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::eq;
    use tempfile::TempDir;

    use super::multipart::tests::ScriptedUpload;
    use super::*;
    use crate::command::Presign;
    use crate::traits::{
        ChunkedUpload, KeyValues, ListResult, MockObjectStore, ObjectReader, TransferState,
    };

    struct Outcome {
        result: Result<()>,
        out: String,
        err: String,
    }

    impl Outcome {
        /// Stdout lines with the leading timestamp checked and removed
        fn unstamped(&self) -> Vec<String> {
            self.out
                .lines()
                .map(|line| {
                    let (stamp, rest) = line.split_once(' ').unwrap();
                    stamp.parse::<Timestamp>().unwrap();
                    rest.to_string()
                })
                .collect()
        }
    }

    async fn run(store: &MockObjectStore, command: Command) -> Outcome {
        run_with(store, command, FacadeOptions::default()).await
    }

    async fn run_with(
        store: &MockObjectStore,
        command: Command,
        options: FacadeOptions,
    ) -> Outcome {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = {
            let console = Console::new(
                Box::new(&mut out),
                Box::new(&mut err),
                Box::new(HiddenStatus),
            );
            let mut facade = Facade::new(store, console).with_options(options);
            facade.dispatch(command).await
        };
        Outcome {
            result,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn reader(bytes: &[u8]) -> ObjectReader {
        Box::new(std::io::Cursor::new(bytes.to_vec()))
    }

    fn delete(target: &str, keys: &[&str], presign: Option<Presign>) -> Command {
        Command::Delete(DeleteCommand {
            target: target.into(),
            keys: strings(keys),
            presign,
        })
    }

    fn get(target: &str, keys: &[&str]) -> GetCommand {
        GetCommand {
            target: target.into(),
            keys: strings(keys),
            query: KeyValues::new(),
            presign: None,
        }
    }

    fn upload(target: &str, files: Vec<PathBuf>, presign: Option<Presign>) -> Command {
        Command::Upload(UploadCommand {
            target: target.into(),
            files,
            data: None,
            content_type: None,
            metadata: KeyValues::new(),
            presign,
        })
    }

    #[tokio::test]
    async fn test_list_buckets_in_store_order() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_buckets()
            .times(1)
            .returning(|| Ok(strings(&["zeta", "alpha"])));

        let outcome = run(&store, Command::List(ListCommand::default())).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "- zeta\n- alpha\n");
    }

    #[tokio::test]
    async fn test_list_objects_with_prefix() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_objects()
            .withf(|bucket, options| {
                bucket == "photos" && options.prefix.as_deref() == Some("2024")
            })
            .times(1)
            .returning(|_, _| {
                Ok(ListResult {
                    keys: strings(&["2024/a.jpg", "2024/b.jpg"]),
                    truncated: false,
                    continuation_token: None,
                })
            });

        let command = Command::List(ListCommand {
            target: Some("photos/2024".into()),
            all: false,
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        insta::assert_snapshot!(outcome.out.trim_end(), @r"
        * 2024/a.jpg
        * 2024/b.jpg
        ");
    }

    #[tokio::test]
    async fn test_list_reads_one_page_without_all() {
        let mut store = MockObjectStore::new();
        store.expect_list_objects().times(1).returning(|_, _| {
            Ok(ListResult {
                keys: strings(&["a"]),
                truncated: true,
                continuation_token: Some("next".into()),
            })
        });

        let command = Command::List(ListCommand {
            target: Some("bucket".into()),
            all: false,
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "* a\n");
    }

    #[tokio::test]
    async fn test_list_all_follows_continuation() {
        let mut store = MockObjectStore::new();
        store
            .expect_list_objects()
            .withf(|_, options| options.continuation_token.is_none() && options.prefix.is_none())
            .times(1)
            .returning(|_, _| {
                Ok(ListResult {
                    keys: strings(&["a", "b"]),
                    truncated: true,
                    continuation_token: Some("page-2".into()),
                })
            });
        store
            .expect_list_objects()
            .withf(|_, options| options.continuation_token.as_deref() == Some("page-2"))
            .times(1)
            .returning(|_, _| {
                Ok(ListResult {
                    keys: strings(&["c"]),
                    truncated: false,
                    continuation_token: None,
                })
            });

        let command = Command::List(ListCommand {
            target: Some("bucket".into()),
            all: true,
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "* a\n* b\n* c\n");
    }

    #[tokio::test]
    async fn test_list_rejects_empty_container() {
        let store = MockObjectStore::new();
        let command = Command::List(ListCommand {
            target: Some("/prefix".into()),
            all: false,
        });
        let outcome = run(&store, command).await;
        assert!(matches!(outcome.result, Err(Error::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_single_delete_never_batches() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete_object()
            .withf(|address| *address == Address::new("bucket1", "k1"))
            .times(1)
            .returning(|_| Ok(()));
        store.expect_delete_objects().never();
        store.expect_delete_bucket().never();

        let outcome = run(&store, delete("bucket1/k1", &[], None)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.unstamped(), vec!["delete bucket1/k1"]);
    }

    #[tokio::test]
    async fn test_delete_batches_extra_keys_then_primary() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete_objects()
            .withf(|bucket, keys| bucket == "bucket1" && *keys == strings(&["k2", "k3", "k1"]))
            .times(1)
            .returning(|_, _| Ok(()));
        store.expect_delete_object().never();

        let outcome = run(&store, delete("bucket1/k1", &["k2", "k3"], None)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.unstamped(), vec!["delete Objects success"]);
    }

    #[tokio::test]
    async fn test_delete_container_only_removes_bucket() {
        let mut store = MockObjectStore::new();
        store
            .expect_delete_bucket()
            .with(eq("bucket1"))
            .times(1)
            .returning(|_| Ok(()));

        let outcome = run(&store, delete("bucket1", &[], None)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.unstamped(), vec!["delete bucket1"]);
    }

    #[tokio::test]
    async fn test_presigned_batch_delete_is_unsupported() {
        let mut store = MockObjectStore::new();
        store.expect_delete_objects().never();
        store.expect_presign().never();

        let outcome = run(&store, delete("b/k1", &["k2"], Some(Presign::minutes(5)))).await;
        let err = outcome.result.unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
        assert_eq!(err.exit_code(), 7);
        assert!(outcome.out.is_empty());
    }

    #[tokio::test]
    async fn test_presigned_delete_prints_url_only() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign()
            .withf(|method, address, _| {
                *method == PresignMethod::Delete && address.to_string() == "b/k1"
            })
            .times(1)
            .returning(|_, _, _| Ok("https://store/b/k1?sig".into()));
        store.expect_delete_object().never();

        let outcome = run(&store, delete("b/k1", &[], Some(Presign::minutes(5)))).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "https://store/b/k1?sig\n");
    }

    #[tokio::test]
    async fn test_presign_expiry_matches_ttl() {
        let started = Timestamp::now();
        let seen = Arc::new(Mutex::new(None));
        let recorded = seen.clone();

        let mut store = MockObjectStore::new();
        store
            .expect_presign()
            .times(1)
            .returning(move |method, _, expires_at| {
                assert_eq!(method, PresignMethod::Get);
                *recorded.lock().unwrap() = Some(expires_at);
                Ok("https://signed".into())
            });
        store.expect_get_object().never();

        let mut cmd = get("bucket/report.pdf", &[]);
        cmd.presign = Some(Presign::minutes(30));
        let outcome = run(&store, Command::Download(cmd)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out.lines().collect::<Vec<_>>(), vec!["https://signed"]);

        let expires_at = seen.lock().unwrap().unwrap();
        let expected = started + jiff::SignedDuration::from_mins(30);
        let drift = expires_at.duration_since(expected).abs();
        assert!(drift <= jiff::SignedDuration::from_secs(1), "drift was {drift}");
    }

    #[tokio::test]
    async fn test_presigned_upload_transfers_nothing() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign()
            .withf(|method, address, _| *method == PresignMethod::Put && address.item == "up.bin")
            .times(1)
            .returning(|_, _, _| Ok("https://signed-put".into()));
        store.expect_put_object().never();

        let command = upload(
            "bucket/up.bin",
            vec![PathBuf::from("local.bin")],
            Some(Presign::minutes(1)),
        );
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "https://signed-put\n");
    }

    #[tokio::test]
    async fn test_head_continues_after_missing_object() {
        let mut store = MockObjectStore::new();
        store
            .expect_bucket_exists()
            .with(eq("bucket"))
            .times(1)
            .returning(|_| Ok(true));
        store
            .expect_object_exists()
            .withf(|address| address.item == "gone")
            .times(1)
            .returning(|_| Ok(false));
        store
            .expect_object_exists()
            .withf(|address| address.item == "here")
            .times(1)
            .returning(|_| Ok(true));

        let command = Command::Head(HeadCommand {
            target: "bucket".into(),
            keys: strings(&["gone", "here"]),
            presign: None,
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(
            outcome.unstamped(),
            vec![
                "head bucket true",
                "head bucket/gone false",
                "head bucket/here true",
            ]
        );
    }

    #[tokio::test]
    async fn test_head_fails_fast_on_store_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_object_exists()
            .withf(|address| address.item == "a")
            .times(1)
            .returning(|_| Err(Error::Auth("AccessDenied".into())));
        store
            .expect_object_exists()
            .withf(|address| address.item == "b")
            .never();

        let command = Command::Head(HeadCommand {
            target: "bucket/a".into(),
            keys: strings(&["b"]),
            presign: None,
        });
        let outcome = run(&store, command).await;
        assert_eq!(outcome.result.unwrap_err().exit_code(), 1);
        assert!(outcome.out.is_empty());
    }

    #[tokio::test]
    async fn test_download_writes_base_name_into_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "stale").unwrap();

        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .withf(|address, query| address.to_string() == "bucket/a/b.txt" && query.is_empty())
            .times(1)
            .returning(|_, _| Ok(reader(b"fresh contents")));

        let options = FacadeOptions {
            download_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let command = Command::Download(get("bucket/a/b.txt", &[]));
        let outcome = run_with(&store, command, options).await;
        outcome.result.as_ref().unwrap();

        assert_eq!(outcome.unstamped(), vec!["download b.txt"]);
        let written = std::fs::read_to_string(dir.path().join("b.txt")).unwrap();
        assert_eq!(written, "fresh contents");
    }

    #[tokio::test]
    async fn test_download_fails_fast() {
        let dir = TempDir::new().unwrap();
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .withf(|address, _| address.item == "one")
            .times(1)
            .returning(|_, _| Err(Error::NotFound("NoSuchKey".into())));
        store
            .expect_get_object()
            .withf(|address, _| address.item == "two")
            .never();

        let options = FacadeOptions {
            download_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let command = Command::Download(get("bucket/one", &["two"]));
        let outcome = run_with(&store, command, options).await;
        assert!(matches!(outcome.result, Err(Error::NotFound(_))));
        assert!(outcome.out.is_empty());
    }

    #[tokio::test]
    async fn test_download_requires_an_item() {
        let store = MockObjectStore::new();
        let outcome = run(&store, Command::Download(get("bucket", &[]))).await;
        assert!(matches!(outcome.result, Err(Error::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_presigned_head_skips_existence_check() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign()
            .withf(|method, address, _| {
                *method == PresignMethod::Head && address.to_string() == "bucket/a.txt"
            })
            .times(1)
            .returning(|_, _, _| Ok("https://signed-head".into()));
        store.expect_object_exists().never();

        let command = Command::Head(HeadCommand {
            target: "bucket/a.txt".into(),
            keys: Vec::new(),
            presign: Some(Presign::minutes(10)),
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "https://signed-head\n");
    }

    #[tokio::test]
    async fn test_presigned_cat_streams_nothing() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign()
            .withf(|method, address, _| *method == PresignMethod::Get && address.item == "a.txt")
            .times(1)
            .returning(|_, _, _| Ok("https://signed-cat".into()));
        store.expect_get_object().never();

        let mut cmd = get("bucket/a.txt", &[]);
        cmd.presign = Some(Presign::minutes(10));
        let outcome = run(&store, Command::Cat(cmd)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "https://signed-cat\n");
    }

    #[tokio::test]
    async fn test_cat_streams_bytes_with_query() {
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .withf(|_, query| query.len() == 1 && query["versionId"] == "v2")
            .times(2)
            .returning(|address, _| Ok(reader(format!("[{}]", address.item).as_bytes())));

        let mut cmd = get("bucket/x", &["y"]);
        cmd.query.insert("versionId".into(), "v2".into());
        cmd.query.insert("".into(), "dropped".into());
        let outcome = run(&store, Command::Cat(cmd)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.out, "[x][y]");
    }

    #[tokio::test]
    async fn test_create_bucket() {
        let mut store = MockObjectStore::new();
        store
            .expect_create_bucket()
            .with(eq("fresh"))
            .times(1)
            .returning(|_| Ok(()));

        let command = Command::CreateBucket(CreateBucketCommand {
            bucket: "fresh".into(),
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.unstamped(), vec!["create fresh"]);
    }

    #[tokio::test]
    async fn test_prefix_mode_upload_puts_each_file() {
        let files = vec![
            PathBuf::from("/data/one.json"),
            PathBuf::from("/data/two.txt"),
            PathBuf::from("three"),
        ];
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .times(files.len())
            .returning(|_, body, _| match body {
                ObjectBody::File(_) => Ok(()),
                ObjectBody::Bytes(_) => panic!("expected a file body"),
            });

        let outcome = run(&store, upload("bucket/in-", files, None)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(
            outcome.unstamped(),
            vec![
                "upload bucket/in-one.json",
                "upload bucket/in-two.txt",
                "upload bucket/in-three",
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_content_type_and_metadata() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .withf(|address, body, options| {
                address.to_string() == "bucket/note"
                    && *body == ObjectBody::Bytes(b"hello".to_vec())
                    && options.content_type == "text/plain"
                    && options.metadata.len() == 1
                    && options.metadata["owner"] == "ops"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut metadata = KeyValues::new();
        metadata.insert("owner".into(), "ops".into());
        metadata.insert("blank".into(), "".into());
        let command = Command::Upload(UploadCommand {
            target: "bucket/note".into(),
            files: Vec::new(),
            data: Some("hello".into()),
            content_type: Some("text/plain".into()),
            metadata,
            presign: None,
        });
        let outcome = run(&store, command).await;
        outcome.result.as_ref().unwrap();
    }

    #[tokio::test]
    async fn test_upload_error_does_not_stop_batch() {
        let mut store = MockObjectStore::new();
        store
            .expect_put_object()
            .withf(|address, _, _| address.item == "a.bin")
            .times(1)
            .returning(|_, _, _| Err(Error::Network("connection reset".into())));
        store
            .expect_put_object()
            .withf(|address, _, _| address.item == "b.bin")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let files = vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")];
        let outcome = run(&store, upload("bucket", files, None)).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.unstamped(), vec!["upload bucket/b.bin"]);
        assert!(outcome.err.contains("bucket/a.bin"));
        assert!(outcome.err.contains("connection reset"));
    }

    fn mpu(target: &str, file: &str) -> Command {
        Command::MultipartUpload(MultipartUploadCommand {
            target: target.into(),
            file: PathBuf::from(file),
            content_type: None,
            metadata: KeyValues::new(),
            part_size_mib: 16,
        })
    }

    fn fast_polls() -> FacadeOptions {
        FacadeOptions {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_multipart_reports_after_completion() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let upload = ScriptedUpload::new(
            &[
                (TransferState::Waiting, 0),
                (TransferState::InProgress, 50),
                (TransferState::Completed, 100),
            ],
            events.clone(),
        );

        let mut store = MockObjectStore::new();
        store
            .expect_start_chunked_upload()
            .withf(|request| {
                request.address == Address::new("bucket", "disk.iso")
                    && request.part_size == 16 * 1024 * 1024
                    && request.options.content_type == "application/octet-stream"
            })
            .times(1)
            .return_once(move |_| Ok(Box::new(upload) as Box<dyn ChunkedUpload>));

        let outcome = run_with(&store, mpu("bucket", "/images/disk.iso"), fast_polls()).await;
        outcome.result.as_ref().unwrap();
        assert_eq!(outcome.unstamped(), vec!["upload bucket/disk.iso"]);
        assert_eq!(events.lock().unwrap().last().map(String::as_str), Some("finish"));
    }

    #[tokio::test]
    async fn test_multipart_failure_prints_no_completion() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let upload = ScriptedUpload::new(
            &[(TransferState::InProgress, 30), (TransferState::Failed, 30)],
            events,
        );

        let mut store = MockObjectStore::new();
        store
            .expect_start_chunked_upload()
            .times(1)
            .return_once(move |_| Ok(Box::new(upload) as Box<dyn ChunkedUpload>));

        let outcome = run_with(&store, mpu("bucket/big.bin", "local.bin"), fast_polls()).await;
        assert_eq!(outcome.result.unwrap_err().exit_code(), 1);
        assert!(outcome.out.is_empty());
    }

    #[tokio::test]
    async fn test_multipart_rejects_oversized_part_before_start() {
        let mut store = MockObjectStore::new();
        store.expect_start_chunked_upload().never();

        let Command::MultipartUpload(mut cmd) = mpu("bucket/big.bin", "local.bin") else {
            unreachable!();
        };
        cmd.part_size_mib = 1 << 44;
        let outcome = run(&store, Command::MultipartUpload(cmd)).await;
        assert!(matches!(outcome.result, Err(Error::Config(_))));
        assert!(outcome.out.is_empty());
    }
}
