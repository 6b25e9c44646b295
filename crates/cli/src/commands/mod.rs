//! CLI command definitions and execution
//!
//! Each subcommand parses into an Args struct that converts into a resolved
//! `s3c_core::Command`. Execution is shared: load the configuration, resolve
//! the profile, build the S3 client, and hand the command to the façade.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use s3c_core::config::Defaults;
use s3c_core::{Command, ConfigManager, Facade, Presign, ProfileManager};
use s3c_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, stdio_console};

pub mod completions;
pub mod connection;
mod get;
mod head;
mod ls;
mod mb;
mod mpu;
mod put;
mod rm;

use connection::{ConnectionArgs, Resolved};

/// s3cli - Object store command-line client
///
/// Lists, inspects, transfers and removes objects on S3-compatible storage,
/// or produces presigned URLs for the same operations.
#[derive(Parser, Debug)]
#[command(name = "s3cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable the multipart status line
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets, or objects under a prefix
    #[command(visible_alias = "ls")]
    List(ls::ListArgs),

    /// Check whether a bucket or objects exist
    Head(head::HeadArgs),

    /// Download objects into the current directory
    #[command(visible_alias = "get")]
    Download(get::GetArgs),

    /// Write object contents to stdout
    Cat(get::GetArgs),

    /// Remove objects or a bucket
    #[command(visible_alias = "rm")]
    Delete(rm::DeleteArgs),

    /// Create a bucket
    #[command(visible_alias = "mb")]
    CreateBucket(mb::CreateBucketArgs),

    /// Upload files or inline content
    #[command(visible_alias = "put")]
    Upload(put::UploadArgs),

    /// Upload a large file in parts
    Mpu(mpu::MpuArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Presign flags shared by the item commands
#[derive(Args, Debug, Clone, Default)]
pub struct PresignArgs {
    /// Print a presigned URL instead of performing the request
    #[arg(long)]
    pub presign: bool,

    /// Presigned URL lifetime in minutes
    #[arg(long, value_name = "MINUTES", requires = "presign")]
    pub expire: Option<u64>,
}

impl PresignArgs {
    pub fn resolve(&self, defaults: &Defaults) -> Option<Presign> {
        self.presign.then(|| {
            Presign::minutes(self.expire.unwrap_or(defaults.presign_expire_minutes))
        })
    }
}

/// Parse a `KEY=VALUE` pair; the value may itself contain `=`
pub(crate) fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{s}'"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl Commands {
    /// Resolve into a façade command; `None` for commands handled locally
    pub fn into_command(self, defaults: &Defaults) -> Option<Command> {
        let command = match self {
            Commands::List(args) => args.into_command(),
            Commands::Head(args) => args.into_command(defaults),
            Commands::Download(args) => Command::Download(args.into_get(defaults)),
            Commands::Cat(args) => Command::Cat(args.into_get(defaults)),
            Commands::Delete(args) => args.into_command(defaults),
            Commands::CreateBucket(args) => args.into_command(),
            Commands::Upload(args) => args.into_command(defaults),
            Commands::Mpu(args) => args.into_command(defaults),
            Commands::Completions(_) => return None,
        };
        Some(command)
    }
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        no_color: cli.no_color,
        no_progress: cli.no_progress,
    };
    let formatter = Formatter::new(output_config.clone());

    if let Commands::Completions(args) = cli.command {
        return completions::execute(args);
    }

    match run(cli.connection, cli.command, output_config, &formatter).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            ExitCode::from_error(&e)
        }
    }
}

async fn run(
    connection: ConnectionArgs,
    command: Commands,
    mut output_config: OutputConfig,
    formatter: &Formatter,
) -> anyhow::Result<()> {
    let config_manager = ConfigManager::new()?;
    let config = config_manager
        .load()
        .with_context(|| format!("loading {}", config_manager.config_path().display()))?;
    let profiles = ProfileManager::with_config_manager(config_manager);

    let resolved = connection.resolve(&profiles)?;
    if let Resolved::Adhoc(profile) = &resolved {
        formatter.warning(&format!(
            "profile '{}' is not configured, using command-line settings",
            profile.name
        ));
    }
    let profile = resolved.into_profile();

    let Some(command) = command.into_command(&config.defaults) else {
        return Ok(());
    };
    tracing::debug!(command = command.name(), profile = %profile.name, "dispatching");

    let client = S3Client::new(profile).await?;
    output_config.no_progress |= !config.defaults.progress;
    let mut facade = Facade::new(&client, stdio_console(&output_config));
    facade.dispatch(command).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use s3c_core::command::{GetCommand, ListCommand};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("response-content-type=text/plain").unwrap(),
            ("response-content-type".to_string(), "text/plain".to_string())
        );
        assert_eq!(
            parse_key_val("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    #[test]
    fn test_list_alias() {
        let cli = parse(&["s3cli", "ls", "bucket/logs/", "--all"]);
        let command = cli.command.into_command(&Defaults::default()).unwrap();
        assert_eq!(
            command,
            Command::List(ListCommand {
                target: Some("bucket/logs/".into()),
                all: true,
            })
        );
    }

    #[test]
    fn test_presign_default_expiry() {
        let defaults = Defaults::default();
        let cli = parse(&["s3cli", "get", "bucket/a.txt", "--presign"]);
        let Some(Command::Download(get)) = cli.command.into_command(&defaults) else {
            panic!("expected a download");
        };
        assert_eq!(
            get.presign,
            Some(Presign::minutes(defaults.presign_expire_minutes))
        );
    }

    #[test]
    fn test_expire_requires_presign() {
        assert!(Cli::try_parse_from(["s3cli", "cat", "bucket/a", "--expire", "5"]).is_err());
    }

    #[test]
    fn test_cat_with_query_and_keys() {
        let cli = parse(&[
            "s3cli",
            "cat",
            "bucket/a.txt",
            "b.txt",
            "-q",
            "versionId=3",
            "--presign",
            "--expire",
            "15",
        ]);
        let command = cli.command.into_command(&Defaults::default()).unwrap();
        assert_eq!(
            command,
            Command::Cat(GetCommand {
                target: "bucket/a.txt".into(),
                keys: vec!["b.txt".into()],
                query: [("versionId".to_string(), "3".to_string())].into(),
                presign: Some(Presign::minutes(15)),
            })
        );
    }

    #[test]
    fn test_mpu_part_size_default() {
        let defaults = Defaults::default();
        let cli = parse(&["s3cli", "mpu", "bucket/big.iso", "./big.iso"]);
        let Some(Command::MultipartUpload(mpu)) = cli.command.into_command(&defaults) else {
            panic!("expected a multipart upload");
        };
        assert_eq!(mpu.part_size_mib, defaults.part_size_mib);

        let cli = parse(&["s3cli", "mpu", "bucket", "./big.iso", "--part-size", "64"]);
        let Some(Command::MultipartUpload(mpu)) = cli.command.into_command(&defaults) else {
            panic!("expected a multipart upload");
        };
        assert_eq!(mpu.part_size_mib, 64);
    }

    #[test]
    fn test_upload_data_conflicts_with_files() {
        assert!(
            Cli::try_parse_from(["s3cli", "put", "bucket/k", "f.txt", "--data", "hi"]).is_err()
        );
        let cli = parse(&["s3cli", "put", "bucket/k", "--data", "hi", "-m", "owner=ops"]);
        let Some(Command::Upload(upload)) = cli.command.into_command(&Defaults::default()) else {
            panic!("expected an upload");
        };
        assert_eq!(upload.data.as_deref(), Some("hi"));
        assert_eq!(upload.metadata.get("owner").map(String::as_str), Some("ops"));
    }

    #[test]
    fn test_completions_are_local() {
        let cli = parse(&["s3cli", "completions", "bash"]);
        assert!(cli.command.into_command(&Defaults::default()).is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&[
            "s3cli",
            "create-bucket",
            "photos",
            "--endpoint",
            "http://127.0.0.1:9000",
            "--no-progress",
        ]);
        assert!(cli.no_progress);
        assert_eq!(
            cli.connection.endpoint.as_deref(),
            Some("http://127.0.0.1:9000")
        );
    }
}
