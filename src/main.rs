//! CLI entry point for fsa_s3_roles.
//!
//! Registers credential sources from the command line, resolves the role
//! for an S3 URL and performs simple reads through the role-scoped client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsa_s3_roles::fetch::{FileReader, S3FileReader, SchemeFileReader, parse_s3_location};
use fsa_s3_roles::{AssumeRoleClientFactory, ClientCache, InlineCredential, S3ClientCache, Settings};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use url::Url;

#[derive(Parser)]
#[command(name = "fsa_s3_roles")]
#[command(about = "Resolve per-prefix AWS roles and read S3 objects through them", long_about = None)]
struct Cli {
    /// Inline credential as PREFIX=ROLE_ARN. Checked before any --credentials document
    #[arg(long = "role", value_name = "PREFIX=ROLE_ARN", value_parser = parse_inline, global = true)]
    roles: Vec<InlineCredential>,

    /// Credential config document (local path, file://, http(s):// or s3://)
    #[arg(long = "credentials", value_name = "LOCATION", value_parser = parse_location, global = true)]
    credentials: Vec<Url>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the credential descriptor that matches a URL
    Resolve {
        #[arg(value_name = "URL")]
        url: Url,
    },
    /// Show object metadata using the resolved role
    Head {
        #[arg(value_name = "S3_URL")]
        url: Url,
    },
    /// Write an object to stdout using the resolved role
    Cat {
        #[arg(value_name = "S3_URL")]
        url: Url,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    let sdk_config = aws_config::load_from_env().await;

    let reader: Arc<dyn FileReader> = Arc::new(SchemeFileReader::new(Some(
        S3FileReader::from_conf(&sdk_config),
    )));

    let mut cache = ClientCache::new(AssumeRoleClientFactory::new(sdk_config.clone(), settings))
        .on_client_created(|descriptor, _| {
            info!(
                role_arn = %descriptor.role_arn,
                prefix = %descriptor.prefix,
                "Role session client ready"
            );
        });
    for role in cli.roles {
        cache.register(role);
    }
    for location in cli.credentials {
        cache.register_config_document(location, reader.clone());
    }

    match cli.command {
        Commands::Resolve { url } => match cache.registry().find_credentials(&url).await? {
            Some(descriptor) => println!("{}", serde_json::to_string_pretty(&descriptor)?),
            None => info!(%url, "No credential matches, ambient credentials apply"),
        },
        Commands::Head { url } => {
            let (bucket, key) = parse_s3_location(&url)?;
            let client = client_for(&cache, &url, &sdk_config).await?;
            let head = client
                .head_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .with_context(|| format!("HeadObject failed for {url}"))?;

            info!(
                %bucket,
                %key,
                content_length = head.content_length(),
                content_type = head.content_type(),
                e_tag = head.e_tag(),
                last_modified = ?head.last_modified(),
                "Object"
            );
        }
        Commands::Cat { url } => {
            let (bucket, key) = parse_s3_location(&url)?;
            let client = client_for(&cache, &url, &sdk_config).await?;
            let resp = client
                .get_object()
                .bucket(&bucket)
                .key(&key)
                .send()
                .await
                .with_context(|| format!("GetObject failed for {url}"))?;

            let mut body = resp.body;
            let mut stdout = tokio::io::stdout();
            while let Some(chunk) = body.try_next().await? {
                stdout.write_all(&chunk).await?;
            }
            stdout.flush().await?;
        }
    }

    Ok(())
}

/// Logging setup: colored stderr + JSON rolling log file.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/fsa_s3_roles.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("fsa_s3_roles.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(file_guard)
}

/// Returns the role-scoped client for `url`, or an ambient-credential
/// client when no source matches.
async fn client_for(
    cache: &S3ClientCache,
    url: &Url,
    sdk_config: &aws_config::SdkConfig,
) -> Result<aws_sdk_s3::Client> {
    match cache.find(url).await? {
        Some(client) => Ok((*client).clone()),
        None => {
            warn!(%url, "No credential matches, using ambient credentials");
            Ok(aws_sdk_s3::Client::new(sdk_config))
        }
    }
}

fn parse_inline(raw: &str) -> std::result::Result<InlineCredential, String> {
    match raw.split_once('=') {
        Some((prefix, role_arn)) if !prefix.is_empty() && !role_arn.is_empty() => {
            Ok(InlineCredential::new(prefix, role_arn))
        }
        _ => Err(format!("expected PREFIX=ROLE_ARN, got '{raw}'")),
    }
}

/// Accepts URLs as-is and turns bare paths into `file://` URLs.
fn parse_location(raw: &str) -> std::result::Result<Url, String> {
    if let Ok(url) = Url::parse(raw) {
        // Single-letter schemes are Windows drive letters, not URLs.
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = std::path::absolute(raw).map_err(|e| format!("invalid path '{raw}': {e}"))?;
    Url::from_file_path(&path).map_err(|_| format!("invalid path '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inline() {
        let credential = parse_inline("s3://bucket-a/=arn:aws:iam::123456789012:role/A").unwrap();
        assert_eq!(credential.prefix, "s3://bucket-a/");
        assert_eq!(credential.role_arn, "arn:aws:iam::123456789012:role/A");
        assert_eq!(credential.external_id, None);
    }

    #[test]
    fn test_parse_inline_rejects_incomplete() {
        assert!(parse_inline("s3://bucket-a/").is_err());
        assert!(parse_inline("=role").is_err());
        assert!(parse_inline("s3://bucket-a/=").is_err());
    }

    #[test]
    fn test_parse_location_keeps_urls() {
        for raw in ["s3://cfg/creds.json", "https://example.com/creds.json", "file:///etc/creds.json"] {
            assert_eq!(parse_location(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_parse_location_bare_path_becomes_file_url() {
        let url = parse_location("config/creds.json").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/config/creds.json"));

        let url = parse_location("/etc/fsa/creds.json").unwrap();
        assert_eq!(url.as_str(), "file:///etc/fsa/creds.json");
    }

    #[test]
    fn test_parse_location_drive_letter_is_a_path() {
        let url = parse_location("C:/cfg/creds.json").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("cfg/creds.json"));
    }
}
