use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr, time::Duration};

const ENV_PREFIX: &str = "MEDIA_CATALOG_";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub public_base_url: String,
    pub audio_bucket: String,
    pub image_bucket: String,
    pub stream_chunk_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Period of the background curation task; `None` disables it.
    pub curation_interval: Option<Duration>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Media catalog and range streaming service")]
pub struct Args {
    /// Host to bind to (overrides MEDIA_CATALOG_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MEDIA_CATALOG_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where blob payloads are stored (overrides MEDIA_CATALOG_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides MEDIA_CATALOG_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Prefix of public object URLs (overrides MEDIA_CATALOG_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Seconds between curation runs (overrides MEDIA_CATALOG_CURATION_INTERVAL_SECS)
    #[arg(long)]
    pub curation_interval_secs: Option<u64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

/// Read `MEDIA_CATALOG_{name}`; `None` when unset.
fn env_var(name: &str) -> Result<Option<String>> {
    let key = format!("{}{}", ENV_PREFIX, name);
    match env::var(&key) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}

/// Read and parse `MEDIA_CATALOG_{name}`; a value that does not parse is an
/// error, not a silent default.
fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env_var(name)? {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {}{} value `{}`", ENV_PREFIX, name, value)),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        Ok((Self::merge(args)?, migrate))
    }

    /// CLI wins, environment is the fallback, defaults come last.
    pub fn merge(args: Args) -> Result<Self> {
        let env_host = env_var("HOST")?.unwrap_or_else(|| "0.0.0.0".into());
        let env_port = env_parse::<u16>("PORT")?.unwrap_or(3000);
        let env_storage = env_var("STORAGE_DIR")?.unwrap_or_else(|| "./data/objects".into());
        let env_db = env_var("DATABASE_URL")?
            .unwrap_or_else(|| "sqlite://./data/meta/catalog.db".into());
        let env_public = env_var("PUBLIC_BASE_URL")?
            .unwrap_or_else(|| "http://localhost:3000/objects".into());
        let audio_bucket = env_var("AUDIO_BUCKET")?.unwrap_or_else(|| "musicapp".into());
        let image_bucket = env_var("IMAGE_BUCKET")?.unwrap_or_else(|| "imagesmusicapp".into());
        let chunk_timeout = env_parse::<u64>("STREAM_CHUNK_TIMEOUT_SECS")?.unwrap_or(30);
        let max_upload_mb = env_parse::<usize>("MAX_UPLOAD_MB")?.unwrap_or(64);
        let env_interval = env_parse::<u64>("CURATION_INTERVAL_SECS")?;

        let curation_interval = args
            .curation_interval_secs
            .or(env_interval)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            public_base_url: args.public_base_url.unwrap_or(env_public),
            audio_bucket,
            image_bucket,
            stream_chunk_timeout: Duration::from_secs(chunk_timeout.max(1)),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            curation_interval,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
