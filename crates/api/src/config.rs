use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{missing} is required when {because} is set")]
    Missing {
        missing: &'static str,
        because: &'static str,
    },
}

/// Remote blob store holding the content document.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub url: String,
    pub token: String,
    pub content_key: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// Local content document; also the snapshot when a blob store is used.
    pub content_file: PathBuf,
    /// Checked-in document copied into an empty store at startup.
    pub seed_content_file: PathBuf,
    pub upload_dir: PathBuf,
    /// URL path the upload directory is served under.
    pub upload_url_prefix: String,
    pub max_upload_bytes: u64,
    /// Set when `BLOB_READ_WRITE_TOKEN` is present.
    pub blob: Option<BlobConfig>,
    pub analytics_file: PathBuf,
    pub analytics_poll_secs: u64,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
    }
}

fn positive<T: PartialEq + Default>(
    name: &'static str,
    value: T,
    shown: impl ToString,
) -> Result<T, ConfigError> {
    if value == T::default() {
        return Err(ConfigError::Invalid {
            name,
            value: shown.to_string(),
            expected: "greater than zero",
        });
    }
    Ok(value)
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let upload_url_prefix = var("UPLOAD_URL_PREFIX", "/uploads");
        let upload_url_prefix = upload_url_prefix.trim_end_matches('/').to_string();
        if !upload_url_prefix.starts_with('/') {
            return Err(ConfigError::Invalid {
                name: "UPLOAD_URL_PREFIX",
                value: upload_url_prefix,
                expected: "an absolute path other than \"/\"",
            });
        }

        let blob = match get("BLOB_READ_WRITE_TOKEN").filter(|t| !t.trim().is_empty()) {
            None => None,
            Some(token) => Some(BlobConfig {
                url: get("BLOB_STORE_URL").ok_or(ConfigError::Missing {
                    missing: "BLOB_STORE_URL",
                    because: "BLOB_READ_WRITE_TOKEN",
                })?,
                token,
                content_key: var("BLOB_CONTENT_KEY", "content.json"),
            }),
        };

        let max_upload_bytes = parse(&get, "MAX_UPLOAD_BYTES", 104_857_600u64, "a byte count")?;
        let analytics_poll_secs = parse(&get, "ANALYTICS_POLL_SECS", 30u64, "a number of seconds")?;
        let event_bus_capacity = parse(&get, "EVENT_BUS_CAPACITY", 1024usize, "a valid usize")?;

        Ok(Self {
            host: var("HOST", "0.0.0.0"),
            port: parse(&get, "PORT", 3001, "a valid u16")?,
            content_file: var("CONTENT_FILE", "data/content.json").into(),
            seed_content_file: var("SEED_CONTENT_FILE", "data/content.default.json").into(),
            upload_dir: var("UPLOAD_DIR", "public/uploads").into(),
            upload_url_prefix,
            max_upload_bytes: positive("MAX_UPLOAD_BYTES", max_upload_bytes, max_upload_bytes)?,
            blob,
            analytics_file: var("ANALYTICS_FILE", "data/analytics.json").into(),
            analytics_poll_secs: positive(
                "ANALYTICS_POLL_SECS",
                analytics_poll_secs,
                analytics_poll_secs,
            )?,
            event_bus_capacity: positive(
                "EVENT_BUS_CAPACITY",
                event_bus_capacity,
                event_bus_capacity,
            )?,
            log_level: var("LOG_LEVEL", "info"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn analytics_poll_interval(&self) -> Duration {
        Duration::from_secs(self.analytics_poll_secs)
    }
}
