//! Application configuration loaded via OrthoConfig.
//!
//! [`AppSettings`] is the raw layered input (CLI flags, `APP_*` environment
//! variables, configuration files). [`AppSettings::validate`] turns it into a
//! typed [`RuntimeConfig`] once at startup; nothing reads settings after that.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use cap_std::{ambient_authority, fs::Dir};
use chrono::NaiveTime;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::domain::retry::{DEFAULT_MAX_DELAY, RetryPolicy, RetryPolicyError};
use crate::domain::upload::MAX_FILE_SIZE_BYTES;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_POOL_SIZE: u32 = 20;
const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GEMINI_MAX_RETRIES: u32 = 3;
const DEFAULT_GEMINI_RETRY_DELAY_SECS: u64 = 1;
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_TEMP_DIR: &str = "./temp";
const DEFAULT_APP_NAME: &str = "ebook_summary";
const DEFAULT_RETENTION_DAYS: u32 = 30;
const DEFAULT_CLEANUP_TIME: &str = "02:00";

/// Raw configuration values.
#[derive(Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "APP")]
pub struct AppSettings {
    /// Interface to bind.
    pub server_host: Option<String>,
    /// Port to bind.
    pub server_port: Option<u16>,
    /// `development`, `staging`, or `production`.
    pub environment: Option<String>,
    /// Expose diagnostics and API docs. Defaults to the build mode.
    ///
    /// Kept off the command line: a clap `SetTrue` flag reports `false` when
    /// absent, which would mask `APP_DEBUG` and file values.
    #[ortho_config(skip_cli)]
    pub debug: Option<bool>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub db_pool_size: Option<u32>,
    /// Pool checkout timeout in seconds.
    pub db_pool_timeout_secs: Option<u64>,
    /// Apply pending migrations at startup. Off unless set.
    #[ortho_config(skip_cli)]
    pub run_migrations: Option<bool>,
    /// Generative AI API key.
    pub gemini_api_key: Option<String>,
    /// Generative AI model name.
    pub gemini_model: Option<String>,
    /// Upstream request timeout in seconds.
    pub gemini_request_timeout_secs: Option<u64>,
    /// Retries after the first upstream attempt.
    pub gemini_max_retries: Option<u32>,
    /// First retry delay in seconds.
    pub gemini_retry_delay_secs: Option<u64>,
    /// Largest accepted upload in bytes.
    pub max_upload_size_bytes: Option<u64>,
    /// Where uploads are stored.
    pub upload_dir: Option<PathBuf>,
    /// Scratch space for processing.
    pub temp_dir: Option<PathBuf>,
    /// `DEBUG`, `INFO`, `WARNING`, `ERROR`, or `CRITICAL`.
    pub log_level: Option<String>,
    /// `json` or `text`.
    pub log_format: Option<String>,
    /// Name reported by `/health` and in logs.
    pub app_name: Option<String>,
    /// Days before uploaded documents expire.
    pub document_retention_days: Option<u32>,
    /// Daily cleanup time, `HH:MM`.
    pub cleanup_job_time: Option<String>,
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("debug", &self.debug)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("run_migrations", &self.run_migrations)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    /// Port 0 cannot be bound predictably.
    #[error("server port must be between 1 and 65535")]
    InvalidPort,
    /// Unrecognised environment label.
    #[error("unknown environment {0:?}; expected development, staging, or production")]
    UnknownEnvironment(String),
    /// Unrecognised log level.
    #[error("unknown log level {0:?}; expected DEBUG, INFO, WARNING, ERROR, or CRITICAL")]
    UnknownLogLevel(String),
    /// Unrecognised log format.
    #[error("unknown log format {0:?}; expected json or text")]
    UnknownLogFormat(String),
    /// The database URL is malformed or not PostgreSQL.
    #[error("invalid database URL: {reason}")]
    InvalidDatabaseUrl {
        /// Why the URL was rejected.
        reason: String,
    },
    /// A count or duration that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero {
        /// Offending setting.
        field: &'static str,
    },
    /// Cleanup time is not `HH:MM`.
    #[error("cleanup job time {0:?} must use HH:MM format")]
    InvalidCleanupTime(String),
    /// Retry settings do not form a valid policy.
    #[error("invalid generative API retry settings: {0}")]
    RetryPolicy(#[from] RetryPolicyError),
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Pre-production.
    Staging,
    /// Production.
    Production,
}

impl Environment {
    /// Lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            _ => Err(SettingsError::UnknownEnvironment(value.to_owned())),
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Everything.
    Debug,
    /// Normal operation.
    #[default]
    Info,
    /// Recoverable problems.
    Warning,
    /// Failures.
    Error,
    /// Failures only; tracing has no separate critical level.
    Critical,
}

impl LogLevel {
    /// `EnvFilter` directive for this level.
    pub const fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(SettingsError::UnknownLogLevel(value.to_owned())),
        }
    }
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Text,
}

impl FromStr for LogFormat {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(SettingsError::UnknownLogFormat(value.to_owned())),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoggingSettings {
    /// Verbosity.
    pub level: LogLevel,
    /// Encoding.
    pub format: LogFormat,
}

/// Database connection configuration.
#[derive(Clone)]
pub struct DatabaseSettings {
    /// Validated connection URL.
    pub url: Zeroizing<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// Checkout timeout.
    pub pool_timeout: Duration,
    /// Apply pending migrations at startup.
    pub run_migrations: bool,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("url", &"<redacted>")
            .field("pool_size", &self.pool_size)
            .field("pool_timeout", &self.pool_timeout)
            .field("run_migrations", &self.run_migrations)
            .finish()
    }
}

/// Generative AI API configuration.
#[derive(Clone)]
pub struct GenerativeApiSettings {
    /// API key, when configured.
    pub api_key: Option<Zeroizing<String>>,
    /// Model name.
    pub model: String,
    /// Upstream request timeout.
    pub request_timeout: Duration,
    /// Backoff applied to upstream calls.
    pub retry_policy: RetryPolicy,
}

impl GenerativeApiSettings {
    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|key| !key.is_empty())
    }
}

impl fmt::Debug for GenerativeApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeApiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

/// Upload storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    /// Largest accepted upload.
    pub max_upload_size_bytes: u64,
    /// Where uploads are stored.
    pub upload_dir: PathBuf,
    /// Scratch space for processing.
    pub temp_dir: PathBuf,
}

/// Document retention configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionSettings {
    /// Days before uploaded documents expire.
    pub document_retention_days: u32,
    /// Daily cleanup time.
    pub cleanup_job_time: NaiveTime,
}

/// Validated configuration consumed by the server.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Deployment environment.
    pub environment: Environment,
    /// Expose diagnostics and API docs.
    pub debug: bool,
    /// Application name.
    pub app_name: String,
    /// Database settings; `None` runs without persistence.
    pub database: Option<DatabaseSettings>,
    /// Generative AI API settings.
    pub generative: GenerativeApiSettings,
    /// Upload settings.
    pub uploads: UploadSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Retention settings.
    pub retention: RetentionSettings,
}

fn positive<T: PartialEq + Default>(value: T, field: &'static str) -> Result<T, SettingsError> {
    if value == T::default() {
        Err(SettingsError::Zero { field })
    } else {
        Ok(value)
    }
}

fn parse_or_default<T>(value: Option<&str>) -> Result<T, SettingsError>
where
    T: FromStr<Err = SettingsError> + Default,
{
    value.map_or_else(|| Ok(T::default()), str::parse)
}

fn validate_database_url(raw: &str) -> Result<(), SettingsError> {
    let url = url::Url::parse(raw).map_err(|err| SettingsError::InvalidDatabaseUrl {
        reason: err.to_string(),
    })?;
    match url.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => Err(SettingsError::InvalidDatabaseUrl {
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

fn parse_cleanup_time(raw: &str) -> Result<NaiveTime, SettingsError> {
    let invalid = || SettingsError::InvalidCleanupTime(raw.to_owned());
    if raw.len() != 5 {
        return Err(invalid());
    }
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| invalid())
}

impl AppSettings {
    /// Check every value and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns the first [`SettingsError`] found.
    pub fn validate(&self) -> Result<RuntimeConfig, SettingsError> {
        let port = self.server_port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(SettingsError::InvalidPort);
        }
        let environment = parse_or_default::<Environment>(self.environment.as_deref())?;
        let logging = LoggingSettings {
            level: parse_or_default(self.log_level.as_deref())?,
            format: parse_or_default(self.log_format.as_deref())?,
        };

        let database = match self.database_url.as_deref().filter(|url| !url.is_empty()) {
            Some(url) => {
                validate_database_url(url)?;
                Some(DatabaseSettings {
                    url: Zeroizing::new(url.to_owned()),
                    pool_size: positive(
                        self.db_pool_size.unwrap_or(DEFAULT_POOL_SIZE),
                        "db_pool_size",
                    )?,
                    pool_timeout: Duration::from_secs(positive(
                        self.db_pool_timeout_secs.unwrap_or(DEFAULT_POOL_TIMEOUT_SECS),
                        "db_pool_timeout_secs",
                    )?),
                    run_migrations: self.run_migrations.unwrap_or(false),
                })
            }
            None => None,
        };

        let retry_delay = Duration::from_secs(
            self.gemini_retry_delay_secs
                .unwrap_or(DEFAULT_GEMINI_RETRY_DELAY_SECS),
        );
        let retry_policy = RetryPolicy::builder()
            .max_retries(self.gemini_max_retries.unwrap_or(DEFAULT_GEMINI_MAX_RETRIES))
            .initial_delay(retry_delay)
            .max_delay(retry_delay.max(DEFAULT_MAX_DELAY))
            .build()?;
        let generative = GenerativeApiSettings {
            api_key: self
                .gemini_api_key
                .as_ref()
                .map(|key| Zeroizing::new(key.clone())),
            model: self
                .gemini_model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_owned()),
            request_timeout: Duration::from_secs(positive(
                self.gemini_request_timeout_secs
                    .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS),
                "gemini_request_timeout_secs",
            )?),
            retry_policy,
        };

        let uploads = UploadSettings {
            max_upload_size_bytes: positive(
                self.max_upload_size_bytes.unwrap_or(MAX_FILE_SIZE_BYTES),
                "max_upload_size_bytes",
            )?,
            upload_dir: self
                .upload_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            temp_dir: self
                .temp_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_DIR)),
        };

        let retention = RetentionSettings {
            document_retention_days: positive(
                self.document_retention_days
                    .unwrap_or(DEFAULT_RETENTION_DAYS),
                "document_retention_days",
            )?,
            cleanup_job_time: parse_cleanup_time(
                self.cleanup_job_time
                    .as_deref()
                    .unwrap_or(DEFAULT_CLEANUP_TIME),
            )?,
        };

        Ok(RuntimeConfig {
            host: self
                .server_host
                .clone()
                .unwrap_or_else(|| DEFAULT_HOST.to_owned()),
            port,
            environment,
            debug: self.debug.unwrap_or(cfg!(debug_assertions)),
            app_name: self
                .app_name
                .clone()
                .unwrap_or_else(|| DEFAULT_APP_NAME.to_owned()),
            database,
            generative,
            uploads,
            logging,
            retention,
        })
    }
}

/// Failure to prepare a storage directory.
#[derive(Debug, thiserror::Error)]
#[error("failed to create directory {path}: {source}")]
pub struct DirectoryError {
    /// Directory that could not be created.
    pub path: PathBuf,
    /// Underlying I/O failure.
    #[source]
    pub source: std::io::Error,
}

fn create_dir(path: &Path) -> Result<(), DirectoryError> {
    Dir::create_ambient_dir_all(path, ambient_authority()).map_err(|source| DirectoryError {
        path: path.to_path_buf(),
        source,
    })
}

/// Create the upload and temp directories when missing.
///
/// # Errors
///
/// Returns [`DirectoryError`] for the first directory that cannot be created.
pub fn ensure_directories(uploads: &UploadSettings) -> Result<(), DirectoryError> {
    create_dir(&uploads.upload_dir)?;
    create_dir(&uploads.temp_dir)
}

#[cfg(test)]
mod tests;
