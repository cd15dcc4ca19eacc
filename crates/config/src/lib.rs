//! Run configuration for the importer.
//!
//! Values are layered, later sources winning:
//! 1. built-in defaults,
//! 2. a TOML file (`--config <path>`, else `./senas.toml`, else
//!    `config.toml` in the platform configuration directory),
//! 3. environment variables named after the keys in upper case
//!    (`DRIVE_FOLDER_ID`, `MAX_CONCURRENT_DOWNLOADS`, ...). `.env.local` and
//!    then `.env` are loaded into the environment first, without overriding
//!    variables that are already set.
//!
//! Configuration is immutable for the duration of a run.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::num::{NonZeroU32, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_FILE: &str = "senas.toml";
const DOTENV_FILES: [&str; 2] = [".env.local", ".env"];
/// Keys that may be set from the environment.
const ENV_KEYS: [&str; 9] = [
    "drive_folder_id",
    "base_output_dir",
    "max_concurrent_downloads",
    "retry_attempts",
    "retry_delay_ms",
    "log_level",
    "google_credentials_path",
    "google_token_path",
    "database_path",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}
impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Id of the remote folder holding the whole taxonomy. Required.
    pub drive_folder_id: String,
    /// Local dataset root.
    pub base_output_dir: PathBuf,
    pub max_concurrent_downloads: usize,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub log_level: LogLevel,
    pub google_credentials_path: PathBuf,
    pub google_token_path: PathBuf,
    /// SQLite catalog file.
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drive_folder_id: String::new(),
            base_output_dir: PathBuf::from("./datasets"),
            max_concurrent_downloads: 5,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            log_level: LogLevel::Info,
            google_credentials_path: PathBuf::from("./credentials.json"),
            google_token_path: PathBuf::from("./token.json"),
            database_path: PathBuf::from("./senas.db"),
        }
    }
}

impl Config {
    /// Load `.env` files, then every configuration layer, then validate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        load_dotenv();
        Self::from_figment(Self::figment(explicit)?)
    }

    /// Layered configuration sources without the `.env` side effects.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = config_file(explicit)? {
            tracing::debug!(file = %file.display(), "Reading configuration file");
            figment = figment.merge(Toml::file(file));
        }
        Ok(figment.merge(Env::raw().only(&ENV_KEYS)))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every rule, reporting all offending keys at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.drive_folder_id.trim().is_empty() {
            problems.push("drive_folder_id must be set (DRIVE_FOLDER_ID)".to_string());
        }
        if self.max_concurrent_downloads == 0 {
            problems.push("max_concurrent_downloads must be greater than 0".to_string());
        }
        if self.retry_attempts == 0 {
            problems.push("retry_attempts must be greater than 0".to_string());
        }
        if self.retry_delay_ms == 0 {
            problems.push("retry_delay_ms must be greater than 0".to_string());
        }
        if self.base_output_dir.as_os_str().is_empty() {
            problems.push("base_output_dir must not be empty".to_string());
        }
        match problems.is_empty() {
            true => Ok(()),
            false => exn::bail!(ErrorKind::Invalid(problems)),
        }
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_concurrent_downloads).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn attempts(&self) -> NonZeroU32 {
        NonZeroU32::new(self.retry_attempts).unwrap_or(NonZeroU32::MIN)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Which TOML file to read, if any.
fn config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
        }
        return Ok(Some(path.to_path_buf()));
    }
    let local = PathBuf::from(LOCAL_FILE);
    if local.is_file() {
        return Ok(Some(local));
    }
    Ok(ProjectDirs::from("", "", "senas")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .filter(|path| path.is_file()))
}

fn load_dotenv() {
    for file in DOTENV_FILES {
        match dotenvy::from_filename(file) {
            Ok(path) => tracing::debug!(file = %path.display(), "Loaded environment file"),
            Err(err) if err.not_found() => {},
            Err(err) => tracing::warn!(file, error = %err, "Ignoring unreadable environment file"),
        }
    }
}
