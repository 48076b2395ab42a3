use crate::poller::DEFAULT_POLL_INTERVAL;
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Secrets file looked up in the working directory when `--config` is not given.
pub const LOCAL_SECRET_FILE: &str = ".secret.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to load {path}: {message}")]
    Dotenv { path: String, message: String },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

/// Settings as found in the secrets file, all optional until resolved.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// zkLink JSON-RPC endpoint
    pub endpoint: Option<String>,

    /// L1 private key, hex
    pub private_key: Option<String>,

    /// JSON-RPC endpoint of the zkLink signer service
    pub signer_url: Option<String>,

    /// Pause between two polls, in milliseconds
    pub poll_interval_ms: u64,

    /// HTTP request timeout in seconds
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            private_key: None,
            signer_url: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            timeout: 30,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("signer_url", &self.signer_url)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub private_key: Option<String>,
    pub signer_url: Option<String>,
}

/// Validated settings, fixed for the rest of the run.
#[derive(Clone)]
pub struct Settings {
    pub endpoint: String,
    pub private_key: String,
    pub signer_url: String,
    pub poll_interval: Duration,
    pub timeout: u64,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("endpoint", &self.endpoint)
            .field("signer_url", &self.signer_url)
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load the secrets file.
    ///
    /// An explicit path must exist. Without one, `./.secret.toml` and then
    /// `<config dir>/l2-activate/secret.toml` are tried; if neither exists the
    /// defaults are used and everything has to come from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_paths().into_iter().find(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(Config::default()),
            },
        };

        log::debug!("loading config from {}", path.display());
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_SECRET_FILE)];
        if let Some(dir) = config_dir() {
            paths.push(dir.join("l2-activate").join("secret.toml"));
        }
        paths
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if overrides.endpoint.is_some() {
            self.endpoint = overrides.endpoint;
        }
        if overrides.private_key.is_some() {
            self.private_key = overrides.private_key;
        }
        if overrides.signer_url.is_some() {
            self.signer_url = overrides.signer_url;
        }
    }

    pub fn resolve(self) -> Result<Settings, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        Ok(Settings {
            endpoint: required(self.endpoint, "endpoint")?,
            private_key: required(self.private_key, "private_key")?,
            signer_url: required(self.signer_url, "signer_url")?,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.timeout,
        })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Load `.env.$APP_ENV` and then `.env.$APP_ENV.local`, each overriding the
/// process environment. Missing files are skipped; nothing happens without `APP_ENV`.
///
/// Runs before the logger exists, so the loaded paths are returned for the
/// caller to log.
pub fn load_dotenv_files() -> Result<Vec<PathBuf>, ConfigError> {
    let app_env = match std::env::var("APP_ENV") {
        Ok(app_env) if !app_env.is_empty() => app_env,
        _ => return Ok(Vec::new()),
    };

    let mut loaded = Vec::new();
    for name in [format!(".env.{}", app_env), format!(".env.{}.local", app_env)] {
        let path = PathBuf::from(name);
        if load_dotenv_overriding(&path)? {
            loaded.push(path);
        }
    }
    Ok(loaded)
}

/// Returns whether `path` existed and was applied.
pub fn load_dotenv_overriding(path: &Path) -> Result<bool, ConfigError> {
    if !path.exists() {
        return Ok(false);
    }

    dotenvy::from_path_override(path).map_err(|e| ConfigError::Dotenv {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(true)
}
