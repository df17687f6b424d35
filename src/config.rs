//! Client configuration: the API base URL, the request timeout and where the
//! session record lives. Values come from the CLI (with `TRUCKGATE_*` env
//! fallbacks) or, for embedders, from [`AppConfig::from_env`]. Blank values are
//! treated as unset. Configuration is public; do not store secrets here.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

pub const ENV_API_URL: &str = "TRUCKGATE_API_URL";
pub const ENV_SESSION_FILE: &str = "TRUCKGATE_SESSION_FILE";
pub const ENV_TIMEOUT: &str = "TRUCKGATE_TIMEOUT";

/// Default request timeout (seconds) applied to every API call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SESSION_DIR: &str = ".truckgate";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API base URL is not configured, set {ENV_API_URL} or --api-url")]
    MissingBaseUrl,
    #[error("invalid API base URL {value}: {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported API base URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid request timeout: {0}")]
    InvalidTimeout(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
}

impl AppConfig {
    /// Builds a config with the default timeout and session location.
    ///
    /// # Errors
    /// Returns an error if the base URL is blank, unparsable or not HTTP(S).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(api_base_url)?,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            session_file: default_session_file(),
        })
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Loads the config from `TRUCKGATE_*` environment variables.
    ///
    /// # Errors
    /// Returns an error if the base URL is missing or invalid, or the timeout
    /// is not a positive number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut overrides = EnvOverrides {
            api_base_url: read_env(ENV_API_URL),
            session_file: read_env(ENV_SESSION_FILE),
            timeout: read_env(ENV_TIMEOUT),
        };

        let base = overrides
            .api_base_url
            .take()
            .ok_or(ConfigError::MissingBaseUrl)?;
        let mut config = Self::new(&base)?;
        apply_overrides(&mut config, overrides)?;

        Ok(config)
    }
}

#[derive(Default)]
struct EnvOverrides {
    api_base_url: Option<String>,
    session_file: Option<String>,
    timeout: Option<String>,
}

fn apply_overrides(config: &mut AppConfig, overrides: EnvOverrides) -> Result<(), ConfigError> {
    if let Some(value) = overrides.api_base_url {
        config.api_base_url = parse_base_url(&value)?;
    }
    if let Some(value) = overrides.session_file {
        config.session_file = PathBuf::from(value);
    }
    if let Some(value) = overrides.timeout {
        config.request_timeout = parse_timeout(&value)?;
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| normalize_value(&value))
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a timeout in whole seconds; zero is rejected.
///
/// # Errors
/// Returns an error if the value is not a positive integer.
pub fn parse_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidTimeout(value.to_string())),
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let value = normalize_value(value).ok_or(ConfigError::MissingBaseUrl)?;
    let url = Url::parse(&value).map_err(|source| ConfigError::InvalidBaseUrl {
        value: value.clone(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::UnsupportedScheme(scheme.to_string())),
    }
}

/// `$HOME/.truckgate/session.json`, or relative to the working directory when
/// no home is known.
#[must_use]
pub fn default_session_file() -> PathBuf {
    let base = env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(|| PathBuf::from("."), PathBuf::from);
    session_file_in(&base)
}

fn session_file_in(base: &Path) -> PathBuf {
    base.join(SESSION_DIR)
        .join(crate::session::store::SESSION_FILE)
}

/// Joins an API path onto the base URL. Paths with and without a leading
/// slash resolve the same way and keep any base path prefix such as `/api`.
#[must_use]
pub fn build_url_with_base(base_url: &Url, path: &str) -> String {
    let base = base_url.as_str().trim().trim_end_matches('/');
    let path = path.trim();

    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
