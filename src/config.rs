// Config module: loads API credentials and endpoint paths from a small
// JSON file. The file is read once at startup and the resulting `Config`
// is handed to the client; nothing is kept in globals.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::oauth::Credentials;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "YELP_API_CONFIG";

/// Where the API lives and how many results a search asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_host: String,
    pub search_endpoint: String,
    pub business_endpoint: String,
    pub default_search_results: String,
}

/// Everything read from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub credentials: Credentials,
    pub endpoints: Endpoints,
}

/// A config value as it may appear in the file. Numbers and booleans are
/// accepted and turned into their textual form.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

/// File layout. Every key is optional here so that a missing one can be
/// reported by name instead of as a generic serde message.
#[derive(Deserialize)]
struct RawConfig {
    consumer_key: Option<Scalar>,
    consumer_secret: Option<Scalar>,
    token: Option<Scalar>,
    token_secret: Option<Scalar>,
    search_endpoint: Option<Scalar>,
    business_endpoint: Option<Scalar>,
    default_search_results: Option<Scalar>,
    api_host: Option<Scalar>,
}

fn required(key: &'static str, value: Option<Scalar>) -> Result<String, ConfigError> {
    value
        .map(String::from)
        .ok_or(ConfigError::MissingKey { key })
}

impl Config {
    /// Read and validate the config file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|err| match err {
            ConfigError::Malformed { source, .. } => ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), host = %config.endpoints.api_host, "loaded config");
        Ok(config)
    }

    /// Load the config from the location given by `YELP_API_CONFIG`, or the
    /// default locations when it is unset. See [`resolve_config_path`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = resolve_config_path(std::env::var_os(CONFIG_ENV_VAR), dirs::config_dir());
        Self::load(&path)
    }

    /// Parse the JSON text of a config file.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(text).map_err(|source| ConfigError::Malformed {
                path: PathBuf::new(),
                source,
            })?;

        let credentials = Credentials::new(
            required("consumer_key", raw.consumer_key)?,
            required("consumer_secret", raw.consumer_secret)?,
            required("token", raw.token)?,
            required("token_secret", raw.token_secret)?,
        );
        let endpoints = Endpoints {
            api_host: required("api_host", raw.api_host)?,
            search_endpoint: required("search_endpoint", raw.search_endpoint)?,
            business_endpoint: required("business_endpoint", raw.business_endpoint)?,
            default_search_results: required(
                "default_search_results",
                raw.default_search_results,
            )?,
        };

        Ok(Config {
            credentials,
            endpoints,
        })
    }

    /// `https://{api_host}`
    pub fn base_url(&self) -> String {
        format!("https://{}", self.endpoints.api_host)
    }
}

/// Pick the config file path. An explicit override wins; otherwise the file
/// lives in the platform config directory, falling back to `./config.json`.
pub fn resolve_config_path(
    env_override: Option<OsString>,
    config_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = env_override.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match config_dir {
        Some(dir) => dir.join("yelp-api").join("config.json"),
        None => PathBuf::from("config.json"),
    }
}
