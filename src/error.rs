//! Error types for config loading, signing, HTTP calls and the query flow.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Render an error and its `source()` chain as `outer: inner: root`.
/// Messages never repeat their cause, so each link appears once.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        cause = inner.source();
    }
    out
}

/// Startup failures while loading the JSON config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a JSON object of scalar values.
    #[error("malformed config file {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A required key is absent or null.
    #[error("config is missing required key `{key}`")]
    MissingKey { key: &'static str },
}

/// The HMAC key was rejected. HMAC accepts any key length, so this only
/// exists to avoid panicking inside the signer.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid HMAC-SHA1 signing key")]
    InvalidKey,
}

/// Network failures and non-2xx responses.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("invalid request url {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to sign request")]
    Signing(#[from] OAuthError),

    #[error("invalid Authorization header")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Connection, TLS, timeout or body read failure.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a status outside 200..=299.
    #[error("request to {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
}

/// Failures of the search-then-detail flow that end it early.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("search request failed")]
    Http(#[from] HttpError),

    /// The search body was not valid JSON. Carries the body verbatim so the
    /// front-end can print it.
    #[error("could not parse JSON response")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}
