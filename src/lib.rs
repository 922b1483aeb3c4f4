// Library root
// -----------
// This crate exposes the pieces of the Yelp search client. The binary
// (`main.rs`) wires them together behind two command line flags.
//
// Module responsibilities:
// - `config`: loads credentials and endpoint paths from a JSON file.
// - `oauth`: OAuth 1.0a request signing (HMAC-SHA1).
// - `api`: blocking HTTP client for the search and business endpoints.
// - `ui`: the search-then-detail flow and its console output.
// - `error`: error types shared by the modules above.
pub mod api;
pub mod config;
pub mod error;
pub mod oauth;
pub mod ui;

pub use api::{ApiClient, BusinessApi, SearchQuery, SearchResult};
pub use config::Config;
pub use error::{ConfigError, HttpError, OAuthError, QueryError};
pub use oauth::{Credentials, OAuthSigner};
pub use ui::{query_api, QuerySummary};
