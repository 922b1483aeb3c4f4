// API client module: a small blocking HTTP client for the two Yelp
// endpoints used here (search and business detail). Every request is
// signed with OAuth 1.0a before it is sent.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, Endpoints};
use crate::error::HttpError;
use crate::oauth::{append_query, percent_encode, OAuthRequest, OAuthSigner};

/// Upper bound for a single request, connect through body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("yelp-api-cli/", env!("CARGO_PKG_VERSION"));

/// Where the OAuth parameters travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureTransport {
    /// `Authorization: OAuth ...` header.
    #[default]
    Header,
    /// Appended to the query string.
    QueryString,
}

/// One search: what, where, how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub location: String,
    pub limit: String,
}

impl SearchQuery {
    pub fn new(
        term: impl Into<String>,
        location: impl Into<String>,
        limit: impl Into<String>,
    ) -> Self {
        Self {
            term: term.into(),
            location: location.into(),
            limit: limit.into(),
        }
    }
}

/// One entry of the search `businesses` array. `id` is `None` when the entry
/// has no usable identifier; `fields` is the entry as received.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessSummary {
    pub id: Option<String>,
    pub fields: Value,
}

/// The businesses found by a search, in response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub businesses: Vec<BusinessSummary>,
}

impl SearchResult {
    /// Extract the `businesses` array from a parsed search body. A missing,
    /// null or non-array value yields an empty result.
    pub fn from_value(body: &Value) -> Self {
        let businesses = match body.get("businesses") {
            Some(Value::Array(items)) => items.iter().map(BusinessSummary::from_value).collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                warn!(kind = %json_kind(other), "`businesses` is not an array; ignoring it");
                Vec::new()
            }
        };
        Self { businesses }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.businesses.iter().filter_map(|b| b.id.as_deref())
    }
}

impl BusinessSummary {
    fn from_value(entry: &Value) -> Self {
        let id = match entry.get("id") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        Self {
            id,
            fields: entry.clone(),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The two calls the query flow needs. Implemented by [`ApiClient`]; tests
/// substitute their own.
pub trait BusinessApi {
    /// Raw body of a search by term and location.
    fn search_businesses(&self, term: &str, location: &str, limit: &str)
        -> Result<String, HttpError>;

    /// Raw body of the detail record for one business id.
    fn get_business_detail(&self, id: &str) -> Result<String, HttpError>;
}

/// Blocking client holding the reqwest client, the endpoint paths and the
/// request signer.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    endpoints: Endpoints,
    signer: OAuthSigner,
    transport: SignatureTransport,
}

impl ApiClient {
    /// Client for `https://{api_host}` with the default timeout.
    pub fn new(config: &Config) -> Result<Self, HttpError> {
        Self::with_base_url(config, config.base_url())
    }

    /// Client for an explicit base URL such as `http://127.0.0.1:8080`.
    pub fn with_base_url(config: &Config, base_url: impl Into<String>) -> Result<Self, HttpError> {
        Ok(ApiClient {
            client: build_client(DEFAULT_TIMEOUT)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
            signer: OAuthSigner::new(config.credentials.clone()),
            transport: SignatureTransport::default(),
        })
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, HttpError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn with_transport(mut self, transport: SignatureTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Search by term and location. Returns the body of a 2xx response.
    pub fn search_businesses(
        &self,
        term: &str,
        location: &str,
        limit: &str,
    ) -> Result<String, HttpError> {
        let mut url = self.endpoint_url(&self.endpoints.search_endpoint)?;
        append_query(
            &mut url,
            [("term", term), ("location", location), ("limit", limit)],
        );
        self.send(url)
    }

    /// Fetch the detail record for one business id.
    pub fn get_business_detail(&self, id: &str) -> Result<String, HttpError> {
        let path = format!(
            "{}/{}",
            self.endpoints.business_endpoint.trim_end_matches('/'),
            percent_encode(id)
        );
        let url = self.endpoint_url(&path)?;
        self.send(url)
    }

    fn endpoint_url(&self, path: &str) -> Result<Url, HttpError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|source| HttpError::InvalidUrl { url: raw, source })
    }

    /// Sign, send and read the body. Non-2xx becomes `HttpError::Status`.
    fn send(&self, url: Url) -> Result<String, HttpError> {
        info!("Querying {} ...", url);
        let signed = self.signer.sign(&OAuthRequest::get(url))?;

        let request = match self.transport {
            SignatureTransport::Header => {
                let auth = HeaderValue::from_str(&signed.authorization_header())?;
                self.client.get(signed.url().clone()).header(AUTHORIZATION, auth)
            }
            SignatureTransport::QueryString => self.client.get(signed.url_with_oauth_query()),
        };

        let url = signed.url().to_string();
        let res = request.send().map_err(|source| HttpError::Transport {
            url: url.clone(),
            source,
        })?;
        let status = res.status();
        debug!(%url, status = status.as_u16(), "response received");

        let body = res.text().map_err(|source| HttpError::Transport {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(HttpError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl BusinessApi for ApiClient {
    fn search_businesses(
        &self,
        term: &str,
        location: &str,
        limit: &str,
    ) -> Result<String, HttpError> {
        ApiClient::search_businesses(self, term, location, limit)
    }

    fn get_business_detail(&self, id: &str) -> Result<String, HttpError> {
        ApiClient::get_business_detail(self, id)
    }
}

fn build_client(timeout: Duration) -> Result<Client, HttpError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(HttpError::Client)
}
