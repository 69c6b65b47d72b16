//! Engine traits and types

use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Credential key for the keyed web search API
pub const SEARCH_API_KEY: &str = "search_api_key";
/// Credential key for the custom search engine (collection) id
pub const SEARCH_ENGINE_ID: &str = "search_engine_id";
/// Credential key for the Bing subscription key
pub const BING_API_KEY: &str = "bing_api_key";

/// A single search hit, in the order the backend produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResult {
    pub title: String,
    pub link: String,
}

impl ProviderResult {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Per-backend credentials supplied by the caller
///
/// Values are never printed: `Debug` only lists the keys that are present.
#[derive(Clone, Default)]
pub struct Credentials {
    values: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a credential, treating blank values as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    /// Get a credential an engine cannot work without
    pub fn require(&self, engine: &str, key: &'static str) -> Result<&str, EngineError> {
        self.get(key).ok_or_else(|| EngineError::MissingCredential {
            engine: engine.to_string(),
            key,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut credentials = Self::new();
        for (k, v) in iter {
            credentials.insert(k, v);
        }
        credentials
    }
}

/// Parameters for building a search request
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Search query string
    pub query: String,
    /// Maximum number of results wanted
    pub limit: u32,
    /// Caller credentials
    pub credentials: Credentials,
}

impl RequestParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: 5,
            credentials: Credentials::new(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// HTTP GET request to be made by the engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URL to request
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters, in insertion order
    pub params: Vec<(String, String)>,
}

impl EngineRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            params: Vec::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Look up a query parameter
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP response from engine request
#[derive(Debug)]
pub struct EngineResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl EngineResponse {
    /// Parse response as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, EngineError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the status code unless the response is 2xx
    pub fn error_for_status(&self) -> Result<(), EngineError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(EngineError::Http(self.status))
        }
    }
}

/// A search backend
///
/// Engines are pure: `request` validates credentials and builds the call,
/// `response` parses it. The shared HTTP client runs the call in between, see
/// [`run_engine`](super::run_engine).
pub trait Engine: Send + Sync {
    /// Backend name callers select it by
    fn name(&self) -> &str;

    /// Credentials that must be present for a request to be built
    fn required_credentials(&self) -> &'static [&'static str] {
        &[]
    }

    /// Default timeout in seconds
    fn timeout(&self) -> f64 {
        5.0
    }

    /// Build the HTTP request for a search
    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError>;

    /// Parse the HTTP response into results, in backend order
    fn response(&self, response: EngineResponse) -> Result<Vec<ProviderResult>, EngineError>;

    /// Optional initialization from configuration (called once on load)
    fn init(&mut self, _config: &EngineConfig) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_hides_values() {
        let credentials = Credentials::new().with(BING_API_KEY, "s3cr3t");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains(BING_API_KEY));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn test_blank_credentials_are_missing() {
        let credentials = Credentials::new().with(SEARCH_API_KEY, "  ");
        assert!(credentials.get(SEARCH_API_KEY).is_none());
        let err = credentials.require("Google", SEARCH_API_KEY).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_response_status() {
        let response = EngineResponse {
            status: 503,
            headers: HashMap::new(),
            text: String::new(),
            url: String::new(),
        };
        assert_eq!(response.error_for_status(), Err(EngineError::Http(503)));
    }
}
