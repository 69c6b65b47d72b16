//! Google Custom Search JSON API engine

use super::traits::*;
use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::Deserialize;

const NAME: &str = "Google";

/// Keyed backend over the Custom Search JSON API
pub struct Google {
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: String,
    link: String,
}

impl Google {
    pub fn new() -> Self {
        Self {
            base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for Google {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Google {
    fn name(&self) -> &str {
        NAME
    }

    fn required_credentials(&self) -> &'static [&'static str] {
        &[SEARCH_API_KEY, SEARCH_ENGINE_ID]
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        let key = params.credentials.require(NAME, SEARCH_API_KEY)?;
        let cx = params.credentials.require(NAME, SEARCH_ENGINE_ID)?;

        // The API rejects num outside 1..=10
        let num = params.limit.clamp(1, 10);

        Ok(EngineRequest::get(&self.base_url)
            .header("Accept", "application/json")
            .param("key", key)
            .param("cx", cx)
            .param("q", params.query.as_str())
            .param("num", num.to_string()))
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<ProviderResult>, EngineError> {
        response.error_for_status()?;

        let body: SearchResponse = response.json()?;
        Ok(body
            .items
            .into_iter()
            .map(|item| ProviderResult::new(item.title, item.link))
            .collect())
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            self.base_url = url.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn credentials() -> Credentials {
        Credentials::new()
            .with(SEARCH_API_KEY, "key")
            .with(SEARCH_ENGINE_ID, "cx")
    }

    fn response(status: u16, text: &str) -> EngineResponse {
        EngineResponse {
            status,
            headers: HashMap::new(),
            text: text.to_string(),
            url: String::new(),
        }
    }

    #[test]
    fn test_google_request() {
        let google = Google::new();
        let params = RequestParams::new("rust programming")
            .with_limit(25)
            .with_credentials(credentials());
        let request = google.request(&params).unwrap();

        assert!(request.url.contains("googleapis.com"));
        assert_eq!(request.param_value("q"), Some("rust programming"));
        assert_eq!(request.param_value("cx"), Some("cx"));
        assert_eq!(request.param_value("num"), Some("10"));
    }

    #[test]
    fn test_google_requires_engine_id() {
        let google = Google::new();
        let params = RequestParams::new("rust")
            .with_credentials(Credentials::new().with(SEARCH_API_KEY, "key"));
        let err = google.request(&params).unwrap_err();

        assert_eq!(
            err,
            EngineError::MissingCredential {
                engine: "Google".to_string(),
                key: SEARCH_ENGINE_ID,
            }
        );
    }

    #[test]
    fn test_google_response_preserves_order() {
        let google = Google::new();
        let body = r#"{"items":[
            {"title":"First","link":"https://a.example"},
            {"title":"Second","link":"https://b.example"}
        ]}"#;
        let results = google.response(response(200, body)).unwrap();

        assert_eq!(
            results,
            vec![
                ProviderResult::new("First", "https://a.example"),
                ProviderResult::new("Second", "https://b.example"),
            ]
        );
    }

    #[test]
    fn test_google_response_without_items() {
        let google = Google::new();
        let results = google.response(response(200, "{}")).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_google_response_errors() {
        let google = Google::new();
        assert_eq!(
            google.response(response(403, "{}")).unwrap_err(),
            EngineError::Http(403)
        );
        assert!(matches!(
            google.response(response(200, "<html>")).unwrap_err(),
            EngineError::Parse(_)
        ));
    }
}
