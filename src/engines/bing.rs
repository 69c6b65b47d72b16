//! Bing Web Search API engine

use super::traits::*;
use crate::config::EngineConfig;
use crate::error::EngineError;
use serde::Deserialize;

const NAME: &str = "Bing";

/// Keyed backend over the Bing Web Search v7 API
pub struct Bing {
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
struct WebPages {
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
struct WebPage {
    name: String,
    url: String,
}

impl Bing {
    pub fn new() -> Self {
        Self {
            base_url: "https://api.bing.microsoft.com/v7.0/search".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

impl Default for Bing {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for Bing {
    fn name(&self) -> &str {
        NAME
    }

    fn required_credentials(&self) -> &'static [&'static str] {
        &[BING_API_KEY]
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        let key = params.credentials.require(NAME, BING_API_KEY)?;

        let url = format!(
            "{}?q={}&count={}",
            self.base_url,
            urlencoding::encode(&params.query),
            params.limit.max(1)
        );

        Ok(EngineRequest::get(url)
            .header("Accept", "application/json")
            .header("Ocp-Apim-Subscription-Key", key))
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<ProviderResult>, EngineError> {
        response.error_for_status()?;

        let body: SearchResponse = response.json()?;
        Ok(body
            .web_pages
            .map(|pages| pages.value)
            .unwrap_or_default()
            .into_iter()
            .map(|page| ProviderResult::new(page.name, page.url))
            .collect())
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            self.base_url = url.clone();
        }
        Ok(())
    }
}
