//! DuckDuckGo search engine implementation

use super::traits::*;
use crate::config::EngineConfig;
use crate::error::EngineError;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result").expect("valid selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("valid selector"));

/// Open backend over the DuckDuckGo HTML endpoint, no credentials needed
pub struct DuckDuckGo {
    html_url: String,
}

impl DuckDuckGo {
    pub fn new() -> Self {
        Self {
            html_url: "https://html.duckduckgo.com/html/".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.html_url = url.into();
        self
    }

    fn parse_html_results(&self, html: &str) -> Vec<ProviderResult> {
        let document = Html::parse_document(html);
        let mut results = Vec::new();

        for element in document.select(&RESULT_SELECTOR) {
            let title_elem = match element.select(&TITLE_SELECTOR).next() {
                Some(t) => t,
                None => continue,
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            if title.is_empty() {
                continue;
            }

            let link = match title_elem.value().attr("href").and_then(resolve_link) {
                Some(link) => link,
                None => continue,
            };

            results.push(ProviderResult::new(title, link));
        }

        results
    }
}

/// Resolve a result href to its target URL.
///
/// Result links are usually redirects of the form
/// `//duckduckgo.com/l/?uddg=<encoded target>`; ads and other internal links
/// resolve to `None`.
fn resolve_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;

    let internal = parsed
        .host_str()
        .map(|h| h.ends_with("duckduckgo.com"))
        .unwrap_or(false);
    if !internal {
        return Some(absolute);
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == "uddg")
        .map(|(_, v)| v.into_owned())
        .filter(|target| !target.is_empty())
}

impl Default for DuckDuckGo {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for DuckDuckGo {
    fn name(&self) -> &str {
        "DuckDuckGo"
    }

    fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
        Ok(EngineRequest::get(&self.html_url).param("q", params.query.as_str()))
    }

    fn response(&self, response: EngineResponse) -> Result<Vec<ProviderResult>, EngineError> {
        response.error_for_status()?;

        Ok(self.parse_html_results(&response.text))
    }

    fn init(&mut self, config: &EngineConfig) -> anyhow::Result<()> {
        if let Some(ref url) = config.base_url {
            self.html_url = url.clone();
        }
        Ok(())
    }
}
