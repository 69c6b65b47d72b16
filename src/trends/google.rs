//! Google Trends web endpoints

use super::models::{RegionInterest, RelatedEntry, RelatedLists, TimeSeries, TrendQuery};
use super::traits::{TrendSession, TrendsBackend};
use crate::config::TrendsSettings;
use crate::engines::EngineRequest;
use crate::error::TrendsError;
use crate::network::HttpClient;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const TIMESERIES: &str = "TIMESERIES";
const GEO_MAP: &str = "GEO_MAP";
const RELATED_TOPICS: &str = "RELATED_TOPICS";
const RELATED_QUERIES: &str = "RELATED_QUERIES";

/// Trend backend over the public Google Trends endpoints
pub struct GoogleTrends {
    client: HttpClient,
    base_url: String,
    language: String,
    tz_offset: i32,
}

impl GoogleTrends {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: "https://trends.google.com".to_string(),
            language: "es".to_string(),
            tz_offset: 360,
        }
    }

    pub fn from_settings(client: HttpClient, settings: &TrendsSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            language: settings.language.clone(),
            tz_offset: settings.tz_offset,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TrendsBackend for GoogleTrends {
    fn name(&self) -> &str {
        "GoogleTrends"
    }

    async fn build_session(
        &self,
        query: &TrendQuery,
    ) -> Result<Arc<dyn TrendSession>, TrendsError> {
        let geo = query.geo();

        // Cookie handshake; the explore endpoint answers 429 without it
        let prime = EngineRequest::get(format!("{}/", self.base_url)).param("geo", geo.as_str());
        let response = self
            .client
            .execute(prime)
            .await
            .map_err(|e| TrendsError::Network(HttpClient::classify_error(&e).to_string()))?;
        if !response.is_success() {
            return Err(TrendsError::Http(response.status));
        }

        let payload = json!({
            "comparisonItem": [{
                "keyword": query.keyword,
                "time": query.timeframe,
                "geo": geo,
            }],
            "category": 0,
            "property": "",
        });
        let explore = EngineRequest::get(format!("{}/trends/api/explore", self.base_url))
            .param("hl", self.language.as_str())
            .param("tz", self.tz_offset.to_string())
            .param("req", payload.to_string());
        let body: ExploreResponse = fetch_json(&self.client, explore).await?;

        if !body.widgets.iter().any(|w| w.id == TIMESERIES) {
            return Err(TrendsError::MissingWidget(TIMESERIES));
        }
        debug!(
            keyword = %query.keyword,
            widgets = body.widgets.len(),
            "trends.explore.ok"
        );

        Ok(Arc::new(GoogleTrendsSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            tz_offset: self.tz_offset,
            worldwide: geo.is_empty(),
            widgets: body.widgets,
        }))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Widget {
    id: String,
    #[serde(default)]
    request: Value,
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    default: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Timeline {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelinePoint {
    formatted_time: String,
    #[serde(default)]
    value: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoMap {
    #[serde(default)]
    geo_map_data: Vec<GeoPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeoPoint {
    #[serde(default)]
    geo_code: String,
    geo_name: String,
    #[serde(default)]
    value: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ranked {
    #[serde(default)]
    ranked_list: Vec<RankedList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedList {
    #[serde(default)]
    ranked_keyword: Vec<RankedKeyword>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RankedKeyword {
    #[serde(default)]
    topic: Option<Topic>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    value: i64,
    #[serde(default)]
    formatted_value: String,
}

#[derive(Debug, Deserialize)]
struct Topic {
    title: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl RankedKeyword {
    fn into_entry(self) -> Option<RelatedEntry> {
        let (title, kind) = match (self.topic, self.query) {
            (Some(topic), _) => (topic.title, topic.kind),
            (None, Some(query)) => (query, None),
            (None, None) => return None,
        };
        Some(RelatedEntry {
            title,
            kind,
            value: self.value,
            formatted_value: self.formatted_value,
        })
    }
}

struct GoogleTrendsSession {
    client: HttpClient,
    base_url: String,
    tz_offset: i32,
    worldwide: bool,
    widgets: Vec<Widget>,
}

impl GoogleTrendsSession {
    fn widget(&self, id: &'static str) -> Result<&Widget, TrendsError> {
        self.widgets
            .iter()
            .find(|w| w.id == id)
            .ok_or(TrendsError::MissingWidget(id))
    }

    async fn widget_data<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        widget: &Widget,
        request: &Value,
    ) -> Result<T, TrendsError> {
        let req = EngineRequest::get(format!(
            "{}/trends/api/widgetdata/{}",
            self.base_url, endpoint
        ))
        .param("req", request.to_string())
        .param("token", widget.token.as_str())
        .param("tz", self.tz_offset.to_string());

        let envelope: Envelope<T> = fetch_json(&self.client, req).await?;
        Ok(envelope.default)
    }

    async fn related(&self, id: &'static str) -> Result<RelatedLists, TrendsError> {
        let widget = self.widget(id)?;
        let ranked: Ranked = self
            .widget_data("relatedsearches", widget, &widget.request)
            .await?;

        let mut lists = ranked.ranked_list.into_iter().map(|list| {
            list.ranked_keyword
                .into_iter()
                .filter_map(RankedKeyword::into_entry)
                .collect::<Vec<_>>()
        });
        Ok(RelatedLists {
            top: lists.next().unwrap_or_default(),
            rising: lists.next().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl TrendSession for GoogleTrendsSession {
    async fn interest_over_time(&self) -> Result<TimeSeries, TrendsError> {
        let widget = self.widget(TIMESERIES)?;
        let timeline: Timeline = self
            .widget_data("multiline", widget, &widget.request)
            .await?;

        let mut series = TimeSeries::default();
        for point in timeline.timeline_data {
            series.push(point.formatted_time, point.value.first().copied().unwrap_or(0));
        }
        Ok(series)
    }

    async fn interest_by_region(&self) -> Result<Vec<RegionInterest>, TrendsError> {
        let widget = self.widget(GEO_MAP)?;
        let mut request = widget.request.clone();
        if let Some(obj) = request.as_object_mut() {
            if self.worldwide {
                obj.insert("resolution".into(), json!("COUNTRY"));
            }
            obj.insert("includeLowSearchVolumeGeos".into(), json!(false));
        }

        let geo: GeoMap = self.widget_data("comparedgeo", widget, &request).await?;
        Ok(geo
            .geo_map_data
            .into_iter()
            .map(|p| RegionInterest {
                geo_code: p.geo_code,
                geo_name: p.geo_name,
                value: p.value.first().copied().unwrap_or(0),
            })
            .collect())
    }

    async fn related_topics(&self) -> Result<RelatedLists, TrendsError> {
        self.related(RELATED_TOPICS).await
    }

    async fn related_queries(&self) -> Result<RelatedLists, TrendsError> {
        self.related(RELATED_QUERIES).await
    }
}

/// Run a request and decode its body, skipping the anti-JSON prefix
async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &HttpClient,
    request: EngineRequest,
) -> Result<T, TrendsError> {
    let request = request.header("Accept", "application/json, text/plain, */*");
    let response = client
        .execute(request)
        .await
        .map_err(|e| TrendsError::Network(HttpClient::classify_error(&e).to_string()))?;
    if !response.is_success() {
        return Err(TrendsError::Http(response.status));
    }
    Ok(serde_json::from_str(strip_prefix(&response.text)?)?)
}

fn strip_prefix(text: &str) -> Result<&str, TrendsError> {
    text.find('{')
        .map(|start| &text[start..])
        .ok_or_else(|| TrendsError::Parse("response contains no JSON object".to_string()))
}
