//! Collected trend analytics for one query

use super::client::TrendsHandle;
use super::models::{RegionInterest, RelatedLists, TimeSeries};
use crate::config::TrendsSettings;
use crate::error::TrendsError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::warn;

/// Which parts of a report to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendSections {
    pub trends: bool,
    pub geo: bool,
    pub topics: bool,
    pub queries: bool,
}

impl TrendSections {
    pub fn all() -> Self {
        Self {
            trends: true,
            geo: true,
            topics: true,
            queries: true,
        }
    }

    pub fn from_settings(settings: &TrendsSettings) -> Self {
        Self {
            trends: settings.show_trends,
            geo: settings.show_geo,
            topics: settings.show_topics,
            queries: true,
        }
    }
}

/// Everything the trend service returned for one query
///
/// Sections that failed are absent and have their error message recorded in
/// `errors`, keyed by section name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendsReport {
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_over_time: Option<TimeSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_by_region: Option<Vec<RegionInterest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_topics: Option<RelatedLists>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_queries: Option<RelatedLists>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

impl TrendsReport {
    /// Fetch the requested sections concurrently over one session
    pub async fn collect(handle: &TrendsHandle, sections: TrendSections) -> Self {
        let session = &handle.session;
        let (trends, geo, topics, queries) = tokio::join!(
            section(sections.trends, session.interest_over_time()),
            section(sections.geo, session.interest_by_region()),
            section(sections.topics, session.related_topics()),
            section(sections.queries, session.related_queries()),
        );

        let mut report = TrendsReport {
            attempts: handle.attempts,
            ..Default::default()
        };
        report.interest_over_time = report.keep("interest_over_time", trends);
        report.interest_by_region = report.keep("interest_by_region", geo);
        report.related_topics = report.keep("related_topics", topics);
        report.related_queries = report.keep("related_queries", queries);
        report
    }

    fn keep<T>(&mut self, name: &str, outcome: Option<Result<T, TrendsError>>) -> Option<T> {
        match outcome? {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(section = name, error = %err, "trends.section.failed");
                self.errors.insert(name.to_string(), err.to_string());
                None
            }
        }
    }

    /// Whether no section produced data
    pub fn is_empty(&self) -> bool {
        self.interest_over_time.is_none()
            && self.interest_by_region.is_none()
            && self.related_topics.is_none()
            && self.related_queries.is_none()
    }

    /// Top related queries, the follow-up searches worth suggesting
    pub fn related_searches(&self) -> Vec<String> {
        self.related_queries
            .as_ref()
            .map(|lists| lists.top_titles())
            .unwrap_or_default()
    }
}

async fn section<T>(
    wanted: bool,
    fetch: impl Future<Output = Result<T, TrendsError>>,
) -> Option<Result<T, TrendsError>> {
    if wanted {
        Some(fetch.await)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::models::{RelatedEntry, TrendQuery};
    use crate::trends::traits::TrendSession;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct HalfBrokenSession;

    #[async_trait]
    impl TrendSession for HalfBrokenSession {
        async fn interest_over_time(&self) -> Result<TimeSeries, TrendsError> {
            let mut series = TimeSeries::default();
            series.push("Jan 2024", 80);
            Ok(series)
        }

        async fn interest_by_region(&self) -> Result<Vec<RegionInterest>, TrendsError> {
            Err(TrendsError::Http(429))
        }

        async fn related_topics(&self) -> Result<RelatedLists, TrendsError> {
            Err(TrendsError::MissingWidget("RELATED_TOPICS"))
        }

        async fn related_queries(&self) -> Result<RelatedLists, TrendsError> {
            Ok(RelatedLists {
                top: vec![RelatedEntry {
                    title: "rust book".to_string(),
                    kind: None,
                    value: 100,
                    formatted_value: "100".to_string(),
                }],
                rising: Vec::new(),
            })
        }
    }

    fn handle() -> TrendsHandle {
        TrendsHandle {
            session: Arc::new(HalfBrokenSession),
            query: TrendQuery::new("rust", "today 5-y", "ES"),
            attempts: 2,
        }
    }

    #[tokio::test]
    async fn test_partial_success_is_kept() {
        let report = TrendsReport::collect(&handle(), TrendSections::all()).await;

        assert_eq!(report.attempts, 2);
        assert_eq!(report.interest_over_time.as_ref().unwrap().values, vec![80]);
        assert!(report.interest_by_region.is_none());
        assert!(report.related_topics.is_none());
        assert_eq!(report.related_searches(), vec!["rust book"]);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors["interest_by_region"].contains("429"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("interest_by_region").is_none());
        assert!(json["errors"].get("related_topics").is_some());
    }

    #[tokio::test]
    async fn test_disabled_sections_are_not_fetched() {
        let sections = TrendSections {
            trends: true,
            geo: false,
            topics: false,
            queries: false,
        };
        let report = TrendsReport::collect(&handle(), sections).await;

        assert!(report.interest_over_time.is_some());
        assert!(report.errors.is_empty());
        assert!(!report.is_empty());
    }
}
