//! Trend service traits

use super::models::{RegionInterest, RelatedLists, TimeSeries, TrendQuery};
use crate::error::TrendsError;
use async_trait::async_trait;
use std::sync::Arc;

/// Builds trend-service sessions
///
/// A session is built for one query and is only returned once it is able to
/// answer reads. Building may fail transiently (rate limits, cookie
/// handshake) which is why callers go through
/// [`RetryingTrendsClient`](super::RetryingTrendsClient).
#[async_trait]
pub trait TrendsBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    async fn build_session(
        &self,
        query: &TrendQuery,
    ) -> Result<Arc<dyn TrendSession>, TrendsError>;
}

/// A working session, reused for every read of one logical request
#[async_trait]
pub trait TrendSession: Send + Sync {
    async fn interest_over_time(&self) -> Result<TimeSeries, TrendsError>;

    async fn interest_by_region(&self) -> Result<Vec<RegionInterest>, TrendsError>;

    async fn related_topics(&self) -> Result<RelatedLists, TrendsError>;

    async fn related_queries(&self) -> Result<RelatedLists, TrendsError>;
}
