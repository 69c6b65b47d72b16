//! Application state shared across handlers

use crate::cache::ResultCache;
use crate::config::Settings;
use crate::engines::EngineRegistry;
use crate::history::HistoryStore;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::search::SearchOrchestrator;
use crate::trends::{GoogleTrends, RetryingTrendsClient};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search orchestrator
    pub search: Arc<SearchOrchestrator>,
    /// Trend client, absent when trends are disabled
    pub trends: Option<RetryingTrendsClient>,
    /// Saved searches
    pub history: HistoryStore,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        settings: Settings,
        registry: EngineRegistry,
        client: HttpClient,
        history: HistoryStore,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let cache = ResultCache::new(settings.search.cache_ttl, settings.search.cache_capacity);

        let mut search = SearchOrchestrator::new(client.clone(), Arc::new(registry))
            .with_timeout(Duration::from_secs_f64(settings.outgoing.request_timeout))
            .with_max_timeout(Duration::from_secs_f64(settings.outgoing.max_request_timeout))
            .with_max_results(settings.search.max_results)
            .with_cache(cache);
        if settings.general.enable_metrics {
            search = search.with_metrics(metrics.clone());
        }

        let trends = settings.trends.enabled.then(|| {
            let backend = GoogleTrends::from_settings(client, &settings.trends);
            RetryingTrendsClient::from_settings(Arc::new(backend), &settings.trends)
        });

        Self {
            settings: Arc::new(settings),
            search: Arc::new(search),
            trends,
            history,
            metrics,
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
