//! Search execution and orchestration

use super::models::{SearchResults, Timing};
use crate::cache::{query_cache_key, ResultCache};
use crate::engines::{run_engine, Credentials, EngineRegistry, ProviderResult, RequestParams};
use crate::error::{EngineError, SearchError};
use crate::metrics::Metrics;
use crate::network::HttpClient;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Fans a query out to the selected backends
///
/// Holds no per-request state, so one instance serves any number of
/// concurrent requests.
pub struct SearchOrchestrator {
    /// HTTP client for making requests
    client: HttpClient,
    /// Backend registry
    registry: Arc<EngineRegistry>,
    /// Default per-backend timeout
    default_timeout: Duration,
    /// Upper bound for any per-backend timeout
    max_timeout: Duration,
    /// Results requested from each backend
    max_results: u32,
    cache: Option<ResultCache>,
    metrics: Option<Arc<Metrics>>,
}

struct BackendOutcome {
    name: String,
    outcome: Result<Vec<ProviderResult>, EngineError>,
    elapsed: Duration,
    cached: bool,
}

impl SearchOrchestrator {
    /// Create a new orchestrator
    pub fn new(client: HttpClient, registry: Arc<EngineRegistry>) -> Self {
        Self {
            client,
            registry,
            default_timeout: Duration::from_secs(5),
            max_timeout: Duration::from_secs(30),
            max_results: 5,
            cache: None,
            metrics: None,
        }
    }

    /// Set default timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set maximum timeout
    pub fn with_max_timeout(mut self, timeout: Duration) -> Self {
        self.max_timeout = timeout;
        self
    }

    /// Set the number of results requested from each backend
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Serve repeated queries from a result cache
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Record per-backend metrics
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    /// Search every requested backend concurrently.
    ///
    /// The returned results contain exactly one entry per distinct name in
    /// `backends`. Unknown names, missing credentials, network and parse
    /// failures all yield an empty list for that backend only. An empty
    /// query is the only error.
    pub async fn get_all_results<S: AsRef<str>>(
        &self,
        query: &str,
        backends: &[S],
        credentials: &Credentials,
    ) -> Result<SearchResults, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut seen = HashSet::new();
        let names: Vec<&str> = backends
            .iter()
            .map(|b| b.as_ref())
            .filter(|name| seen.insert(*name))
            .collect();

        info!("Executing search '{}' on {} backends", query, names.len());
        if let Some(ref metrics) = self.metrics {
            metrics.inc_search();
        }

        let params = RequestParams::new(query)
            .with_limit(self.max_results)
            .with_credentials(credentials.clone());

        let futures = names.iter().map(|name| self.search_backend(name, &params));
        let outcomes = join_all(futures).await;

        let mut results = SearchResults::new(query);
        for outcome in outcomes {
            self.record(&outcome);
            if let Ok(ref items) = outcome.outcome {
                results.timings.push(Timing {
                    backend: outcome.name.clone(),
                    time_ms: outcome.elapsed.as_millis() as u64,
                    result_count: items.len(),
                    cached: outcome.cached,
                });
            }
            results.insert(outcome.name, outcome.outcome);
        }

        Ok(results)
    }

    /// Search a single backend, never failing past this point
    async fn search_backend(&self, name: &str, params: &RequestParams) -> BackendOutcome {
        let start = Instant::now();
        let name_owned = name.to_string();

        let engine = match self.registry.get(name) {
            Some(engine) => engine.clone(),
            None => {
                warn!("Unknown search backend: {}", name);
                return BackendOutcome {
                    name: name_owned,
                    outcome: Err(EngineError::UnknownEngine(name.to_string())),
                    elapsed: start.elapsed(),
                    cached: false,
                };
            }
        };

        let cache_key = query_cache_key(name, &params.query, params.limit);
        if let Some(ref cache) = self.cache {
            if let Some(hit) = cache.get(&cache_key).await {
                debug!("Backend {} served from cache", name);
                return BackendOutcome {
                    name: name_owned,
                    outcome: Ok(hit),
                    elapsed: start.elapsed(),
                    cached: true,
                };
            }
        }

        let timeout = Duration::from_secs_f64(
            self.registry
                .get_timeout(name, self.default_timeout.as_secs_f64())
                .min(self.max_timeout.as_secs_f64())
                .max(0.0),
        );

        debug!("Searching backend {} with timeout {:?}", name, timeout);

        let outcome = run_engine(engine.as_ref(), &self.client, params, timeout).await;

        match outcome {
            Ok(ref items) => {
                debug!(
                    "Backend {} returned {} results in {:?}",
                    name,
                    items.len(),
                    start.elapsed()
                );
                if let Some(ref cache) = self.cache {
                    if !items.is_empty() {
                        cache.set(cache_key, items.clone()).await;
                    }
                }
            }
            Err(ref e) if e.is_configuration() => {
                warn!("Configuration error with {}: {}", name, e);
            }
            Err(ref e) => {
                warn!("Request failed for {}: {}", name, e);
            }
        }

        BackendOutcome {
            name: name_owned,
            outcome,
            elapsed: start.elapsed(),
            cached: false,
        }
    }

    fn record(&self, outcome: &BackendOutcome) {
        let Some(ref metrics) = self.metrics else {
            return;
        };
        match outcome.outcome {
            Ok(_) => metrics.record_success(&outcome.name, outcome.elapsed.as_millis() as u64),
            Err(EngineError::UnknownEngine(_)) => {}
            Err(_) => metrics.record_error(&outcome.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engines::{
        bing::Bing, google::Google, Engine, EngineRequest, EngineResponse, BING_API_KEY,
        SEARCH_API_KEY, SEARCH_ENGINE_ID,
    };
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Engine that reads a JSON list of results from `{base}/{name}`
    struct MockEngine {
        name: String,
        base_url: String,
        needs_key: bool,
    }

    #[derive(Deserialize)]
    struct Hit {
        title: String,
        link: String,
    }

    impl Engine for MockEngine {
        fn name(&self) -> &str {
            &self.name
        }

        fn request(&self, params: &RequestParams) -> Result<EngineRequest, EngineError> {
            if self.needs_key {
                params.credentials.require(&self.name, "mock_api_key")?;
            }
            Ok(EngineRequest::get(format!("{}/{}", self.base_url, self.name)))
        }

        fn response(&self, response: EngineResponse) -> Result<Vec<ProviderResult>, EngineError> {
            response.error_for_status()?;
            let hits: Vec<Hit> = response.json()?;
            Ok(hits
                .into_iter()
                .map(|h| ProviderResult::new(h.title, h.link))
                .collect())
        }
    }

    fn hits(prefix: &str, n: usize) -> serde_json::Value {
        json!((1..=n)
            .map(|i| {
                json!({
                    "title": format!("{prefix} {i}"),
                    "link": format!("https://{prefix}.example/{i}"),
                })
            })
            .collect::<Vec<_>>())
    }

    async fn mock_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hits("one", 3)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ok2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hits("two", 2)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/http_fail"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/parse_fail"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(hits("slow", 1))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        server
    }

    fn orchestrator(server: &MockServer) -> SearchOrchestrator {
        let mut registry = EngineRegistry::new();
        for (name, needs_key) in [
            ("ok1", false),
            ("ok2", false),
            ("http_fail", false),
            ("parse_fail", false),
            ("config_fail", true),
            ("slow", false),
        ] {
            let config = EngineConfig {
                timeout: (name == "slow").then_some(0.3),
                ..Default::default()
            };
            registry.register(
                Arc::new(MockEngine {
                    name: name.to_string(),
                    base_url: server.uri(),
                    needs_key,
                }),
                config,
            );
        }
        SearchOrchestrator::new(HttpClient::new().unwrap(), Arc::new(registry))
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let search =
            SearchOrchestrator::new(HttpClient::new().unwrap(), Arc::new(EngineRegistry::new()));

        let err = search
            .get_all_results("   ", &["Google"], &Credentials::new())
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::EmptyQuery);
    }

    #[tokio::test]
    async fn test_every_requested_name_has_an_entry() {
        let server = mock_server().await;
        let search = orchestrator(&server);

        let requested = vec!["ok1", "unknown", "http_fail", "config_fail", "ok1", "parse_fail"];
        let results = search
            .get_all_results("rust", &requested, &Credentials::new())
            .await
            .unwrap();

        let expected: HashSet<&str> = requested.iter().copied().collect();
        let actual: HashSet<&str> = results.results.keys().map(|k| k.as_str()).collect();
        assert_eq!(actual, expected);

        assert_eq!(results.get("ok1").unwrap().len(), 3);
        assert!(matches!(results.failure("unknown"), Some(EngineError::UnknownEngine(_))));
        assert_eq!(results.failure("http_fail"), Some(&EngineError::Http(500)));
        assert!(matches!(results.failure("parse_fail"), Some(EngineError::Parse(_))));
        assert!(results.failure("config_fail").unwrap().is_configuration());
    }

    #[tokio::test]
    async fn test_fault_isolation_for_all_pairs() {
        let server = mock_server().await;
        let search = orchestrator(&server);
        let names = ["ok1", "ok2", "http_fail", "parse_fail", "config_fail", "unknown"];

        let mut baseline = HashMap::new();
        for name in names {
            let alone = search
                .get_all_results("rust", &[name], &Credentials::new())
                .await
                .unwrap();
            baseline.insert(
                name,
                (alone.get(name).unwrap().to_vec(), alone.failure(name).cloned()),
            );
        }

        for a in names {
            for b in names {
                if a == b {
                    continue;
                }
                let both = search
                    .get_all_results("rust", &[a, b], &Credentials::new())
                    .await
                    .unwrap();
                let observed = (both.get(b).unwrap().to_vec(), both.failure(b).cloned());
                assert_eq!(observed, baseline[b], "{a} changed the outcome of {b}");
            }
        }
    }

    #[tokio::test]
    async fn test_slow_backend_does_not_block_others() {
        let server = mock_server().await;
        let search = orchestrator(&server);

        let start = Instant::now();
        let results = search
            .get_all_results("rust", &["slow", "ok2"], &Credentials::new())
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_secs(4));
        assert_eq!(results.failure("slow"), Some(&EngineError::Timeout));
        assert_eq!(results.get("ok2").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_order_within_backend_is_preserved() {
        let server = mock_server().await;
        let search = orchestrator(&server);

        let results = search
            .get_all_results("rust", &["ok1"], &Credentials::new())
            .await
            .unwrap();
        let titles: Vec<&str> = results
            .get("ok1")
            .unwrap()
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["one 1", "one 2", "one 3"]);
    }

    #[tokio::test]
    async fn test_limit_truncates_results() {
        let server = mock_server().await;
        let search = orchestrator(&server).with_max_results(2);

        let results = search
            .get_all_results("rust", &["ok1"], &Credentials::new())
            .await
            .unwrap();
        assert_eq!(results.get("ok1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_weather_scenario() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customsearch/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"title": "Weather today", "link": "https://w1.example"},
                    {"title": "Radar", "link": "https://w2.example"},
                    {"title": "Forecast", "link": "https://w3.example"}
                ]
            })))
            .mount(&server)
            .await;

        let mut registry = EngineRegistry::new();
        registry.register_as(
            "Alpha",
            Arc::new(Google::new().with_base_url(format!("{}/customsearch/v1", server.uri()))),
            EngineConfig::default(),
        );
        registry.register_as(
            "Beta",
            Arc::new(Bing::new().with_base_url(format!("{}/bing", server.uri()))),
            EngineConfig::default(),
        );
        let search = SearchOrchestrator::new(HttpClient::new().unwrap(), Arc::new(registry));

        let credentials = Credentials::new()
            .with(SEARCH_API_KEY, "key")
            .with(SEARCH_ENGINE_ID, "cx");
        let results = search
            .get_all_results("weather", &["Alpha", "Beta"], &credentials)
            .await
            .unwrap();

        assert_eq!(
            results.failure("Beta"),
            Some(&EngineError::MissingCredential {
                engine: "Bing".to_string(),
                key: BING_API_KEY,
            })
        );
        let map = results.into_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["Alpha"].len(), 3);
        assert!(map["Beta"].is_empty());
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_queries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(hits("one", 3)))
            .expect(1)
            .mount(&server)
            .await;

        let search = orchestrator(&server).with_cache(ResultCache::new(60, 10));
        let first = search.get_all_results("rust", &["ok1"], &Credentials::new()).await.unwrap();
        let second = search.get_all_results("rust", &["ok1"], &Credentials::new()).await.unwrap();

        assert_eq!(first.get("ok1"), second.get("ok1"));
        assert!(second.timings[0].cached);
    }

    #[tokio::test]
    async fn test_metrics_are_recorded() {
        let server = mock_server().await;
        let metrics = Arc::new(Metrics::new());
        let search = orchestrator(&server).with_metrics(metrics.clone());

        search
            .get_all_results("rust", &["ok1", "http_fail", "unknown"], &Credentials::new())
            .await
            .unwrap();

        let stats = metrics.get_engine_stats();
        assert_eq!(metrics.get_total_searches(), 1);
        assert_eq!(stats["ok1"].reliability, 100.0);
        assert_eq!(stats["http_fail"].reliability, 0.0);
        assert!(!stats.contains_key("unknown"));
    }
}
