//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handlers::search))
        .route(
            "/history",
            get(handlers::history).delete(handlers::clear_history),
        )
        .route(
            "/history/:id",
            get(handlers::history_entry).delete(handlers::delete_entry),
        )
        .route("/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::engines::{
        Engine, EngineRegistry, EngineRequest, EngineResponse, ProviderResult, RequestParams,
    };
    use crate::error::{EngineError, TrendsError};
    use crate::history::HistoryStore;
    use crate::network::HttpClient;
    use crate::trends::{
        RegionInterest, RelatedLists, RetryingTrendsClient, TimeSeries, TrendQuery, TrendSession,
        TrendsBackend,
    };
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    /// Engine that fails before touching the network
    struct Offline;

    impl Engine for Offline {
        fn name(&self) -> &str {
            "Offline"
        }

        fn request(&self, _params: &RequestParams) -> Result<EngineRequest, EngineError> {
            Err(EngineError::Network("offline".to_string()))
        }

        fn response(&self, _response: EngineResponse) -> Result<Vec<ProviderResult>, EngineError> {
            Ok(Vec::new())
        }
    }

    /// Trend backend whose regional breakdown is rate limited
    struct NoGeo;

    #[async_trait]
    impl TrendsBackend for NoGeo {
        fn name(&self) -> &str {
            "no-geo"
        }

        async fn build_session(
            &self,
            _query: &TrendQuery,
        ) -> Result<Arc<dyn TrendSession>, TrendsError> {
            Ok(Arc::new(NoGeo))
        }
    }

    #[async_trait]
    impl TrendSession for NoGeo {
        async fn interest_over_time(&self) -> Result<TimeSeries, TrendsError> {
            let mut series = TimeSeries::default();
            series.push("2024-01-01", 40);
            series.push("2024-01-08", 100);
            Ok(series)
        }

        async fn interest_by_region(&self) -> Result<Vec<RegionInterest>, TrendsError> {
            Err(TrendsError::Http(429))
        }

        async fn related_topics(&self) -> Result<RelatedLists, TrendsError> {
            Ok(RelatedLists::default())
        }

        async fn related_queries(&self) -> Result<RelatedLists, TrendsError> {
            Ok(RelatedLists::default())
        }
    }

    async fn state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.history.database_url =
            format!("sqlite://{}", dir.path().join("web.db").display());
        settings.trends.enabled = false;

        let history = HistoryStore::connect(&settings.history).await.unwrap();
        let mut registry = EngineRegistry::new();
        registry.register(Arc::new(Offline), Default::default());

        let state = AppState::new(settings, registry, HttpClient::new().unwrap(), history);
        (state, dir)
    }

    async fn app() -> (Router, TempDir) {
        let (state, dir) = state().await;
        (create_router(state), dir)
    }

    async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = app().await;
        let (status, body) = call(&app, "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_empty_query_is_bad_request() {
        let (app, _dir) = app().await;
        let (status, _) = call(&app, "GET", "/search?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_saves_and_reports_notices() {
        let (app, _dir) = app().await;
        let (status, body) =
            call(&app, "GET", "/search?q=weather&backends=Offline,Nope&country=").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"]["Offline"], serde_json::json!([]));
        assert_eq!(body["results"]["Nope"], serde_json::json!([]));
        assert_eq!(body["notices"]["Nope"]["kind"], "configuration");
        assert_eq!(body["notices"]["Offline"]["kind"], "provider_request");

        let id = body["id"].as_i64().unwrap();
        let (status, record) = call(&app, "GET", &format!("/history/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["query"], "weather");
        assert_eq!(record["country"], "global");
        assert!(record["settings"].get("search_api_key").is_none());
    }

    #[tokio::test]
    async fn test_history_routes() {
        let (app, _dir) = app().await;
        call(&app, "GET", "/search?q=one&backends=Offline").await;
        call(&app, "GET", "/search?q=two&backends=Offline").await;
        call(&app, "GET", "/search?q=unsaved&backends=Offline&save=false").await;

        let (_, recent) = call(&app, "GET", "/history?limit=5").await;
        let queries: Vec<&str> = recent
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["query"].as_str().unwrap())
            .collect();
        assert_eq!(queries, vec!["two", "one"]);

        let (status, _) = call(&app, "GET", "/history/abc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = recent[0]["id"].as_i64().unwrap();
        let (_, body) = call(&app, "DELETE", &format!("/history/{id}")).await;
        assert_eq!(body["deleted"], true);
        let (_, body) = call(&app, "DELETE", &format!("/history/{id}")).await;
        assert_eq!(body["deleted"], false);

        let (_, body) = call(&app, "DELETE", "/history").await;
        assert_eq!(body["cleared"], 1);
    }

    #[tokio::test]
    async fn test_trends_disabled_is_reported() {
        let (app, _dir) = app().await;
        let (status, body) =
            call(&app, "GET", "/search?q=weather&backends=Offline&trends=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["trends_error"].is_string());
        assert!(body.get("trends").is_none());
    }

    #[tokio::test]
    async fn test_partial_trends_are_saved() {
        let (mut state, _dir) = state().await;
        state.trends = Some(RetryingTrendsClient::new(Arc::new(NoGeo)).with_delay(Duration::ZERO));
        let app = create_router(state);

        let (status, body) =
            call(&app, "GET", "/search?q=weather&backends=Offline&trends=true").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["trends_error"].is_null());
        assert_eq!(body["trends"]["interest_over_time"]["values"], serde_json::json!([40, 100]));

        let id = body["id"].as_i64().unwrap();
        let (status, record) = call(&app, "GET", &format!("/history/{id}")).await;
        assert_eq!(status, StatusCode::OK);

        let trends = &record["results"]["trends"];
        assert_eq!(trends["interest_over_time"]["values"], serde_json::json!([40, 100]));
        assert!(trends["related_topics"].is_object());
        assert!(trends.get("interest_by_region").is_none());
        assert!(trends["errors"]["interest_by_region"]
            .as_str()
            .unwrap()
            .contains("429"));
        assert_eq!(record["results"]["Offline"], serde_json::json!([]));
    }
}
