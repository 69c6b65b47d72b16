//! HTTP request handlers

use super::state::AppState;
use crate::engines::ProviderResult;
use crate::error::{HistoryError, SearchError};
use crate::history::{encode::to_portable, SearchRecord};
use crate::search::{Notice, Timing};
use crate::trends::{TrendSections, TrendsReport};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Query parameters for search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Backends (comma-separated)
    pub backends: Option<String>,
    pub country: Option<String>,
    pub timeframe: Option<String>,
    /// Collect trend analytics
    pub trends: Option<bool>,
    /// Save to history (default true)
    pub save: Option<bool>,
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// History id, when the search was saved
    pub id: Option<i64>,
    pub query: String,
    pub country: String,
    pub results: BTreeMap<String, Vec<ProviderResult>>,
    pub notices: BTreeMap<String, Notice>,
    pub timings: Vec<Timing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<TrendsReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends_error: Option<String>,
}

/// JSON error with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: "search not found".to_string(),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        error!(error = %err, "web.history_error");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "history storage failed".to_string(),
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let settings = &state.settings;

    let query = match params.q {
        Some(ref q) if !q.trim().is_empty() => q.trim().to_string(),
        _ => return Err(ApiError::bad_request("missing query parameter `q`")),
    };

    let backends: Vec<String> = match params.backends {
        Some(ref list) => list
            .split(',')
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect(),
        None => settings.search.default_backends.clone(),
    };
    let country = params
        .country
        .clone()
        .unwrap_or_else(|| settings.search.default_country.clone());
    let timeframe = params
        .timeframe
        .clone()
        .unwrap_or_else(|| settings.trends.default_timeframe.clone());

    let credentials = settings.credentials.to_credentials();
    let results = state
        .search
        .get_all_results(&query, &backends, &credentials)
        .await?;
    info!(
        query = %query,
        backends = backends.len(),
        results = results.result_count(),
        "web.search"
    );

    let mut id = None;
    if params.save.unwrap_or(true) {
        let snapshot = settings.snapshot(&country, &timeframe, &backends);
        match state
            .history
            .add_search(&query, &country, &results.results, snapshot)
            .await
        {
            Ok(record) => id = Some(record.id),
            Err(err) => error!(error = %err, "web.search.save_failed"),
        }
    }

    let mut trends = None;
    let mut trends_error = None;
    let wants_trends = params
        .trends
        .unwrap_or(settings.trends.enabled && settings.trends.show_trends);
    if wants_trends {
        match state.trends {
            Some(ref client) => match client.acquire(&query, &timeframe, &country).await {
                Ok(handle) => {
                    let report = TrendsReport::collect(
                        &handle,
                        TrendSections::from_settings(&settings.trends),
                    )
                    .await;
                    if let Some(id) = id {
                        let mut partial = Map::new();
                        partial.insert("trends".to_string(), to_portable(&report));
                        if let Err(err) = state.history.update_results(id, &partial).await {
                            error!(id, error = %err, "web.search.trends_save_failed");
                        }
                    }
                    trends = Some(report);
                }
                Err(err) => {
                    warn!(query = %query, error = %err, "web.search.trends_unavailable");
                    trends_error = Some(err.to_string());
                }
            },
            None => trends_error = Some("trend analytics are disabled".to_string()),
        }
    }

    Ok(Json(SearchResponse {
        id,
        query,
        country,
        notices: results.notices(),
        timings: results.timings,
        results: results.results,
        trends,
        trends_error,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

/// Recent searches
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<SearchRecord>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(state.settings.history.default_limit);
    Ok(Json(state.history.get_recent(limit).await?))
}

/// One saved search
pub async fn history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SearchRecord>, ApiError> {
    state
        .history
        .get_by_raw_id(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = match id.trim().parse::<i64>() {
        Ok(id) => state.history.delete(id).await?,
        Err(_) => false,
    };
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn clear_history(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let cleared = state.history.clear().await?;
    Ok(Json(json!({ "cleared": cleared })))
}

/// Backend statistics
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let saved = state.history.count().await?;
    Ok(Json(json!({
        "instance_name": state.instance_name(),
        "backends": state.search.registry().names(),
        "total_searches": state.metrics.get_total_searches(),
        "engines": state.metrics.get_engine_stats(),
        "saved_searches": saved,
    })))
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
