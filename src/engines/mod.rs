//! Search engine module
//!
//! Defines the Engine trait, the three built-in backends and a registry that
//! maps backend names to engine instances.

mod loader;
mod registry;
mod traits;

// Engine implementations
pub mod bing;
pub mod duckduckgo;
pub mod google;

pub use loader::EngineLoader;
pub use registry::EngineRegistry;
pub use traits::*;

use crate::error::EngineError;
use crate::network::HttpClient;
use std::time::Duration;
use tracing::warn;

/// Run one search against one engine.
///
/// This is the adapter boundary: configuration, network and parse failures
/// all come back as an [`EngineError`] value, never as a panic. Results keep
/// the backend's order and are cut to `params.limit`.
pub async fn run_engine(
    engine: &dyn Engine,
    client: &HttpClient,
    params: &RequestParams,
    timeout: Duration,
) -> Result<Vec<ProviderResult>, EngineError> {
    let request = engine.request(params).map_err(|e| {
        warn!(engine = engine.name(), error = %e, "engine.request.invalid");
        e
    })?;

    let execution = client.execute_with_timeout(request, timeout);
    let response = match tokio::time::timeout(timeout, execution).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(HttpClient::classify_error(&e)),
        Err(_) => return Err(EngineError::Timeout),
    };

    let mut results = engine.response(response)?;
    results.truncate(params.limit as usize);
    Ok(results)
}
