//! Retrying acquisition of trend-service sessions

use super::models::TrendQuery;
use super::traits::{TrendSession, TrendsBackend};
use crate::config::TrendsSettings;
use crate::error::TrendsError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// A working session plus how many attempts it took to build
#[derive(Clone)]
pub struct TrendsHandle {
    pub session: Arc<dyn TrendSession>,
    pub query: TrendQuery,
    pub attempts: u32,
}

impl std::fmt::Debug for TrendsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrendsHandle")
            .field("query", &self.query)
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// Builds trend sessions with a bounded number of attempts and a fixed delay
#[derive(Clone)]
pub struct RetryingTrendsClient {
    backend: Arc<dyn TrendsBackend>,
    retries: u32,
    delay: Duration,
}

impl RetryingTrendsClient {
    pub fn new(backend: Arc<dyn TrendsBackend>) -> Self {
        Self {
            backend,
            retries: 3,
            delay: Duration::from_secs(2),
        }
    }

    /// Create a client with the retry bounds from settings
    pub fn from_settings(backend: Arc<dyn TrendsBackend>, settings: &TrendsSettings) -> Self {
        Self::new(backend)
            .with_retries(settings.retries)
            .with_delay(Duration::from_secs_f64(settings.retry_delay.max(0.0)))
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Acquire a session with the configured bounds
    pub async fn acquire(
        &self,
        query: &str,
        timeframe: &str,
        region: &str,
    ) -> Result<TrendsHandle, TrendsError> {
        self.acquire_with(query, timeframe, region, self.retries, self.delay)
            .await
    }

    /// Acquire a session, trying at most `retries` times (at least once) and
    /// sleeping `delay` between attempts
    pub async fn acquire_with(
        &self,
        query: &str,
        timeframe: &str,
        region: &str,
        retries: u32,
        delay: Duration,
    ) -> Result<TrendsHandle, TrendsError> {
        let max_attempts = retries.max(1);
        let request = TrendQuery::new(query, timeframe, region);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                sleep(delay).await;
            }

            match self.backend.build_session(&request).await {
                Ok(session) => {
                    info!(
                        backend = self.backend.name(),
                        attempt,
                        max_attempts,
                        "trends.session.ready"
                    );
                    return Ok(TrendsHandle {
                        session,
                        query: request,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    if attempt < max_attempts {
                        warn!(
                            backend = self.backend.name(),
                            attempt,
                            max_attempts,
                            backoff_ms = delay.as_millis() as u64,
                            error = %err,
                            "trends.session.retrying"
                        );
                    }
                    last_error = Some(err);
                }
            }
        }

        let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
        error!(
            backend = self.backend.name(),
            attempts = max_attempts,
            error = %last_error,
            "trends.session.exhausted"
        );
        Err(TrendsError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}
