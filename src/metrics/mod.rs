//! Metrics collection module
//!
//! Tracks per-backend search counts, response times and error rates.

use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Response times kept per backend
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct BackendCounters {
    searches: u64,
    successes: u64,
    errors: u64,
    response_times: VecDeque<u64>,
}

/// Metrics collector, shared by reference between request handlers
#[derive(Debug, Default)]
pub struct Metrics {
    total_searches: AtomicU64,
    backends: RwLock<HashMap<String, BackendCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer leaves counters usable, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, BackendCounters>> {
        self.backends.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, BackendCounters>> {
        self.backends.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful backend call and its duration
    pub fn record_success(&self, backend: &str, time_ms: u64) {
        let mut backends = self.write();
        let counters = backends.entry(backend.to_string()).or_default();
        counters.searches += 1;
        counters.successes += 1;
        if counters.response_times.len() >= RESPONSE_WINDOW {
            counters.response_times.pop_front();
        }
        counters.response_times.push_back(time_ms);
    }

    /// Record a failed backend call
    pub fn record_error(&self, backend: &str) {
        let mut backends = self.write();
        let counters = backends.entry(backend.to_string()).or_default();
        counters.searches += 1;
        counters.errors += 1;
    }

    /// Get total searches
    pub fn get_total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Get average response time for a backend
    pub fn get_avg_response_time(&self, backend: &str) -> Option<u64> {
        let backends = self.read();
        backends.get(backend).and_then(|c| {
            if c.response_times.is_empty() {
                None
            } else {
                Some(c.response_times.iter().sum::<u64>() / c.response_times.len() as u64)
            }
        })
    }

    /// Get reliability percentage for a backend
    pub fn get_reliability(&self, backend: &str) -> f64 {
        let backends = self.read();
        match backends.get(backend) {
            Some(c) if c.searches > 0 => (c.successes as f64 / c.searches as f64) * 100.0,
            _ => 100.0,
        }
    }

    /// Get all backend statistics
    pub fn get_engine_stats(&self) -> HashMap<String, EngineStats> {
        let names: Vec<String> = self.read().keys().cloned().collect();

        names
            .into_iter()
            .map(|name| {
                let searches = self.read().get(&name).map(|c| c.searches).unwrap_or(0);
                let stats = EngineStats {
                    searches,
                    avg_response_time: self.get_avg_response_time(&name),
                    reliability: self.get_reliability(&name),
                };
                (name, stats)
            })
            .collect()
    }
}

/// Statistics for a single backend
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub searches: u64,
    pub avg_response_time: Option<u64>,
    pub reliability: f64,
}
