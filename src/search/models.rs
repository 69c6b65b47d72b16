//! Combined search result types

use crate::engines::ProviderResult;
use crate::error::{EngineError, ErrorKind};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Time spent on one backend
#[derive(Debug, Clone, Serialize)]
pub struct Timing {
    pub backend: String,
    pub time_ms: u64,
    pub result_count: usize,
    pub cached: bool,
}

/// Outcome of one orchestrated search
///
/// `results` holds exactly one entry per distinct requested backend name;
/// a backend that failed maps to an empty list and has its error recorded in
/// `failures`.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub query: String,
    pub results: BTreeMap<String, Vec<ProviderResult>>,
    pub failures: BTreeMap<String, EngineError>,
    pub timings: Vec<Timing>,
}

impl SearchResults {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Record a backend's outcome
    pub fn insert(&mut self, backend: String, outcome: Result<Vec<ProviderResult>, EngineError>) {
        match outcome {
            Ok(results) => {
                self.failures.remove(&backend);
                self.results.insert(backend, results);
            }
            Err(err) => {
                self.results.insert(backend.clone(), Vec::new());
                self.failures.insert(backend, err);
            }
        }
    }

    /// Results for one backend
    pub fn get(&self, backend: &str) -> Option<&[ProviderResult]> {
        self.results.get(backend).map(|r| r.as_slice())
    }

    /// Error recorded for one backend
    pub fn failure(&self, backend: &str) -> Option<&EngineError> {
        self.failures.get(backend)
    }

    /// Whether every backend came back empty
    pub fn is_empty(&self) -> bool {
        self.results.values().all(|r| r.is_empty())
    }

    /// Total results over all backends
    pub fn result_count(&self) -> usize {
        self.results.values().map(|r| r.len()).sum()
    }

    /// One user-facing message per failed backend
    pub fn notices(&self) -> BTreeMap<String, Notice> {
        self.failures
            .iter()
            .map(|(backend, err)| {
                let notice = Notice {
                    kind: err.kind(),
                    message: err.to_string(),
                };
                (backend.clone(), notice)
            })
            .collect()
    }

    /// Flat list of titles, in backend-name order then backend order
    pub fn titles(&self) -> Vec<String> {
        self.results
            .values()
            .flat_map(|r| r.iter().map(|item| item.title.clone()))
            .collect()
    }

    /// Plain mapping from backend name to results
    pub fn into_map(self) -> HashMap<String, Vec<ProviderResult>> {
        self.results.into_iter().collect()
    }
}

/// Inline notice for a backend that returned nothing because it failed
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}
