//! Persisted search record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Country stored when the caller gives none
pub const DEFAULT_COUNTRY: &str = "global";

/// One saved search
///
/// Records are detached copies: they borrow nothing from the store and can be
/// moved freely between tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    /// Assigned by the store, never reused
    pub id: i64,
    pub query: String,
    pub country: String,
    pub timestamp: DateTime<Utc>,
    /// Settings snapshot with every credential removed
    pub settings: Map<String, Value>,
    pub results: Value,
}

/// Country column value for a caller-supplied country
pub fn normalize_country(country: &str) -> String {
    let country = country.trim();
    if country.is_empty() {
        DEFAULT_COUNTRY.to_string()
    } else {
        country.to_string()
    }
}
