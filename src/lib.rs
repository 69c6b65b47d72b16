//! Trendscope: multi-backend web search with trend analytics
//!
//! A query is fanned out to several search backends at once; each backend's
//! failure stays local to that backend. Trend analytics for the same query
//! come from a retrying trend-service client, and every search can be saved
//! to a SQLite history with credentials stripped from its settings.

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod history;
pub mod metrics;
pub mod network;
pub mod search;
pub mod trends;
pub mod web;

pub use config::Settings;
pub use engines::{Credentials, Engine, ProviderResult};
pub use history::{HistoryStore, SearchRecord};
pub use search::{SearchOrchestrator, SearchResults};
pub use trends::{RetryingTrendsClient, TrendsReport};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
