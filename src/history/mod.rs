//! Search history persistence
//!
//! Saved searches live in a SQLite database behind [`HistoryStore`]. Settings
//! snapshots are stripped of credentials before they are written, and values
//! that cannot be encoded as JSON are stored as text rather than rejected.

pub mod encode;
mod models;
pub mod sanitize;
mod store;

pub use models::{normalize_country, SearchRecord, DEFAULT_COUNTRY};
pub use store::HistoryStore;
