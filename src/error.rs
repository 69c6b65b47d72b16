//! Error taxonomy shared by the search, trends and history layers

use serde::Serialize;
use thiserror::Error;

/// Broad class of an engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or unusable configuration for a selected backend
    Configuration,
    /// Network, HTTP or parse failure at one backend
    ProviderRequest,
}

/// Failure of a single backend call
///
/// These never cross the orchestrator boundary as hard failures: they are
/// converted into an empty result list plus a notice for that backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("{engine} requires the `{key}` credential")]
    MissingCredential { engine: String, key: &'static str },

    #[error("unknown search backend: {0}")]
    UnknownEngine(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential { .. } | Self::UnknownEngine(_) => ErrorKind::Configuration,
            Self::Timeout | Self::Http(_) | Self::Network(_) | Self::Parse(_) => {
                ErrorKind::ProviderRequest
            }
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Invalid top-level input to the orchestrator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search query cannot be empty")]
    EmptyQuery,
}

/// Trend service failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrendsError {
    #[error("trend service network error: {0}")]
    Network(String),

    #[error("trend service returned HTTP {0}")]
    Http(u16),

    #[error("malformed trend service payload: {0}")]
    Parse(String),

    #[error("trend service did not provide the {0} widget")]
    MissingWidget(&'static str),

    #[error("trend service unavailable after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl From<serde_json::Error> for TrendsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// A value that could not be encoded to JSON
///
/// Only ever logged; the store recovers with a string rendering.
#[derive(Debug, Clone, Error)]
#[error("value is not JSON-serializable: {0}")]
pub struct SerializationError(pub String);

/// Storage failures of the history store
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to prepare schema: {0}")]
    Migration(String),
}
