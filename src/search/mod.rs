//! Search orchestration module
//!
//! Fans a query out to the selected backends concurrently and assembles one
//! result list per backend, isolating each backend's failures.

mod executor;
mod models;

pub use executor::SearchOrchestrator;
pub use models::*;
