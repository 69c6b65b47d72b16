//! Trend analytics
//!
//! Sessions against the trend service are built through
//! [`RetryingTrendsClient`], which bounds the attempts and waits a fixed delay
//! between them. A [`TrendsReport`] then reads every requested section over
//! that one session.

mod client;
mod google;
mod models;
mod report;
mod traits;

pub use client::{RetryingTrendsClient, TrendsHandle};
pub use google::GoogleTrends;
pub use models::*;
pub use report::{TrendSections, TrendsReport};
pub use traits::{TrendSession, TrendsBackend};
