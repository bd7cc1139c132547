//! Metrics Module
//!
//! Process-wide request counters for the prediction pipeline.
//!
//! ## Structure
//! - `collector.rs` - `MetricsCollector` (lock-guarded counters) and `MetricsSnapshot`

pub mod collector;

pub use collector::{MetricsCollector, MetricsSnapshot};
