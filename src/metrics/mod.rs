//! Metrics for the review pipeline
//!
//! Prometheus counters and gauges describing recalculation and review activity.

pub mod collector;

pub use collector::{EngineMetrics, MetricsCollector, MetricsTimer, ReviewMetrics};
