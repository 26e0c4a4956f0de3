//! Metrics for the rating engine
//!
//! Prometheus counters for daily batches and score intake, rendered in the
//! text exposition format on request.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, RatingMetrics, SubmissionMetrics};
