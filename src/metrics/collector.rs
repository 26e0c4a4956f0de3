//! Metrics collection using Prometheus
//!
//! Counters and histograms for daily rating batches and score intake.

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::ComputationStatus;

/// Main metrics collector for the rating engine
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Rating batch metrics
    rating_metrics: RatingMetrics,

    /// Score intake metrics
    submission_metrics: SubmissionMetrics,
}

/// Rating batch metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Daily computations by resulting status
    pub computations_total: IntCounterVec,

    /// Players whose ratings were written by a batch
    pub players_rated_total: IntCounter,

    /// Aborted batches by failure kind
    pub batch_failures_total: IntCounterVec,

    /// Time spent computing and committing one day
    pub batch_duration: Histogram,
}

/// Score intake metrics
#[derive(Clone)]
pub struct SubmissionMetrics {
    /// Submissions by outcome (accepted, duplicate, late, invalid)
    pub submissions_total: IntCounterVec,

    /// Registered players
    pub registrations_total: IntCounter,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let rating_metrics = RatingMetrics::new(&registry)?;
        let submission_metrics = SubmissionMetrics::new(&registry)?;

        Ok(Self {
            registry,
            rating_metrics,
            submission_metrics,
        })
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Get submission metrics
    pub fn submission(&self) -> &SubmissionMetrics {
        &self.submission_metrics
    }

    /// Record the end of a daily computation
    pub fn record_computation(&self, status: &ComputationStatus, duration: Duration) {
        self.rating_metrics
            .computations_total
            .with_label_values(&[status.label()])
            .inc();

        if let ComputationStatus::Computed { players } = status {
            self.rating_metrics
                .players_rated_total
                .inc_by(*players as u64);
        }

        self.rating_metrics
            .batch_duration
            .observe(duration.as_secs_f64());
    }

    /// Record an aborted batch
    pub fn record_batch_failure(&self, kind: &str) {
        self.rating_metrics
            .batch_failures_total
            .with_label_values(&[kind])
            .inc();
    }

    /// Record a submission attempt
    pub fn record_submission(&self, outcome: &str) {
        self.submission_metrics
            .submissions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record a new registration
    pub fn record_registration(&self) {
        self.submission_metrics.registrations_total.inc();
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let computations_total = IntCounterVec::new(
            Opts::new(
                "ranked_wordle_computations_total",
                "Daily rating computations by status",
            ),
            &["status"],
        )?;
        registry.register(Box::new(computations_total.clone()))?;

        let players_rated_total = IntCounter::new(
            "ranked_wordle_players_rated_total",
            "Player ratings written by daily batches",
        )?;
        registry.register(Box::new(players_rated_total.clone()))?;

        let batch_failures_total = IntCounterVec::new(
            Opts::new(
                "ranked_wordle_batch_failures_total",
                "Aborted rating batches",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(batch_failures_total.clone()))?;

        let batch_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ranked_wordle_batch_duration_seconds",
                "Daily rating batch time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(batch_duration.clone()))?;

        Ok(Self {
            computations_total,
            players_rated_total,
            batch_failures_total,
            batch_duration,
        })
    }
}

impl SubmissionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let submissions_total = IntCounterVec::new(
            Opts::new(
                "ranked_wordle_submissions_total",
                "Score submissions by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(submissions_total.clone()))?;

        let registrations_total = IntCounter::new(
            "ranked_wordle_registrations_total",
            "Registered players",
        )?;
        registry.register(Box::new(registrations_total.clone()))?;

        Ok(Self {
            submissions_total,
            registrations_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _rating = collector.rating();
        let _submission = collector.submission();
    }

    #[test]
    fn test_computation_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_computation(
            &ComputationStatus::Computed { players: 3 },
            Duration::from_millis(2),
        );
        collector.record_computation(&ComputationStatus::SkippedEmpty, Duration::from_micros(5));

        let rating = collector.rating();
        assert_eq!(
            rating
                .computations_total
                .with_label_values(&["computed"])
                .get(),
            1
        );
        assert_eq!(
            rating
                .computations_total
                .with_label_values(&["skipped_empty"])
                .get(),
            1
        );
        assert_eq!(rating.players_rated_total.get(), 3);
        assert_eq!(rating.batch_duration.get_sample_count(), 2);
    }

    #[test]
    fn test_failures_and_submissions() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_batch_failure("storage");
        collector.record_submission("accepted");
        collector.record_submission("duplicate");
        collector.record_registration();

        assert_eq!(
            collector
                .rating()
                .batch_failures_total
                .with_label_values(&["storage"])
                .get(),
            1
        );
        assert_eq!(collector.submission().registrations_total.get(), 1);
    }

    #[test]
    fn test_render_exposition() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_submission("accepted");

        let text = collector.render().unwrap();
        assert!(text.contains("ranked_wordle_submissions_total"));
        assert!(text.contains("outcome=\"accepted\""));
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
