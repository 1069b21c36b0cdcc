//! Metrics collection using Prometheus
//!
//! Counters and gauges for recalculations, review submissions, operator status
//! changes and confirmation notifications.

use crate::types::{ApplicationStatus, ReviewRound};
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the review pipeline
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Engine metrics
    engine_metrics: EngineMetrics,

    /// Review workflow metrics
    review_metrics: ReviewMetrics,
}

/// Recalculation engine metrics
#[derive(Clone)]
pub struct EngineMetrics {
    /// Total recalculations performed
    pub recalculations_total: IntCounter,

    /// Applications blacklisted by round-0 votes
    pub auto_blacklists_total: IntCounter,

    /// Time spent in one read-recalculate-write cycle
    pub recalculation_duration: Histogram,

    /// Applications waiting for review, by round
    pub pending_reviews: IntGaugeVec,
}

/// Review workflow metrics
#[derive(Clone)]
pub struct ReviewMetrics {
    /// Reviews recorded, by round and whether they replaced an earlier one
    pub reviews_recorded_total: IntCounterVec,

    /// Operator status changes, by target status
    pub status_changes_total: IntCounterVec,

    /// Confirmation notifications, by outcome
    pub notifications_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let engine_metrics = EngineMetrics::new(&registry)?;
        let review_metrics = ReviewMetrics::new(&registry)?;

        Ok(Self {
            registry,
            engine_metrics,
            review_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get engine metrics
    pub fn engine(&self) -> &EngineMetrics {
        &self.engine_metrics
    }

    /// Get review metrics
    pub fn review(&self) -> &ReviewMetrics {
        &self.review_metrics
    }

    /// Record one recalculation
    pub fn record_recalculation(&self, duration: Duration, auto_blacklisted: bool) {
        self.engine_metrics.recalculations_total.inc();
        if auto_blacklisted {
            self.engine_metrics.auto_blacklists_total.inc();
        }
        self.engine_metrics
            .recalculation_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a review submission
    pub fn record_review(&self, round: ReviewRound, replaced: bool) {
        let kind = if replaced { "updated" } else { "created" };
        self.review_metrics
            .reviews_recorded_total
            .with_label_values(&[round_label(round), kind])
            .inc();
    }

    /// Record an operator status change
    pub fn record_status_change(&self, status: ApplicationStatus) {
        self.review_metrics
            .status_changes_total
            .with_label_values(&[status.as_str()])
            .inc();
    }

    /// Record a confirmation notification attempt
    pub fn record_notification(&self, success: bool) {
        let outcome = if success { "sent" } else { "failed" };
        self.review_metrics
            .notifications_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Set the number of applications waiting in a round
    pub fn set_pending(&self, round: ReviewRound, count: usize) {
        self.engine_metrics
            .pending_reviews
            .with_label_values(&[round_label(round)])
            .set(count as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

fn round_label(round: ReviewRound) -> &'static str {
    match round {
        ReviewRound::Zero => "round0",
        ReviewRound::One => "round1",
        ReviewRound::Two => "round2",
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

impl EngineMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let recalculations_total = IntCounter::new(
            "review_pipeline_recalculations_total",
            "Total application recalculations",
        )?;
        registry.register(Box::new(recalculations_total.clone()))?;

        let auto_blacklists_total = IntCounter::new(
            "review_pipeline_auto_blacklists_total",
            "Applications blacklisted by round-0 votes",
        )?;
        registry.register(Box::new(auto_blacklists_total.clone()))?;

        let recalculation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "review_pipeline_recalculation_duration_seconds",
                "Duration of a read-recalculate-write cycle",
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0]),
        )?;
        registry.register(Box::new(recalculation_duration.clone()))?;

        let pending_reviews = IntGaugeVec::new(
            Opts::new(
                "review_pipeline_pending_reviews",
                "Applications waiting for review",
            ),
            &["round"],
        )?;
        registry.register(Box::new(pending_reviews.clone()))?;

        Ok(Self {
            recalculations_total,
            auto_blacklists_total,
            recalculation_duration,
            pending_reviews,
        })
    }
}

impl ReviewMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let reviews_recorded_total = IntCounterVec::new(
            Opts::new(
                "review_pipeline_reviews_recorded_total",
                "Reviews recorded",
            ),
            &["round", "kind"],
        )?;
        registry.register(Box::new(reviews_recorded_total.clone()))?;

        let status_changes_total = IntCounterVec::new(
            Opts::new(
                "review_pipeline_status_changes_total",
                "Operator status changes",
            ),
            &["status"],
        )?;
        registry.register(Box::new(status_changes_total.clone()))?;

        let notifications_total = IntCounterVec::new(
            Opts::new(
                "review_pipeline_notifications_total",
                "Confirmation notifications",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            reviews_recorded_total,
            status_changes_total,
            notifications_total,
        })
    }
}
