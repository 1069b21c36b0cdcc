//! Review workflow around the recalculation engine
//!
//! This module provides storage interfaces, the review service that keeps
//! cached application state in step with reviews, confirmation notifications,
//! reviewer statistics and JSON snapshots.

pub mod notifier;
pub mod service;
pub mod snapshot;
pub mod stats;
pub mod storage;

// Re-export commonly used types
pub use notifier::{ConfirmationNotifier, LoggingNotifier, NoOpNotifier};
pub use service::{RecalculationReport, ReviewService};
pub use snapshot::ReviewSnapshot;
pub use stats::ReviewerStats;
pub use storage::{InMemoryReviewStore, ReviewStore};
