//! Error types for the review pipeline
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. The recalculation engine itself never fails; these
//! errors come from the collaborators around it (store, notifier, configuration).

use crate::types::{ApplicationId, ReviewRound, ReviewerId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific review scenarios
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Application not found: {application_id}")]
    ApplicationNotFound { application_id: ApplicationId },

    #[error("Reviewer not found: {reviewer_id}")]
    ReviewerNotFound { reviewer_id: ReviewerId },

    #[error("Reviewer {reviewer_id} is not eligible to review in {round}")]
    ReviewerNotEligible {
        reviewer_id: ReviewerId,
        round: ReviewRound,
    },

    #[error("Invalid rating {value}: must be between 0.1 and 10.0 with one decimal place")]
    InvalidRating { value: f64 },

    #[error("Invalid status: {value}")]
    InvalidStatus { value: String },

    #[error("Notification failed: {message}")]
    NotificationFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Snapshot error: {message}")]
    SnapshotError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
