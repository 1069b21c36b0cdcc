//! Review Pipeline - eligibility and rating engine for multi-round application review
//!
//! This crate derives, from an application's reviewer decisions, whether each of
//! the three review rounds still needs work, the aggregate round scores, and the
//! automatic status transitions, together with the store and service that keep
//! that derived state current.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod review;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, ReviewError};
pub use types::*;

// Re-export key components
pub use config::{AppConfig, EngineConfig};
pub use engine::{recalculate, EligibilityEngine};
pub use review::{InMemoryReviewStore, ReviewService, ReviewStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
