//! Per-reviewer rating statistics

use crate::types::{RatingReview, ReviewerId};
use crate::utils::{mean, standard_deviation};
use serde::{Deserialize, Serialize};

/// Mean and spread of the ratings a reviewer has given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerStats {
    pub reviewer_id: ReviewerId,
    pub round1_count: usize,
    pub round1_mean: f64,
    pub round1_std_dev: f64,
    pub round2_count: usize,
    pub round2_mean: f64,
    pub round2_std_dev: f64,
}

impl ReviewerStats {
    pub fn from_reviews(
        reviewer_id: ReviewerId,
        round1: &[RatingReview],
        round2: &[RatingReview],
    ) -> Self {
        let values1: Vec<f64> = round1.iter().map(|r| r.rating.value()).collect();
        let values2: Vec<f64> = round2.iter().map(|r| r.rating.value()).collect();

        Self {
            reviewer_id,
            round1_count: values1.len(),
            round1_mean: mean(&values1),
            round1_std_dev: standard_deviation(&values1),
            round2_count: values2.len(),
            round2_mean: mean(&values2),
            round2_std_dev: standard_deviation(&values2),
        }
    }
}
