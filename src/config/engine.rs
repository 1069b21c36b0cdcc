//! Recalculation engine configuration
//!
//! The thresholds that drive round gating. Values are supplied once, validated,
//! and then passed explicitly into every recalculation.

use crate::error::{Result, ReviewError};
use serde::{Deserialize, Serialize};
use std::env;

/// Thresholds for the eligibility and rating engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Round-0 "yes" votes needed to clear round 0
    pub yeses_needed: u32,
    /// Round-0 "no" votes that blacklist the application
    pub nos_needed: u32,
    /// Target number of round-1 reviews
    pub max_reviews_round_one: u32,
    /// Target number of round-2 reviews
    pub max_reviews_round_two: u32,
    /// A single round-1 review at or below this mean is final
    pub rating_r1_low_threshold: f64,
    /// Minimum mean round-1 rating to reach round 2
    pub needed_rating_to_round2: f64,
    /// Lower bound of the band where two reviews may disagree
    pub needed_rating_for_third_review_round1: f64,
    /// Disagreement above which a third round-1 review is requested
    pub needed_difference_for_third_review_round1: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            yeses_needed: 1,
            nos_needed: 2,
            max_reviews_round_one: 2,
            max_reviews_round_two: 2,
            rating_r1_low_threshold: 5.0,
            needed_rating_to_round2: 7.5,
            needed_rating_for_third_review_round1: 5.0,
            needed_difference_for_third_review_round1: 2.0,
        }
    }
}

impl EngineConfig {
    /// Load from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment variables named after the constants
    pub fn apply_env(&mut self) -> Result<()> {
        read_env("YESES_NEEDED", &mut self.yeses_needed)?;
        read_env("NOS_NEEDED", &mut self.nos_needed)?;
        read_env("MAX_REVIEWS_ROUND_ONE", &mut self.max_reviews_round_one)?;
        read_env("MAX_REVIEWS_ROUND_TWO", &mut self.max_reviews_round_two)?;
        read_env("RATING_R1_LOW_THRESHOLD", &mut self.rating_r1_low_threshold)?;
        read_env("NEEDED_RATING_TO_ROUND2", &mut self.needed_rating_to_round2)?;
        read_env(
            "NEEDED_RATING_FOR_THIRD_REVIEW_ROUND1",
            &mut self.needed_rating_for_third_review_round1,
        )?;
        read_env(
            "NEEDED_DIFFERENCE_FOR_THIRD_REVIEW_ROUND1",
            &mut self.needed_difference_for_third_review_round1,
        )?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.yeses_needed == 0 {
            return Err(config_error("yeses_needed must be at least 1"));
        }
        if self.nos_needed == 0 {
            return Err(config_error("nos_needed must be at least 1"));
        }
        if self.max_reviews_round_one == 0 || self.max_reviews_round_two == 0 {
            return Err(config_error("max reviews per round must be at least 1"));
        }

        for (name, value) in [
            ("rating_r1_low_threshold", self.rating_r1_low_threshold),
            ("needed_rating_to_round2", self.needed_rating_to_round2),
            (
                "needed_rating_for_third_review_round1",
                self.needed_rating_for_third_review_round1,
            ),
        ] {
            if !(0.0..=10.0).contains(&value) {
                return Err(config_error(&format!(
                    "{} must be between 0 and 10, got {}",
                    name, value
                )));
            }
        }

        if !self.needed_difference_for_third_review_round1.is_finite()
            || self.needed_difference_for_third_review_round1 < 0.0
        {
            return Err(config_error(
                "needed_difference_for_third_review_round1 must be non-negative",
            ));
        }

        if self.needed_rating_for_third_review_round1 > self.needed_rating_to_round2 {
            return Err(config_error(
                "needed_rating_for_third_review_round1 must not exceed needed_rating_to_round2",
            ));
        }

        Ok(())
    }
}

pub(crate) fn config_error(message: &str) -> anyhow::Error {
    ReviewError::ConfigurationError {
        message: message.to_string(),
    }
    .into()
}

pub(crate) fn read_env<T: std::str::FromStr>(name: &str, target: &mut T) -> Result<()> {
    if let Ok(raw) = env::var(name) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| config_error(&format!("Invalid {} value: {}", name, raw)))?;
    }
    Ok(())
}
