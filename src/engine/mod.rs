//! Eligibility and rating recalculation engine
//!
//! This module holds the pure decision logic that turns an application's status
//! and accumulated reviews into aggregate scores, per-round "needs review"
//! flags, and automatic status transitions.

pub mod overrides;
pub mod recalculate;

pub use overrides::{override_for, StatusOverride};
pub use recalculate::recalculate;

use crate::config::EngineConfig;
use crate::types::{
    Application, ApplicationStatus, Rating, RatingReview, RecalculatedState, Round0Decision,
    Round0Review,
};
use tracing::{debug, info};

/// Engine bound to one validated configuration
#[derive(Debug, Clone)]
pub struct EligibilityEngine {
    config: EngineConfig,
}

impl EligibilityEngine {
    /// Create a new engine, validating its thresholds
    pub fn new(config: EngineConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recalculate from raw decisions and ratings
    pub fn recalculate(
        &self,
        status: ApplicationStatus,
        round0: &[Round0Decision],
        round1: &[Rating],
        round2: &[Rating],
    ) -> RecalculatedState {
        recalculate(status, round0, round1, round2, &self.config)
    }

    /// Recalculate an application from its stored review records
    pub fn recalculate_application(
        &self,
        application: &Application,
        round0: &[Round0Review],
        round1: &[RatingReview],
        round2: &[RatingReview],
    ) -> RecalculatedState {
        let decisions: Vec<Round0Decision> = round0.iter().map(|r| r.decision).collect();
        let ratings1: Vec<Rating> = round1.iter().map(|r| r.rating).collect();
        let ratings2: Vec<Rating> = round2.iter().map(|r| r.rating).collect();

        let state = self.recalculate(application.status, &decisions, &ratings1, &ratings2);

        if state.status != application.status {
            info!(
                application_id = %application.id,
                from = %application.status,
                to = %state.status,
                "Round 0 votes changed application status"
            );
        }

        debug!(
            application_id = %application.id,
            rating1 = state.rating1,
            rating2 = state.rating2,
            need_rating0 = state.need_rating0,
            need_rating1 = state.need_rating1,
            need_rating2 = state.need_rating2,
            "Recalculated application"
        );

        state
    }
}

impl Default for EligibilityEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = EngineConfig {
            yeses_needed: 0,
            ..EngineConfig::default()
        };
        assert!(EligibilityEngine::new(config).is_err());
    }

    #[test]
    fn test_recalculate_application_uses_review_records() {
        let engine = EligibilityEngine::default();
        let app = Application::new("Grace Hopper", "grace@example.org");

        let round0 = vec![Round0Review::new(app.id, "r0", Round0Decision::Yes)];
        let round1 = vec![
            RatingReview::new(app.id, "a", Rating::new(5.0).unwrap()),
            RatingReview::new(app.id, "b", Rating::new(9.0).unwrap()),
        ];

        let state = engine.recalculate_application(&app, &round0, &round1, &[]);
        assert_eq!(state.rating1, 7.0);
        assert!(state.need_rating1);
        assert!(!state.need_rating2);
    }

    #[test]
    fn test_recalculate_application_reports_auto_blacklist() {
        let engine = EligibilityEngine::default();
        let app = Application::new("Grace Hopper", "grace@example.org");
        let round0 = vec![
            Round0Review::new(app.id, "r0", Round0Decision::No),
            Round0Review::new(app.id, "r1", Round0Decision::No),
        ];

        let state = engine.recalculate_application(&app, &round0, &[], &[]);
        assert_eq!(state.status, ApplicationStatus::Blacklisted);
    }
}
