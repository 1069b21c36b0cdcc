//! Review service
//!
//! The write paths around the recalculation engine. Every write that touches an
//! application or one of its reviews recalculates the application and stores
//! the result in the same step, so the cached review state never goes stale.
//! Read-recalculate-write cycles are serialized by a single write lock.

use crate::config::AppConfig;
use crate::engine::EligibilityEngine;
use crate::error::{Result, ReviewError};
use crate::metrics::MetricsCollector;
use crate::review::notifier::{ConfirmationNotifier, LoggingNotifier};
use crate::review::stats::ReviewerStats;
use crate::review::storage::ReviewStore;
use crate::types::{
    Application, ApplicationId, ApplicationStatus, Rating, RatingReview, RecalculatedState,
    ReviewRound, Reviewer, ReviewerId, Round0Decision, Round0Review, ScoredRound, StatusChange,
};
use crate::utils::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Outcome of a bulk recalculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecalculationReport {
    /// Applications recalculated and stored
    pub processed: usize,
    /// Applications whose recalculation or store write failed
    pub failed: usize,
    /// Applications whose cached state changed
    pub changed: usize,
    /// Applications newly blacklisted by round-0 votes
    pub auto_blacklisted: usize,
    /// Non-deleted applications waiting in round 0
    pub pending_round0: usize,
    /// Non-deleted applications waiting in round 1
    pub pending_round1: usize,
    /// Non-deleted applications waiting in round 2
    pub pending_round2: usize,
}

impl RecalculationReport {
    fn tally(&mut self, before: RecalculatedState, saved: &Application) {
        let after = saved.state();

        self.processed += 1;
        if before != after {
            self.changed += 1;
        }
        if before.status != ApplicationStatus::Blacklisted
            && after.status == ApplicationStatus::Blacklisted
        {
            self.auto_blacklisted += 1;
        }
        if saved.status != ApplicationStatus::Deleted {
            match after.pending_round() {
                Some(ReviewRound::Zero) => self.pending_round0 += 1,
                Some(ReviewRound::One) => self.pending_round1 += 1,
                Some(ReviewRound::Two) => self.pending_round2 += 1,
                None => {}
            }
        }
    }
}

/// Review workflow around a store, an engine and a notifier
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    engine: EligibilityEngine,
    notifier: Arc<dyn ConfirmationNotifier>,
    metrics: Arc<MetricsCollector>,
    write_lock: Mutex<()>,
    progress_interval: usize,
}

impl ReviewService {
    /// Create a new review service
    pub fn new(
        store: Arc<dyn ReviewStore>,
        engine: EligibilityEngine,
        notifier: Arc<dyn ConfirmationNotifier>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            engine,
            notifier,
            metrics,
            write_lock: Mutex::new(()),
            progress_interval: 20,
        }
    }

    /// Build a service from application configuration
    pub fn from_config(config: &AppConfig, store: Arc<dyn ReviewStore>) -> Result<Self> {
        let engine = EligibilityEngine::new(config.engine.clone())?;
        let notifier = Arc::new(LoggingNotifier::new(config.notifications.clone()));
        let metrics = Arc::new(MetricsCollector::new()?);

        Ok(Self::new(store, engine, notifier, metrics)
            .with_progress_interval(config.service.progress_interval))
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn store(&self) -> Arc<dyn ReviewStore> {
        self.store.clone()
    }

    /// Register or update a reviewer
    pub fn register_reviewer(&self, reviewer: Reviewer) -> Result<()> {
        info!(reviewer_id = %reviewer.id, "Registering reviewer");
        self.store.store_reviewer(reviewer)
    }

    /// Store a new or edited application
    pub fn submit_application(&self, application: Application) -> Result<Application> {
        let _guard = self.lock()?;
        self.save(application)
    }

    /// Re-run recalculation for one application and store the result
    pub fn save_application(&self, application_id: ApplicationId) -> Result<Application> {
        let _guard = self.lock()?;
        let application = self.load_application(application_id)?;
        self.save(application)
    }

    /// Record a round-0 decision, creating or replacing the reviewer's vote
    pub fn record_round0_decision(
        &self,
        reviewer_id: &str,
        application_id: ApplicationId,
        decision: Round0Decision,
    ) -> Result<Application> {
        let _guard = self.lock()?;
        self.check_reviewer(reviewer_id, ReviewRound::Zero)?;
        let application = self.load_application(application_id)?;

        let replaced = self
            .store
            .store_round0_review(Round0Review::new(application_id, reviewer_id, decision))?;
        self.metrics.record_review(ReviewRound::Zero, replaced);

        info!(
            application_id = %application_id,
            reviewer_id,
            ?decision,
            replaced,
            "Recorded round 0 decision"
        );

        self.save(application)
    }

    /// Record a round-1 rating, creating or replacing the reviewer's rating
    pub fn record_round1_rating(
        &self,
        reviewer_id: &str,
        application_id: ApplicationId,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<Application> {
        self.record_rating(ScoredRound::One, reviewer_id, application_id, rating, comment)
    }

    /// Record a round-2 rating, creating or replacing the reviewer's rating
    pub fn record_round2_rating(
        &self,
        reviewer_id: &str,
        application_id: ApplicationId,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<Application> {
        self.record_rating(ScoredRound::Two, reviewer_id, application_id, rating, comment)
    }

    fn record_rating(
        &self,
        round: ScoredRound,
        reviewer_id: &str,
        application_id: ApplicationId,
        rating: Rating,
        comment: Option<String>,
    ) -> Result<Application> {
        let _guard = self.lock()?;
        self.check_reviewer(reviewer_id, round.into())?;
        let application = self.load_application(application_id)?;

        let mut review = RatingReview::new(application_id, reviewer_id, rating);
        review.comment = comment;
        let replaced = self.store.store_rating_review(round, review)?;
        self.metrics.record_review(round.into(), replaced);

        info!(
            application_id = %application_id,
            reviewer_id,
            %round,
            %rating,
            replaced,
            "Recorded rating"
        );

        self.save(application)
    }

    /// Operator status change with audit trail
    pub fn change_status(
        &self,
        application_id: ApplicationId,
        to: ApplicationStatus,
        by: &str,
        ip: Option<String>,
        reason: Option<String>,
    ) -> Result<Application> {
        let _guard = self.lock()?;
        let mut application = self.load_application(application_id)?;

        info!(
            application_id = %application_id,
            from = %application.status,
            %to,
            by,
            "Changing application status"
        );

        application.status = to;
        application.status_change = Some(StatusChange {
            by: by.to_string(),
            reason,
            ip,
            at: current_timestamp(),
        });
        let saved = self.save(application)?;
        self.metrics.record_status_change(to);
        Ok(saved)
    }

    /// Recalculate and store every application, e.g. after thresholds change
    pub fn recalculate_all(&self) -> Result<RecalculationReport> {
        let _guard = self.lock()?;
        let applications = self.store.get_applications()?;
        let total = applications.len();
        let mut report = RecalculationReport::default();

        info!(total, "Starting bulk recalculation");

        for (index, application) in applications.into_iter().enumerate() {
            let application_id = application.id;
            let before = application.state();

            match self.save(application) {
                Ok(saved) => report.tally(before, &saved),
                Err(e) => {
                    error!(
                        application_id = %application_id,
                        "Failed to recalculate application: {:#}",
                        e
                    );
                    report.failed += 1;
                }
            }

            if (index + 1) % self.progress_interval == 0 {
                info!(
                    done = index + 1,
                    total,
                    "Recalculated {:.2}%",
                    (index + 1) as f64 / total as f64 * 100.0
                );
            }
        }

        self.metrics.set_pending(ReviewRound::Zero, report.pending_round0);
        self.metrics.set_pending(ReviewRound::One, report.pending_round1);
        self.metrics.set_pending(ReviewRound::Two, report.pending_round2);

        info!(
            processed = report.processed,
            changed = report.changed,
            auto_blacklisted = report.auto_blacklisted,
            failed = report.failed,
            "Recalculation done"
        );

        Ok(report)
    }

    /// Get one application
    pub fn application(&self, application_id: ApplicationId) -> Result<Application> {
        self.load_application(application_id)
    }

    /// All applications that are not deleted
    pub fn applications(&self) -> Result<Vec<Application>> {
        Ok(self
            .store
            .get_applications()?
            .into_iter()
            .filter(|a| a.status != ApplicationStatus::Deleted)
            .collect())
    }

    /// Applications waiting for round-1 reviews
    pub fn all_round1(&self) -> Result<Vec<Application>> {
        Ok(self
            .applications()?
            .into_iter()
            .filter(|a| a.need_rating1 && !a.need_rating0 && !a.status.is_whitelisted())
            .collect())
    }

    /// Applications admitted to round 2, reviewed or not
    pub fn all_round2(&self) -> Result<Vec<Application>> {
        let threshold = self.engine.config().needed_rating_to_round2;
        Ok(self
            .applications()?
            .into_iter()
            .filter(|a| {
                !a.need_rating1
                    && (a.rating1 >= threshold || a.status == ApplicationStatus::WhitelistRound2)
                    && a.status != ApplicationStatus::WhitelistRound3
            })
            .collect())
    }

    /// Round-0 queue for a reviewer, excluding applications they already voted on
    pub fn unrated_round0(&self, reviewer_id: &str) -> Result<Vec<Application>> {
        let seen: HashSet<ApplicationId> = self
            .store
            .round0_reviews_by(&reviewer_id.to_string())?
            .into_iter()
            .map(|r| r.application_id)
            .collect();

        Ok(unrated(self.applications()?, ReviewRound::Zero, &seen))
    }

    /// Round-1 queue for a reviewer, excluding applications they already rated
    pub fn unrated_round1(&self, reviewer_id: &str) -> Result<Vec<Application>> {
        let seen = self.rated_by(ScoredRound::One, reviewer_id)?;
        Ok(unrated(self.applications()?, ReviewRound::One, &seen))
    }

    /// Round-2 queue for a reviewer, excluding applications they already rated
    pub fn unrated_round2(&self, reviewer_id: &str) -> Result<Vec<Application>> {
        let seen = self.rated_by(ScoredRound::Two, reviewer_id)?;
        Ok(unrated(self.all_round2()?, ReviewRound::Two, &seen))
    }

    /// Oldest application the reviewer can pick up in a round
    pub fn next_for_reviewer(
        &self,
        reviewer_id: &str,
        round: ReviewRound,
    ) -> Result<Option<Application>> {
        let queue = match round {
            ReviewRound::Zero => self.unrated_round0(reviewer_id)?,
            ReviewRound::One => self.unrated_round1(reviewer_id)?,
            ReviewRound::Two => self.unrated_round2(reviewer_id)?,
        };
        Ok(queue.into_iter().next())
    }

    /// Rating statistics for one reviewer
    pub fn reviewer_stats(&self, reviewer_id: &str) -> Result<ReviewerStats> {
        let reviewer_id: ReviewerId = reviewer_id.to_string();
        if self.store.get_reviewer(&reviewer_id)?.is_none() {
            return Err(ReviewError::ReviewerNotFound { reviewer_id }.into());
        }

        let round1 = self.store.rating_reviews_by(ScoredRound::One, &reviewer_id)?;
        let round2 = self.store.rating_reviews_by(ScoredRound::Two, &reviewer_id)?;
        Ok(ReviewerStats::from_reviews(reviewer_id, &round1, &round2))
    }

    fn rated_by(&self, round: ScoredRound, reviewer_id: &str) -> Result<HashSet<ApplicationId>> {
        Ok(self
            .store
            .rating_reviews_by(round, &reviewer_id.to_string())?
            .into_iter()
            .map(|r| r.application_id)
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| {
            ReviewError::InternalError {
                message: "Failed to acquire review write lock".to_string(),
            }
            .into()
        })
    }

    fn load_application(&self, application_id: ApplicationId) -> Result<Application> {
        self.store
            .get_application(&application_id)?
            .ok_or_else(|| ReviewError::ApplicationNotFound { application_id }.into())
    }

    fn check_reviewer(&self, reviewer_id: &str, round: ReviewRound) -> Result<Reviewer> {
        let reviewer_id: ReviewerId = reviewer_id.to_string();
        let reviewer = self
            .store
            .get_reviewer(&reviewer_id)?
            .ok_or_else(|| ReviewError::ReviewerNotFound {
                reviewer_id: reviewer_id.clone(),
            })?;

        if !reviewer.can_review(round) {
            warn!(reviewer_id = %reviewer_id, %round, "Reviewer not eligible for round");
            return Err(ReviewError::ReviewerNotEligible { reviewer_id, round }.into());
        }

        Ok(reviewer)
    }

    /// Recalculate, notify on first save, then store. Caller holds the write lock.
    fn save(&self, mut application: Application) -> Result<Application> {
        let timer = self.metrics.start_timer();

        let round0 = self.store.round0_reviews(&application.id)?;
        let round1 = self.store.rating_reviews(ScoredRound::One, &application.id)?;
        let round2 = self.store.rating_reviews(ScoredRound::Two, &application.id)?;

        let previous_status = application.status;
        let state = self
            .engine
            .recalculate_application(&application, &round0, &round1, &round2);
        application.apply_state(state);

        if application.data_sent_at.is_none() {
            application.data_sent_at = Some(current_timestamp());
            match self.notifier.send_confirmation(&application) {
                Ok(()) => self.metrics.record_notification(true),
                Err(e) => {
                    warn!(
                        application_id = %application.id,
                        "Failed to send confirmation: {}",
                        e
                    );
                    self.metrics.record_notification(false);
                }
            }
        }

        application.updated_at = current_timestamp();
        self.store.store_application(application.clone())?;

        let auto_blacklisted = previous_status != ApplicationStatus::Blacklisted
            && application.status == ApplicationStatus::Blacklisted;
        self.metrics.record_recalculation(timer.stop(), auto_blacklisted);

        debug!(application_id = %application.id, "Application saved");

        Ok(application)
    }
}

fn unrated(
    pool: Vec<Application>,
    round: ReviewRound,
    seen: &HashSet<ApplicationId>,
) -> Vec<Application> {
    pool.into_iter()
        .filter(|a| a.state().needs_review(round) && !seen.contains(&a.id))
        .collect()
}
