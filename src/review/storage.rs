//! Review storage interface and implementations
//!
//! This module defines the interface for persisting applications, reviewers
//! and review records, with an in-memory implementation.

use crate::error::{Result, ReviewError};
use crate::types::{
    Application, ApplicationId, RatingReview, Reviewer, ReviewerId, Round0Review, ScoredRound,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Trait for review storage operations
///
/// Reviews are unique per `(application, reviewer)` within a round; storing a
/// second review for the same pair replaces the first.
pub trait ReviewStore: Send + Sync {
    /// Get an application by id
    fn get_application(&self, id: &ApplicationId) -> Result<Option<Application>>;

    /// Store or update an application
    fn store_application(&self, application: Application) -> Result<()>;

    /// All applications, including deleted ones, oldest first
    fn get_applications(&self) -> Result<Vec<Application>>;

    /// Get a reviewer by id
    fn get_reviewer(&self, id: &ReviewerId) -> Result<Option<Reviewer>>;

    /// Store or update a reviewer
    fn store_reviewer(&self, reviewer: Reviewer) -> Result<()>;

    /// All reviewers
    fn get_reviewers(&self) -> Result<Vec<Reviewer>>;

    /// Round-0 reviews of one application, in insertion order
    fn round0_reviews(&self, application_id: &ApplicationId) -> Result<Vec<Round0Review>>;

    /// Round-0 reviews by one reviewer
    fn round0_reviews_by(&self, reviewer_id: &ReviewerId) -> Result<Vec<Round0Review>>;

    /// Every round-0 review
    fn all_round0_reviews(&self) -> Result<Vec<Round0Review>>;

    /// Store a round-0 review; returns true when it replaced an earlier one
    fn store_round0_review(&self, review: Round0Review) -> Result<bool>;

    /// Numeric reviews of one application, in insertion order
    fn rating_reviews(
        &self,
        round: ScoredRound,
        application_id: &ApplicationId,
    ) -> Result<Vec<RatingReview>>;

    /// Numeric reviews by one reviewer
    fn rating_reviews_by(
        &self,
        round: ScoredRound,
        reviewer_id: &ReviewerId,
    ) -> Result<Vec<RatingReview>>;

    /// Every numeric review of a round
    fn all_rating_reviews(&self, round: ScoredRound) -> Result<Vec<RatingReview>>;

    /// Store a numeric review; returns true when it replaced an earlier one
    fn store_rating_review(&self, round: ScoredRound, review: RatingReview) -> Result<bool>;
}

/// In-memory review storage implementation
#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    applications: RwLock<HashMap<ApplicationId, Application>>,
    reviewers: RwLock<HashMap<ReviewerId, Reviewer>>,
    round0: RwLock<Vec<Round0Review>>,
    round1: RwLock<Vec<RatingReview>>,
    round2: RwLock<Vec<RatingReview>>,
}

fn read<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| {
        ReviewError::InternalError {
            message: format!("Failed to acquire {} read lock", what),
        }
        .into()
    })
}

fn write<'a, T>(lock: &'a RwLock<T>, what: &str) -> Result<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| {
        ReviewError::InternalError {
            message: format!("Failed to acquire {} write lock", what),
        }
        .into()
    })
}

impl InMemoryReviewStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn rating_lock(&self, round: ScoredRound) -> &RwLock<Vec<RatingReview>> {
        match round {
            ScoredRound::One => &self.round1,
            ScoredRound::Two => &self.round2,
        }
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn get_application(&self, id: &ApplicationId) -> Result<Option<Application>> {
        let applications = read(&self.applications, "applications")?;
        Ok(applications.get(id).cloned())
    }

    fn store_application(&self, application: Application) -> Result<()> {
        let mut applications = write(&self.applications, "applications")?;
        applications.insert(application.id, application);
        Ok(())
    }

    fn get_applications(&self) -> Result<Vec<Application>> {
        let applications = read(&self.applications, "applications")?;
        let mut all: Vec<Application> = applications.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    fn get_reviewer(&self, id: &ReviewerId) -> Result<Option<Reviewer>> {
        let reviewers = read(&self.reviewers, "reviewers")?;
        Ok(reviewers.get(id).cloned())
    }

    fn store_reviewer(&self, reviewer: Reviewer) -> Result<()> {
        let mut reviewers = write(&self.reviewers, "reviewers")?;
        reviewers.insert(reviewer.id.clone(), reviewer);
        Ok(())
    }

    fn get_reviewers(&self) -> Result<Vec<Reviewer>> {
        let reviewers = read(&self.reviewers, "reviewers")?;
        let mut all: Vec<Reviewer> = reviewers.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    fn round0_reviews(&self, application_id: &ApplicationId) -> Result<Vec<Round0Review>> {
        let reviews = read(&self.round0, "round 0 reviews")?;
        Ok(reviews
            .iter()
            .filter(|r| &r.application_id == application_id)
            .cloned()
            .collect())
    }

    fn round0_reviews_by(&self, reviewer_id: &ReviewerId) -> Result<Vec<Round0Review>> {
        let reviews = read(&self.round0, "round 0 reviews")?;
        Ok(reviews
            .iter()
            .filter(|r| &r.reviewer_id == reviewer_id)
            .cloned()
            .collect())
    }

    fn all_round0_reviews(&self) -> Result<Vec<Round0Review>> {
        Ok(read(&self.round0, "round 0 reviews")?.clone())
    }

    fn store_round0_review(&self, review: Round0Review) -> Result<bool> {
        let mut reviews = write(&self.round0, "round 0 reviews")?;
        let existing = reviews.iter_mut().find(|r| {
            r.application_id == review.application_id && r.reviewer_id == review.reviewer_id
        });

        match existing {
            Some(current) => {
                current.decision = review.decision;
                current.updated_at = Utc::now();
                Ok(true)
            }
            None => {
                reviews.push(review);
                Ok(false)
            }
        }
    }

    fn rating_reviews(
        &self,
        round: ScoredRound,
        application_id: &ApplicationId,
    ) -> Result<Vec<RatingReview>> {
        let reviews = read(self.rating_lock(round), "rating reviews")?;
        Ok(reviews
            .iter()
            .filter(|r| &r.application_id == application_id)
            .cloned()
            .collect())
    }

    fn rating_reviews_by(
        &self,
        round: ScoredRound,
        reviewer_id: &ReviewerId,
    ) -> Result<Vec<RatingReview>> {
        let reviews = read(self.rating_lock(round), "rating reviews")?;
        Ok(reviews
            .iter()
            .filter(|r| &r.reviewer_id == reviewer_id)
            .cloned()
            .collect())
    }

    fn all_rating_reviews(&self, round: ScoredRound) -> Result<Vec<RatingReview>> {
        Ok(read(self.rating_lock(round), "rating reviews")?.clone())
    }

    fn store_rating_review(&self, round: ScoredRound, review: RatingReview) -> Result<bool> {
        let mut reviews = write(self.rating_lock(round), "rating reviews")?;
        let existing = reviews.iter_mut().find(|r| {
            r.application_id == review.application_id && r.reviewer_id == review.reviewer_id
        });

        match existing {
            Some(current) => {
                current.rating = review.rating;
                current.comment = review.comment;
                current.updated_at = Utc::now();
                Ok(true)
            }
            None => {
                reviews.push(review);
                Ok(false)
            }
        }
    }
}
