//! JSON snapshots of the review database
//!
//! Used by the command line tool to load an export, recalculate it and write it
//! back out.

use crate::error::{Result, ReviewError};
use crate::review::storage::ReviewStore;
use crate::types::{
    Application, ApplicationId, Reviewer, Round0Review, Round1Review, Round2Review, ScoredRound,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Everything needed to recalculate a set of applications
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSnapshot {
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub round0_reviews: Vec<Round0Review>,
    #[serde(default)]
    pub round1_reviews: Vec<Round1Review>,
    #[serde(default)]
    pub round2_reviews: Vec<Round2Review>,
}

impl ReviewSnapshot {
    /// Read a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            ReviewError::SnapshotError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Write the snapshot as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(())
    }

    /// Check that every review points at an application in the snapshot
    pub fn validate(&self) -> Result<()> {
        let known: HashSet<ApplicationId> = self.applications.iter().map(|a| a.id).collect();

        let orphan = self
            .round0_reviews
            .iter()
            .map(|r| r.application_id)
            .chain(self.round1_reviews.iter().map(|r| r.application_id))
            .chain(self.round2_reviews.iter().map(|r| r.application_id))
            .find(|id| !known.contains(id));

        if let Some(application_id) = orphan {
            return Err(ReviewError::SnapshotError {
                message: format!("review references unknown application {}", application_id),
            }
            .into());
        }

        let rounds = [
            (
                "round 0",
                self.round0_reviews
                    .iter()
                    .map(|r| (r.application_id, r.reviewer_id.as_str()))
                    .collect::<Vec<_>>(),
            ),
            (
                "round 1",
                self.round1_reviews
                    .iter()
                    .map(|r| (r.application_id, r.reviewer_id.as_str()))
                    .collect(),
            ),
            (
                "round 2",
                self.round2_reviews
                    .iter()
                    .map(|r| (r.application_id, r.reviewer_id.as_str()))
                    .collect(),
            ),
        ];

        // Loading upserts by pair, so a duplicate would silently drop a review.
        for (round, pairs) in rounds {
            let mut seen = HashSet::new();
            if let Some((application_id, reviewer_id)) =
                pairs.into_iter().find(|pair| !seen.insert(*pair))
            {
                return Err(ReviewError::SnapshotError {
                    message: format!(
                        "duplicate {} review by {} for application {}",
                        round, reviewer_id, application_id
                    ),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Load the snapshot into a store without recalculating
    pub fn load_into(&self, store: &dyn ReviewStore) -> Result<()> {
        self.validate()?;

        for reviewer in &self.reviewers {
            store.store_reviewer(reviewer.clone())?;
        }
        for application in &self.applications {
            store.store_application(application.clone())?;
        }
        for review in &self.round0_reviews {
            store.store_round0_review(review.clone())?;
        }
        for review in &self.round1_reviews {
            store.store_rating_review(ScoredRound::One, review.clone())?;
        }
        for review in &self.round2_reviews {
            store.store_rating_review(ScoredRound::Two, review.clone())?;
        }

        info!(
            reviewers = self.reviewers.len(),
            applications = self.applications.len(),
            reviews = self.round0_reviews.len() + self.round1_reviews.len() + self.round2_reviews.len(),
            "Loaded snapshot"
        );
        Ok(())
    }

    /// Export the full contents of a store
    pub fn from_store(store: &dyn ReviewStore) -> Result<Self> {
        Ok(Self {
            reviewers: store.get_reviewers()?,
            applications: store.get_applications()?,
            round0_reviews: store.all_round0_reviews()?,
            round1_reviews: store.all_rating_reviews(ScoredRound::One)?,
            round2_reviews: store.all_rating_reviews(ScoredRound::Two)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::storage::InMemoryReviewStore;
    use crate::types::{Rating, Round0Decision};

    #[test]
    fn test_minimal_json_uses_defaults() {
        let id = uuid::Uuid::new_v4();
        let raw = format!(
            r#"{{
                "applications": [{{"id": "{id}", "full_name": "Ada", "email": "ada@example.org"}}],
                "round1_reviews": [{{"application_id": "{id}", "reviewer_id": "alice", "rating": 7.5}}]
            }}"#
        );

        let snapshot = ReviewSnapshot::from_json(&raw).unwrap();
        assert_eq!(snapshot.applications.len(), 1);
        assert!(snapshot.applications[0].need_rating0);
        assert!(snapshot.applications[0].data_sent_at.is_none());
        assert_eq!(snapshot.round1_reviews[0].rating, Rating::new(7.5).unwrap());
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_invalid_rating_rejected() {
        let id = uuid::Uuid::new_v4();
        let raw = format!(
            r#"{{"round1_reviews": [{{"application_id": "{id}", "reviewer_id": "alice", "rating": 12.0}}]}}"#
        );
        assert!(ReviewSnapshot::from_json(&raw).is_err());
    }

    #[test]
    fn test_orphan_review_rejected() {
        let snapshot = ReviewSnapshot {
            round0_reviews: vec![Round0Review::new(
                uuid::Uuid::new_v4(),
                "alice",
                Round0Decision::Yes,
            )],
            ..ReviewSnapshot::default()
        };
        let store = InMemoryReviewStore::new();
        assert!(snapshot.load_into(&store).is_err());
    }

    #[test]
    fn test_duplicate_review_pair_rejected() {
        let app = Application::new("Ada Lovelace", "ada@example.org");
        let snapshot = ReviewSnapshot {
            round1_reviews: vec![
                Round1Review::new(app.id, "alice", Rating::new(4.0).unwrap()),
                Round1Review::new(app.id, "bob", Rating::new(6.0).unwrap()),
                Round1Review::new(app.id, "alice", Rating::new(9.0).unwrap()),
            ],
            applications: vec![app],
            ..ReviewSnapshot::default()
        };

        let err = snapshot.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::SnapshotError { .. })
        ));
        assert!(err.to_string().contains("round 1"));

        let store = InMemoryReviewStore::new();
        assert!(snapshot.load_into(&store).is_err());
        assert!(store.all_rating_reviews(ScoredRound::One).unwrap().is_empty());
    }

    #[test]
    fn test_same_reviewer_in_different_rounds_allowed() {
        let app = Application::new("Ada Lovelace", "ada@example.org");
        let snapshot = ReviewSnapshot {
            round0_reviews: vec![Round0Review::new(app.id, "alice", Round0Decision::Yes)],
            round1_reviews: vec![Round1Review::new(app.id, "alice", Rating::new(8.0).unwrap())],
            round2_reviews: vec![Round2Review::new(app.id, "alice", Rating::new(7.0).unwrap())],
            applications: vec![app],
            ..ReviewSnapshot::default()
        };
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_store_round_trip() {
        let app = Application::new("Ada Lovelace", "ada@example.org");
        let snapshot = ReviewSnapshot {
            reviewers: vec![Reviewer::new("alice", "Alice", "alice@example.org")],
            round1_reviews: vec![Round1Review::new(app.id, "alice", Rating::new(6.0).unwrap())],
            applications: vec![app],
            ..ReviewSnapshot::default()
        };

        let store = InMemoryReviewStore::new();
        snapshot.load_into(&store).unwrap();

        let exported = ReviewSnapshot::from_store(&store).unwrap();
        assert_eq!(exported.applications.len(), 1);
        assert_eq!(exported.reviewers.len(), 1);
        assert_eq!(exported.round1_reviews.len(), 1);
        assert!(exported.round2_reviews.is_empty());
    }
}
