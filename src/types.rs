//! Common types used throughout the review pipeline

use crate::error::ReviewError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for applications
pub type ApplicationId = Uuid;

/// Unique identifier for reviewers
pub type ReviewerId = String;

/// Administrative status of an application.
///
/// The serialized names match the values stored by the application store;
/// the longer `whitelist_round*` spellings are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "blacklisted")]
    Blacklisted,
    #[serde(rename = "whitelist2", alias = "whitelist_round2")]
    WhitelistRound2,
    #[serde(rename = "whitelist3", alias = "whitelist_round3")]
    WhitelistRound3,
    #[serde(rename = "deleted")]
    Deleted,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Regular,
        ApplicationStatus::Blacklisted,
        ApplicationStatus::WhitelistRound2,
        ApplicationStatus::WhitelistRound3,
        ApplicationStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Regular => "regular",
            ApplicationStatus::Blacklisted => "blacklisted",
            ApplicationStatus::WhitelistRound2 => "whitelist2",
            ApplicationStatus::WhitelistRound3 => "whitelist3",
            ApplicationStatus::Deleted => "deleted",
        }
    }

    pub fn is_whitelisted(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::WhitelistRound2 | ApplicationStatus::WhitelistRound3
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" => Ok(ApplicationStatus::Regular),
            "blacklisted" => Ok(ApplicationStatus::Blacklisted),
            "whitelist2" | "whitelist_round2" => Ok(ApplicationStatus::WhitelistRound2),
            "whitelist3" | "whitelist_round3" => Ok(ApplicationStatus::WhitelistRound3),
            "deleted" => Ok(ApplicationStatus::Deleted),
            other => Err(ReviewError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

/// Sequential review stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewRound {
    Zero,
    One,
    Two,
}

impl std::fmt::Display for ReviewRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewRound::Zero => write!(f, "round 0"),
            ReviewRound::One => write!(f, "round 1"),
            ReviewRound::Two => write!(f, "round 2"),
        }
    }
}

/// A round scored with numeric ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoredRound {
    One,
    Two,
}

impl From<ScoredRound> for ReviewRound {
    fn from(round: ScoredRound) -> Self {
        match round {
            ScoredRound::One => ReviewRound::One,
            ScoredRound::Two => ReviewRound::Two,
        }
    }
}

impl std::fmt::Display for ScoredRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ReviewRound::from(*self))
    }
}

/// Round-0 gate vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Round0Decision {
    Yes,
    No,
    Review,
}

/// A reviewer score between 0.1 and 10.0 with one decimal place.
///
/// Stored as integer tenths so equality and ordering are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(u8);

impl Rating {
    pub const MIN_TENTHS: u8 = 1;
    pub const MAX_TENTHS: u8 = 100;

    /// Validate and build a rating from a decimal value
    pub fn new(value: f64) -> Result<Self, ReviewError> {
        if !value.is_finite() {
            return Err(ReviewError::InvalidRating { value });
        }

        let scaled = value * 10.0;
        let tenths = scaled.round();
        if (scaled - tenths).abs() > 1e-6
            || tenths < f64::from(Self::MIN_TENTHS)
            || tenths > f64::from(Self::MAX_TENTHS)
        {
            return Err(ReviewError::InvalidRating { value });
        }

        Ok(Self(tenths as u8))
    }

    pub fn tenths(&self) -> u8 {
        self.0
    }

    pub fn value(&self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = ReviewError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.value()
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.value())
    }
}

/// A person allowed to review applications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub id: ReviewerId,
    pub nick: String,
    pub email: String,
    #[serde(default)]
    pub is_round_0_reviewer: bool,
    #[serde(default = "default_true")]
    pub is_round_1_reviewer: bool,
    #[serde(default)]
    pub is_round_2_reviewer: bool,
    #[serde(default)]
    pub organizer: bool,
    #[serde(default)]
    pub disabled_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Reviewer {
    /// New reviewer with the default role set (round 1 only)
    pub fn new(id: impl Into<ReviewerId>, nick: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nick: nick.into(),
            email: email.into(),
            is_round_0_reviewer: false,
            is_round_1_reviewer: true,
            is_round_2_reviewer: false,
            organizer: false,
            disabled_at: None,
        }
    }

    pub fn with_rounds(mut self, round0: bool, round1: bool, round2: bool) -> Self {
        self.is_round_0_reviewer = round0;
        self.is_round_1_reviewer = round1;
        self.is_round_2_reviewer = round2;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }

    /// Whether this reviewer may submit reviews in the given round
    pub fn can_review(&self, round: ReviewRound) -> bool {
        if self.is_disabled() {
            return false;
        }
        match round {
            ReviewRound::Zero => self.is_round_0_reviewer,
            ReviewRound::One => self.is_round_1_reviewer,
            ReviewRound::Two => self.is_round_2_reviewer,
        }
    }
}

/// Round-0 review record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round0Review {
    pub application_id: ApplicationId,
    pub reviewer_id: ReviewerId,
    pub decision: Round0Decision,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Round0Review {
    pub fn new(
        application_id: ApplicationId,
        reviewer_id: impl Into<ReviewerId>,
        decision: Round0Decision,
    ) -> Self {
        let now = Utc::now();
        Self {
            application_id,
            reviewer_id: reviewer_id.into(),
            decision,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Numeric review record, shared by rounds 1 and 2
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingReview {
    pub application_id: ApplicationId,
    pub reviewer_id: ReviewerId,
    pub rating: Rating,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RatingReview {
    pub fn new(
        application_id: ApplicationId,
        reviewer_id: impl Into<ReviewerId>,
        rating: Rating,
    ) -> Self {
        let now = Utc::now();
        Self {
            application_id,
            reviewer_id: reviewer_id.into(),
            rating,
            comment: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

pub type Round1Review = RatingReview;
pub type Round2Review = RatingReview;

/// Audit record of the last operator status change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub by: ReviewerId,
    pub reason: Option<String>,
    pub ip: Option<String>,
    pub at: DateTime<Utc>,
}

/// Derived state produced by the recalculation engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecalculatedState {
    pub status: ApplicationStatus,
    pub rating1: f64,
    pub rating2: f64,
    pub need_rating0: bool,
    pub need_rating1: bool,
    pub need_rating2: bool,
}

impl RecalculatedState {
    /// The round still waiting for reviews, if any
    pub fn pending_round(&self) -> Option<ReviewRound> {
        if self.need_rating0 {
            Some(ReviewRound::Zero)
        } else if self.need_rating1 {
            Some(ReviewRound::One)
        } else if self.need_rating2 {
            Some(ReviewRound::Two)
        } else {
            None
        }
    }

    pub fn needs_review(&self, round: ReviewRound) -> bool {
        match round {
            ReviewRound::Zero => self.need_rating0,
            ReviewRound::One => self.need_rating1,
            ReviewRound::Two => self.need_rating2,
        }
    }
}

/// A submitted application with its cached review state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub rating1: f64,
    #[serde(default)]
    pub rating2: f64,
    #[serde(default = "default_true")]
    pub need_rating0: bool,
    #[serde(default = "default_true")]
    pub need_rating1: bool,
    #[serde(default = "default_true")]
    pub need_rating2: bool,
    #[serde(default)]
    pub status_change: Option<StatusChange>,
    #[serde(default)]
    pub data_sent_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::utils::generate_application_id(),
            full_name: full_name.into(),
            email: email.into(),
            status: ApplicationStatus::Regular,
            rating1: 0.0,
            rating2: 0.0,
            need_rating0: true,
            need_rating1: true,
            need_rating2: true,
            status_change: None,
            data_sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Current cached state as last written by the engine
    pub fn state(&self) -> RecalculatedState {
        RecalculatedState {
            status: self.status,
            rating1: self.rating1,
            rating2: self.rating2,
            need_rating0: self.need_rating0,
            need_rating1: self.need_rating1,
            need_rating2: self.need_rating2,
        }
    }

    /// Overwrite the cached state with a fresh engine result
    pub fn apply_state(&mut self, state: RecalculatedState) {
        self.status = state.status;
        self.rating1 = state.rating1;
        self.rating2 = state.rating2;
        self.need_rating0 = state.need_rating0;
        self.need_rating1 = state.need_rating1;
        self.need_rating2 = state.need_rating2;
    }

    pub fn rating1_display(&self) -> f64 {
        crate::utils::round_to_tenth(self.rating1)
    }

    pub fn rating2_display(&self) -> f64 {
        crate::utils::round_to_tenth(self.rating2)
    }
}
