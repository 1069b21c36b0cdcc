//! Status override policy
//!
//! Operator statuses are applied after the base calculation and win over it.
//! Every status maps to exactly one override through [`override_for`], so adding
//! a status without deciding its policy fails to compile.

use crate::config::EngineConfig;
use crate::types::{ApplicationStatus, RecalculatedState};

/// Signature shared by all status overrides.
///
/// `round2_reviews` is the number of round-2 reviews on the application.
pub type StatusOverride = fn(&mut RecalculatedState, usize, &EngineConfig);

/// Dispatch table from status to its override
pub fn override_for(status: ApplicationStatus) -> StatusOverride {
    match status {
        ApplicationStatus::Regular => keep_calculated,
        ApplicationStatus::Deleted => keep_calculated,
        ApplicationStatus::Blacklisted => freeze_blacklisted,
        ApplicationStatus::WhitelistRound2 => open_round_two,
        ApplicationStatus::WhitelistRound3 => close_all_rounds,
    }
}

fn keep_calculated(_state: &mut RecalculatedState, _round2_reviews: usize, _config: &EngineConfig) {}

fn freeze_blacklisted(state: &mut RecalculatedState, _round2_reviews: usize, _config: &EngineConfig) {
    state.rating1 = 0.0;
    state.rating2 = 0.0;
    state.need_rating0 = false;
    state.need_rating1 = false;
    state.need_rating2 = false;
}

// Round 2 still stops at its review cap; whitelisting only skips rounds 0 and 1.
fn open_round_two(state: &mut RecalculatedState, round2_reviews: usize, config: &EngineConfig) {
    state.need_rating0 = false;
    state.need_rating1 = false;
    state.need_rating2 = round2_reviews < config.max_reviews_round_two as usize;
}

fn close_all_rounds(state: &mut RecalculatedState, _round2_reviews: usize, _config: &EngineConfig) {
    state.need_rating0 = false;
    state.need_rating1 = false;
    state.need_rating2 = false;
}
