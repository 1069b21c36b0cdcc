//! Eligibility and rating recalculation
//!
//! Derives the cached review state of an application from its status and its
//! three review collections. The steps run in a fixed order and later steps
//! override earlier ones.

use crate::config::EngineConfig;
use crate::engine::overrides::override_for;
use crate::types::{ApplicationStatus, Rating, RecalculatedState, Round0Decision};
use crate::utils::rating_difference;

/// Recalculate the derived state of one application.
///
/// Pure and total: the same inputs always give the same output, and empty
/// review collections produce a rating of 0.
///
/// # Arguments
/// * `status` - Current operator status
/// * `round0` - Round-0 decisions
/// * `round1` - Round-1 ratings, in any order
/// * `round2` - Round-2 ratings, in any order
/// * `config` - Gating thresholds
pub fn recalculate(
    status: ApplicationStatus,
    round0: &[Round0Decision],
    round1: &[Rating],
    round2: &[Rating],
    config: &EngineConfig,
) -> RecalculatedState {
    let (need_rating0, status) = round_zero_gate(status, round0, config);

    let rating1 = mean_rating(round1);
    let rating2 = mean_rating(round2);

    let mut need_rating1 = round1.len() < config.max_reviews_round_one as usize;
    let mut need_rating2 = round2.len() < config.max_reviews_round_two as usize;

    if rating1 <= config.rating_r1_low_threshold {
        // One low review is enough to settle round 1.
        if round1.len() == 1 {
            need_rating1 = false;
        }
    } else if config.needed_rating_for_third_review_round1 <= rating1
        && rating1 < config.needed_rating_to_round2
    {
        if let [first, second] = round1 {
            if rating_difference(first.value(), second.value())
                > config.needed_difference_for_third_review_round1
            {
                need_rating1 = true;
            }
        }
    }

    if need_rating0 {
        need_rating1 = false;
        need_rating2 = false;
    }
    if need_rating1 {
        need_rating2 = false;
    }

    let mut state = RecalculatedState {
        status,
        rating1,
        rating2,
        need_rating0,
        need_rating1,
        need_rating2,
    };

    override_for(state.status)(&mut state, round2.len(), config);

    state
}

/// Round-0 gate: returns whether round-0 review is still needed, and the
/// possibly blacklisted status.
///
/// Yes votes are counted before no votes, so an application that reaches both
/// thresholds at once is accepted.
fn round_zero_gate(
    status: ApplicationStatus,
    round0: &[Round0Decision],
    config: &EngineConfig,
) -> (bool, ApplicationStatus) {
    if round0.contains(&Round0Decision::Review) {
        return (false, status);
    }

    let count = |wanted: Round0Decision| round0.iter().filter(|d| **d == wanted).count();

    if count(Round0Decision::Yes) >= config.yeses_needed as usize {
        (false, status)
    } else if count(Round0Decision::No) >= config.nos_needed as usize {
        (false, ApplicationStatus::Blacklisted)
    } else {
        (true, status)
    }
}

// Summed in whole tenths so the mean does not depend on review order.
fn mean_rating(ratings: &[Rating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let tenths: u32 = ratings.iter().map(|r| u32::from(r.tenths())).sum();
    f64::from(tenths) / (ratings.len() as f64 * 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Round0Decision::{No, Review, Yes};

    fn ratings(values: &[f64]) -> Vec<Rating> {
        values.iter().map(|v| Rating::new(*v).unwrap()).collect()
    }

    fn run(
        status: ApplicationStatus,
        round0: &[Round0Decision],
        round1: &[f64],
        round2: &[f64],
    ) -> RecalculatedState {
        recalculate(
            status,
            round0,
            &ratings(round1),
            &ratings(round2),
            &EngineConfig::default(),
        )
    }

    fn regular(round0: &[Round0Decision], round1: &[f64], round2: &[f64]) -> RecalculatedState {
        run(ApplicationStatus::Regular, round0, round1, round2)
    }

    #[test]
    fn test_no_reviews_waits_on_round_zero() {
        let state = regular(&[], &[], &[]);
        assert!(state.need_rating0);
        assert!(!state.need_rating1);
        assert!(!state.need_rating2);
        assert_eq!(state.rating1, 0.0);
        assert_eq!(state.rating2, 0.0);
        assert_eq!(state.status, ApplicationStatus::Regular);
    }

    #[test]
    fn test_single_yes_opens_round_one() {
        let state = regular(&[Yes], &[], &[]);
        assert!(!state.need_rating0);
        assert!(state.need_rating1);
        assert!(!state.need_rating2);
    }

    #[test]
    fn test_two_nos_blacklist() {
        let state = regular(&[No, No], &[8.0], &[9.0]);
        assert_eq!(state.status, ApplicationStatus::Blacklisted);
        assert_eq!(state.rating1, 0.0);
        assert_eq!(state.rating2, 0.0);
        assert_eq!(state.pending_round(), None);
    }

    #[test]
    fn test_single_no_keeps_waiting() {
        let state = regular(&[No], &[], &[]);
        assert!(state.need_rating0);
        assert_eq!(state.status, ApplicationStatus::Regular);
    }

    #[test]
    fn test_review_decision_escalates_past_round_zero() {
        let state = regular(&[Review, No, No], &[], &[]);
        assert!(!state.need_rating0);
        assert!(state.need_rating1);
        assert_eq!(state.status, ApplicationStatus::Regular);
    }

    #[test]
    fn test_yes_wins_tie_with_no_threshold() {
        let config = EngineConfig {
            yeses_needed: 2,
            nos_needed: 2,
            ..EngineConfig::default()
        };
        let state = recalculate(
            ApplicationStatus::Regular,
            &[Yes, No, Yes, No],
            &[],
            &[],
            &config,
        );
        assert_eq!(state.status, ApplicationStatus::Regular);
        assert!(!state.need_rating0);
        assert!(state.need_rating1);
    }

    #[test]
    fn test_low_single_review_closes_round_one() {
        let state = regular(&[Yes], &[4.0], &[]);
        assert_eq!(state.rating1, 4.0);
        assert!(!state.need_rating1);
        // Round 2 pool membership is decided by rating1, not by this flag.
        assert!(state.need_rating2);
    }

    #[test]
    fn test_single_review_at_threshold_is_low() {
        let state = regular(&[Yes], &[5.0], &[]);
        assert!(!state.need_rating1);
    }

    #[test]
    fn test_single_high_review_needs_second() {
        let state = regular(&[Yes], &[8.0], &[]);
        assert!(state.need_rating1);
        assert!(!state.need_rating2);
    }

    #[test]
    fn test_agreeing_high_reviews_open_round_two() {
        let state = regular(&[Yes], &[6.0, 9.0], &[]);
        assert_eq!(state.rating1, 7.5);
        assert!(!state.need_rating1);
        assert!(state.need_rating2);
    }

    #[test]
    fn test_disagreement_in_middle_band_requests_third_review() {
        let state = regular(&[Yes], &[5.0, 9.0], &[]);
        assert_eq!(state.rating1, 7.0);
        assert!(state.need_rating1);
        assert!(!state.need_rating2);

        let reversed = regular(&[Yes], &[9.0, 5.0], &[]);
        assert_eq!(state, reversed);
    }

    #[test]
    fn test_difference_must_exceed_threshold() {
        let state = regular(&[Yes], &[6.0, 8.0], &[]);
        assert_eq!(state.rating1, 7.0);
        assert!(!state.need_rating1);
    }

    #[test]
    fn test_mean_at_low_threshold_skips_disagreement_check() {
        // Mean 5.0 falls in the low branch, so the band check never runs.
        let state = regular(&[Yes], &[2.0, 8.0], &[]);
        assert_eq!(state.rating1, 5.0);
        assert!(!state.need_rating1);
    }

    #[test]
    fn test_third_review_closes_round_one() {
        let state = regular(&[Yes], &[5.0, 9.0, 7.0], &[]);
        assert!(!state.need_rating1);
        assert!(state.need_rating2);
    }

    #[test]
    fn test_round_two_completes() {
        let state = regular(&[Yes], &[8.0, 9.0], &[7.0, 9.0]);
        assert_eq!(state.rating2, 8.0);
        assert_eq!(state.pending_round(), None);
    }

    #[test]
    fn test_round_zero_suppresses_later_rounds() {
        let state = regular(&[], &[8.0], &[9.0]);
        assert!(state.need_rating0);
        assert!(!state.need_rating1);
        assert!(!state.need_rating2);
        assert_eq!(state.rating1, 8.0);
        assert_eq!(state.rating2, 9.0);
    }

    #[test]
    fn test_whitelist_round_two_skips_early_rounds() {
        let state = run(ApplicationStatus::WhitelistRound2, &[], &[], &[]);
        assert!(!state.need_rating0);
        assert!(!state.need_rating1);
        assert!(state.need_rating2);

        let done = run(ApplicationStatus::WhitelistRound2, &[], &[], &[7.0, 8.0]);
        assert!(!done.need_rating2);
    }

    #[test]
    fn test_whitelist_round_three_needs_nothing() {
        let state = run(ApplicationStatus::WhitelistRound3, &[], &[6.0], &[]);
        assert_eq!(state.pending_round(), None);
        assert_eq!(state.rating1, 6.0);
    }

    #[test]
    fn test_round_zero_nos_override_whitelist() {
        let state = run(ApplicationStatus::WhitelistRound2, &[No, No], &[], &[]);
        assert_eq!(state.status, ApplicationStatus::Blacklisted);
        assert_eq!(state.pending_round(), None);
    }

    #[test]
    fn test_operator_blacklist_freezes_scores() {
        let state = run(ApplicationStatus::Blacklisted, &[Yes], &[9.0, 9.5], &[8.0]);
        assert_eq!(state.rating1, 0.0);
        assert_eq!(state.rating2, 0.0);
        assert_eq!(state.pending_round(), None);
    }

    #[test]
    fn test_deleted_behaves_like_regular() {
        let deleted = run(ApplicationStatus::Deleted, &[Yes], &[8.0], &[]);
        let regular = regular(&[Yes], &[8.0], &[]);
        assert_eq!(deleted.status, ApplicationStatus::Deleted);
        assert_eq!(deleted.need_rating1, regular.need_rating1);
        assert_eq!(deleted.rating1, regular.rating1);
    }
}
