//! Contextual label rewriting.
//!
//! Rules run in a fixed order, each scanning the live sequence left to
//! right; an index is rewritten at most once. All rules are stated against
//! the *effective* predecessor chain, which classification already resolved
//! when it walked past intermediate appeals.

use super::Prelim;
use crate::majority::{compute_majority, Majority};
use crate::model::{RoundLabel, RoundLabel as L, TransactionRounds};

fn is(prelim: Prelim, label: RoundLabel) -> bool {
    prelim == Prelim::Resolved(label)
}

fn round_is_undetermined(rounds: &TransactionRounds, index: usize) -> bool {
    rounds
        .last_rotation(index)
        .map(|r| compute_majority(r) == Majority::Undetermined)
        .unwrap_or(true)
}

/// Resolve every contextual dependency in the preliminary sequence.
pub(crate) fn apply_rewrites(
    mut prelim: Vec<Prelim>,
    rounds: &TransactionRounds,
) -> Vec<RoundLabel> {
    let len = prelim.len();
    let mut touched = vec![false; len];

    fn set(prelim: &mut [Prelim], touched: &mut [bool], i: usize, l: RoundLabel) {
        prelim[i] = Prelim::Resolved(l);
        touched[i] = true;
    }

    // A successful appeal retroactively voids the round it contested.
    for i in 0..len.saturating_sub(1) {
        if is(prelim[i], L::NormalRound)
            && (is(prelim[i + 1], L::AppealLeaderSuccessful)
                || is(prelim[i + 1], L::AppealValidatorSuccessful))
            && !touched[i]
        {
            set(&mut prelim, &mut touched, i, L::SkipRound);
        }
    }

    // A successful timeout appeal voids the timed-out round and entitles
    // the replacement leader to the 150% award.
    for i in 0..len.saturating_sub(2) {
        if prelim[i] == Prelim::LeaderTimeout
            && is(prelim[i + 1], L::AppealLeaderTimeoutSuccessful)
            && is(prelim[i + 2], L::NormalRound)
            && !touched[i]
            && !touched[i + 2]
        {
            set(&mut prelim, &mut touched, i, L::SkipRound);
            set(
                &mut prelim,
                &mut touched,
                i + 2,
                L::LeaderTimeout150PreviousNormalRound,
            );
        }
    }

    // An undecided round following a failed appeal splits the forfeited
    // bond among its validators.
    for i in 1..len.saturating_sub(1) {
        if (is(prelim[i], L::AppealLeaderUnsuccessful)
            || is(prelim[i], L::AppealValidatorUnsuccessful))
            && is(prelim[i + 1], L::NormalRound)
            && round_is_undetermined(rounds, i + 1)
            && !touched[i + 1]
        {
            set(&mut prelim, &mut touched, i + 1, L::SplitPreviousAppealBond);
        }
    }

    // Failed timeout appeals chain: each subsequent timed-out round settles
    // half the forfeited bond. The scans observe their own rewrites, so a
    // chain of any length cascades.
    for i in 0..len.saturating_sub(2) {
        if is(prelim[i], L::LeaderTimeout50Percent)
            && is(prelim[i + 1], L::AppealLeaderTimeoutUnsuccessful)
            && prelim[i + 2] == Prelim::LeaderTimeout
            && !touched[i + 2]
        {
            set(
                &mut prelim,
                &mut touched,
                i + 2,
                L::LeaderTimeout50PreviousAppealBond,
            );
        }
    }
    for i in 0..len.saturating_sub(2) {
        if is(prelim[i], L::LeaderTimeout50PreviousAppealBond)
            && is(prelim[i + 1], L::AppealLeaderTimeoutUnsuccessful)
            && prelim[i + 2] == Prelim::LeaderTimeout
            && !touched[i + 2]
        {
            set(
                &mut prelim,
                &mut touched,
                i + 2,
                L::LeaderTimeout50PreviousAppealBond,
            );
        }
    }
    for i in 0..len.saturating_sub(2) {
        if prelim[i] == Prelim::LeaderTimeout
            && is(prelim[i + 1], L::AppealLeaderTimeoutUnsuccessful)
            && prelim[i + 2] == Prelim::LeaderTimeout
            && !touched[i]
            && !touched[i + 2]
        {
            set(&mut prelim, &mut touched, i, L::LeaderTimeout50Percent);
            set(
                &mut prelim,
                &mut touched,
                i + 2,
                L::LeaderTimeout50PreviousAppealBond,
            );
        }
    }

    // A timed-out round nothing resolved (e.g. terminal after a successful
    // validator appeal) settles as a half-pay timeout, keeping the label
    // set closed.
    prelim
        .into_iter()
        .map(|p| match p {
            Prelim::Resolved(label) => label,
            Prelim::LeaderTimeout => L::LeaderTimeout50Percent,
        })
        .collect()
}
