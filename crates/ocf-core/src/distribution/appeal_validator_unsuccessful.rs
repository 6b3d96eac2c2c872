//! Unsuccessful validator appeal: the contested outcome stood.
//!
//! The bond is forfeited. It first pays the appeal validators who voted
//! with the (standing) majority; unless a bond-split round follows, the
//! remainder is burned against the appealant here.

use super::DistributionCtx;
use crate::constants::PENALTY_REWARD_COEFFICIENT;
use crate::majority::{compute_majority, partition_validators, Majority};
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let label = RoundLabel::AppealValidatorUnsuccessful;
    let bond = ctx.bond_of(round_index);
    let vt = ctx.budget.validators_timeout;

    if let Some(rotation) = ctx.last_rotation(round_index) {
        let majority = compute_majority(rotation);
        if majority != Majority::Undetermined {
            let partition = partition_validators(rotation, majority);
            for address in &partition.majority {
                let entry = rotation.get(address).expect("partition address in rotation");
                log.earn(
                    *address,
                    Some(round_index),
                    Some(label),
                    Role::Validator,
                    Some(entry.ballot.choice()),
                    vt,
                );
            }
            for address in &partition.minority {
                let entry = rotation.get(address).expect("partition address in rotation");
                log.burn(
                    *address,
                    Some(round_index),
                    Some(label),
                    Role::Validator,
                    Some(entry.ballot.choice()),
                    PENALTY_REWARD_COEFFICIENT * vt,
                );
            }
        }
    }

    if ctx.next_label(round_index) == Some(RoundLabel::SplitPreviousAppealBond) {
        // The split round consumes the remainder of the bond.
        return;
    }

    let paid_from_bond = log.earned_at_round(round_index);
    assert!(
        paid_from_bond <= bond,
        "bond {bond} cannot cover {paid_from_bond} paid in appeal round {round_index}"
    );
    let residue = bond - paid_from_bond;
    if residue > 0 {
        log.burn(
            ctx.appealant_of(round_index),
            Some(round_index),
            Some(label),
            Role::Appealant,
            Some(VoteChoice::NotApplicable),
            residue,
        );
    }
}
