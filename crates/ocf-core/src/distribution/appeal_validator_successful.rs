//! Successful validator appeal: the appeal overturned the contested
//! round's outcome.
//!
//! The appealant's bond returns in full. Appeal validators on the winning
//! side earn the validator timeout; a determined minority is burned the
//! penalty. With no determined appeal majority every appeal validator is
//! paid.

use super::DistributionCtx;
use crate::constants::PENALTY_REWARD_COEFFICIENT;
use crate::majority::{compute_majority, partition_validators, Majority};
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let label = RoundLabel::AppealValidatorSuccessful;
    let bond = ctx.bond_of(round_index);
    log.earn(
        ctx.appealant_of(round_index),
        Some(round_index),
        Some(label),
        Role::Appealant,
        Some(VoteChoice::NotApplicable),
        bond,
    );

    let Some(rotation) = ctx.last_rotation(round_index) else {
        return;
    };
    let vt = ctx.budget.validators_timeout;
    let majority = compute_majority(rotation);

    if majority == Majority::Undetermined {
        for entry in rotation.validators() {
            log.earn(
                entry.address,
                Some(round_index),
                Some(label),
                Role::Validator,
                Some(entry.ballot.choice()),
                vt,
            );
        }
        return;
    }

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
