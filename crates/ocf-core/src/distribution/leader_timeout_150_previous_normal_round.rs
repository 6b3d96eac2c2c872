//! Replacement round after a successful timeout appeal.
//!
//! The new leader delivered where the previous one timed out and earns
//! 150% of the leader timeout (floor division on odd timeouts). Validators
//! are paid as in a normal round.

use super::DistributionCtx;
use crate::constants::PENALTY_REWARD_COEFFICIENT;
use crate::majority::{compute_majority, partition_validators, Majority};
use crate::model::{FeeEventLog, Role, RoundLabel};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let label = RoundLabel::LeaderTimeout150PreviousNormalRound;
    let Some(rotation) = ctx.last_rotation(round_index) else {
        return;
    };
    let vt = ctx.budget.validators_timeout;

    if let Some(leader) = rotation.leader() {
        log.earn(
            leader.address,
            Some(round_index),
            Some(label),
            Role::Leader,
            Some(leader.ballot.choice()),
            3 * ctx.budget.leader_timeout / 2,
        );
    }

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
