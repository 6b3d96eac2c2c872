//! Undecided round following an unsuccessful appeal: the forfeited bond is
//! split among this round's validators.
//!
//! Whatever the failed appeal round already paid out of the bond is
//! excluded. The leader takes one leader timeout off the top; the rest is
//! split equally (floor) and the division dust is burned against the
//! appealant. With a determined majority (not produced by the rewriter, but
//! kept total) only majority validators share and the minority is burned
//! the penalty.

use super::DistributionCtx;
use crate::constants::PENALTY_REWARD_COEFFICIENT;
use crate::majority::{compute_majority, partition_validators, Majority};
use crate::model::{Address, FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let label = RoundLabel::SplitPreviousAppealBond;
    if round_index == 0 || !ctx.label(round_index - 1).is_appeal() {
        return;
    }
    let appeal_round = round_index - 1;
    let bond = ctx.bond_of(appeal_round);
    let paid_from_bond = log.earned_at_round(appeal_round);
    assert!(
        paid_from_bond <= bond,
        "bond {bond} cannot cover {paid_from_bond} paid in appeal round {appeal_round}"
    );
    let mut remaining = bond - paid_from_bond;

    let Some(rotation) = ctx.last_rotation(round_index) else {
        burn_residue(ctx, appeal_round, round_index, remaining, log);
        return;
    };

    if let Some(leader) = rotation.leader() {
        let lt = ctx.budget.leader_timeout.min(remaining);
        log.earn(
            leader.address,
            Some(round_index),
            Some(label),
            Role::Leader,
            Some(leader.ballot.choice()),
            lt,
        );
        remaining -= lt;
    }

    let majority = compute_majority(rotation);
    let recipients: Vec<Address> = if majority == Majority::Undetermined {
        rotation.validators().map(|e| e.address).collect()
    } else {
        let partition = partition_validators(rotation, majority);
        for address in &partition.minority {
            let entry = rotation.get(address).expect("partition address in rotation");
            log.burn(
                *address,
                Some(round_index),
                Some(label),
                Role::Validator,
                Some(entry.ballot.choice()),
                PENALTY_REWARD_COEFFICIENT * ctx.budget.validators_timeout,
            );
        }
        partition.majority
    };

    let mut split_total = 0u64;
    if !recipients.is_empty() {
        let share = remaining / recipients.len() as u64;
        if share > 0 {
            for address in &recipients {
                let entry = rotation.get(address).expect("recipient in rotation");
                log.earn(
                    *address,
                    Some(round_index),
                    Some(label),
                    Role::Validator,
                    Some(entry.ballot.choice()),
                    share,
                );
            }
            split_total = share * recipients.len() as u64;
        }
    }

    burn_residue(ctx, appeal_round, round_index, remaining - split_total, log);
}

fn burn_residue(
    ctx: &DistributionCtx<'_>,
    appeal_round: usize,
    round_index: usize,
    residue: u64,
    log: &mut FeeEventLog,
) {
    if residue > 0 {
        log.burn(
            ctx.appealant_of(appeal_round),
            Some(round_index),
            Some(RoundLabel::SplitPreviousAppealBond),
            Role::Appealant,
            Some(VoteChoice::NotApplicable),
            residue,
        );
    }
}
