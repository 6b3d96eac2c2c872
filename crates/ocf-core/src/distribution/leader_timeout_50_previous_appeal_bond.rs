//! Timed-out round following an unsuccessful timeout appeal.
//!
//! The leader keeps the full timeout; the round's validators split half of
//! the forfeited appeal bond equally (floor). The unsplit remainder of the
//! bond, including division dust, is burned against the appealant.

use super::DistributionCtx;
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let label = RoundLabel::LeaderTimeout50PreviousAppealBond;
    if round_index == 0 || !ctx.label(round_index - 1).is_appeal() {
        return;
    }
    let appeal_round = round_index - 1;
    let bond = ctx.bond_of(appeal_round);

    let mut split_total = 0u64;
    if let Some(rotation) = ctx.last_rotation(round_index) {
        if let Some(leader) = rotation.leader() {
            log.earn(
                leader.address,
                Some(round_index),
                Some(label),
                Role::Leader,
                Some(leader.ballot.choice()),
                ctx.budget.leader_timeout,
            );
        }
        let validators: Vec<_> = rotation.validators().collect();
        if !validators.is_empty() {
            let share = (bond / 2) / validators.len() as u64;
            if share > 0 {
                for entry in &validators {
                    log.earn(
                        entry.address,
                        Some(round_index),
                        Some(label),
                        Role::Validator,
                        Some(entry.ballot.choice()),
                        share,
                    );
                }
                split_total = share * validators.len() as u64;
            }
        }
    }

    let residue = bond - split_total;
    if residue > 0 {
        log.burn(
            ctx.appealant_of(appeal_round),
            Some(round_index),
            Some(label),
            Role::Appealant,
            Some(VoteChoice::NotApplicable),
            residue,
        );
    }
}
