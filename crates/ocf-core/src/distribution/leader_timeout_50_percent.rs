//! Terminal leader timeout: the leader is paid half the timeout for the
//! attempt and the rest of the round's authorization returns to the sender.

use super::{settle_forfeited_leader_bond, DistributionCtx};
use crate::model::{FeeEventLog, Role, RoundLabel};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    if let Some(rotation) = ctx.last_rotation(round_index) {
        if let Some(leader) = rotation.leader() {
            log.earn(
                leader.address,
                Some(round_index),
                Some(RoundLabel::LeaderTimeout50Percent),
                Role::Leader,
                Some(leader.ballot.choice()),
                ctx.budget.leader_timeout / 2,
            );
        }
    }
    settle_forfeited_leader_bond(ctx, round_index, log);
}
