//! Successful appeal against a timed-out leader.
//!
//! The appealant recovers the bond plus one leader timeout. The rewriter
//! voids the timed-out round and grants the replacement leader of the next
//! round the 150% award.

use super::DistributionCtx;
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let bond = ctx.bond_of(round_index);
    log.earn(
        ctx.appealant_of(round_index),
        Some(round_index),
        Some(RoundLabel::AppealLeaderTimeoutSuccessful),
        Role::Appealant,
        Some(VoteChoice::NotApplicable),
        bond + ctx.budget.leader_timeout,
    );
}
