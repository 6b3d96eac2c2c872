//! Successful leader appeal: the contested leader is ousted.
//!
//! The appealant recovers the bond plus one leader timeout. Leader-appeal
//! rounds carry only `NotApplicable` votes, so there are no validator
//! earnings here; the normal round that follows pays its own validators.

use super::DistributionCtx;
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let bond = ctx.bond_of(round_index);
    log.earn(
        ctx.appealant_of(round_index),
        Some(round_index),
        Some(RoundLabel::AppealLeaderSuccessful),
        Role::Appealant,
        Some(VoteChoice::NotApplicable),
        bond + ctx.budget.leader_timeout,
    );
}
