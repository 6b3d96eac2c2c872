//! Skip round: a normal round retroactively voided by a successful appeal.
//!
//! No earnings and no penalties; the appeal that voided the round
//! redistributes. Only a preceding failed leader appeal's bond is settled
//! here.

use super::{settle_forfeited_leader_bond, DistributionCtx};
use crate::model::FeeEventLog;

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    settle_forfeited_leader_bond(ctx, round_index, log);
}
