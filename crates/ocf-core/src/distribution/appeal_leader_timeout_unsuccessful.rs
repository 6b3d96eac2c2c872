//! Unsuccessful appeal against a timed-out leader.
//!
//! Distributes nothing in-round; the following timed-out round settles the
//! bond (half to its validators, the rest burned). A terminal failed appeal
//! burns its bond immediately.

use super::DistributionCtx;
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    if ctx.is_last_round(round_index) {
        let bond = ctx.bond_of(round_index);
        log.burn(
            ctx.appealant_of(round_index),
            Some(round_index),
            Some(RoundLabel::AppealLeaderTimeoutUnsuccessful),
            Role::Appealant,
            Some(VoteChoice::NotApplicable),
            bond,
        );
    }
}
