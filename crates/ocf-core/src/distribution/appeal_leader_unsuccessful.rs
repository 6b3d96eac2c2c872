//! Unsuccessful leader appeal.
//!
//! The round itself distributes nothing; the forfeited bond is settled by
//! whichever round follows (a bond split, or a full burn). A terminal
//! failed appeal burns its bond immediately since nothing follows.

use super::DistributionCtx;
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    if ctx.is_last_round(round_index) {
        let bond = ctx.bond_of(round_index);
        log.burn(
            ctx.appealant_of(round_index),
            Some(round_index),
            Some(RoundLabel::AppealLeaderUnsuccessful),
            Role::Appealant,
            Some(VoteChoice::NotApplicable),
            bond,
        );
    }
}
