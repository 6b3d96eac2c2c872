//! Per-label fee distribution strategies.
//!
//! Each label has one strategy. A strategy consumes the adjusted rounds,
//! the budget and the full label sequence (for cross-round references such
//! as "half of the previous appeal bond") and appends events to the log in
//! a fixed order: the leader first, then majority validators, then minority
//! validators, then any bond settlement.

mod appeal_leader_successful;
mod appeal_leader_timeout_successful;
mod appeal_leader_timeout_unsuccessful;
mod appeal_leader_unsuccessful;
mod appeal_validator_successful;
mod appeal_validator_unsuccessful;
mod leader_timeout_150_previous_normal_round;
mod leader_timeout_50_percent;
mod leader_timeout_50_previous_appeal_bond;
mod normal_round;
mod skip_round;
mod split_previous_appeal_bond;

use tracing::trace;

use crate::bond::appeal_bond;
use crate::model::{
    Address, FeeEventLog, Role, Rotation, RoundLabel, TransactionBudget, TransactionRounds,
    VoteChoice,
};
use crate::sizes::appeal_ordinal;

/// Shared read-only context for one transaction's distribution pass.
pub(crate) struct DistributionCtx<'a> {
    pub rounds: &'a TransactionRounds,
    pub labels: &'a [RoundLabel],
    pub budget: &'a TransactionBudget,
}

impl<'a> DistributionCtx<'a> {
    pub fn last_rotation(&self, round_index: usize) -> Option<&'a Rotation> {
        self.rounds.last_rotation(round_index)
    }

    pub fn label(&self, round_index: usize) -> RoundLabel {
        self.labels[round_index]
    }

    pub fn next_label(&self, round_index: usize) -> Option<RoundLabel> {
        self.labels.get(round_index + 1).copied()
    }

    pub fn is_last_round(&self, round_index: usize) -> bool {
        round_index + 1 == self.labels.len()
    }

    /// The party that posted the bond for the appeal at `appeal_round`.
    ///
    /// Preconditions (asserted by the pipeline): the budget carries one
    /// appeal record per appeal-labeled round.
    pub fn appealant_of(&self, appeal_round: usize) -> Address {
        let ordinal = appeal_ordinal(self.labels, appeal_round);
        self.budget
            .appeals
            .get(ordinal)
            .expect("budget carries one appeal record per appeal round")
            .appealant
    }

    pub fn bond_of(&self, appeal_round: usize) -> u64 {
        appeal_bond(self.labels, appeal_round, self.budget)
    }
}

/// Distribute fees for a single round based on its label.
pub(crate) fn distribute_round(
    ctx: &DistributionCtx<'_>,
    round_index: usize,
    log: &mut FeeEventLog,
) {
    let label = ctx.label(round_index);
    trace!(round_index, %label, "distributing round");
    match label {
        RoundLabel::NormalRound => normal_round::apply(ctx, round_index, log),
        RoundLabel::SkipRound => skip_round::apply(ctx, round_index, log),
        RoundLabel::EmptyRound => {}
        RoundLabel::AppealLeaderSuccessful => {
            appeal_leader_successful::apply(ctx, round_index, log)
        }
        RoundLabel::AppealLeaderUnsuccessful => {
            appeal_leader_unsuccessful::apply(ctx, round_index, log)
        }
        RoundLabel::AppealValidatorSuccessful => {
            appeal_validator_successful::apply(ctx, round_index, log)
        }
        RoundLabel::AppealValidatorUnsuccessful => {
            appeal_validator_unsuccessful::apply(ctx, round_index, log)
        }
        RoundLabel::AppealLeaderTimeoutSuccessful => {
            appeal_leader_timeout_successful::apply(ctx, round_index, log)
        }
        RoundLabel::AppealLeaderTimeoutUnsuccessful => {
            appeal_leader_timeout_unsuccessful::apply(ctx, round_index, log)
        }
        RoundLabel::LeaderTimeout50Percent => {
            leader_timeout_50_percent::apply(ctx, round_index, log)
        }
        RoundLabel::LeaderTimeout150PreviousNormalRound => {
            leader_timeout_150_previous_normal_round::apply(ctx, round_index, log)
        }
        RoundLabel::LeaderTimeout50PreviousAppealBond => {
            leader_timeout_50_previous_appeal_bond::apply(ctx, round_index, log)
        }
        RoundLabel::SplitPreviousAppealBond => {
            split_previous_appeal_bond::apply(ctx, round_index, log)
        }
    }
}

/// Burn the full bond of a directly preceding failed leader appeal.
///
/// Failed leader appeals emit nothing in their own round (their rotations
/// carry no real votes), so the forfeited bond is settled by whichever
/// round follows. The bond-splitting labels consume it instead and must not
/// call this.
pub(super) fn settle_forfeited_leader_bond(
    ctx: &DistributionCtx<'_>,
    round_index: usize,
    log: &mut FeeEventLog,
) {
    if round_index == 0 {
        return;
    }
    let prev = round_index - 1;
    if !matches!(
        ctx.label(prev),
        RoundLabel::AppealLeaderUnsuccessful | RoundLabel::AppealLeaderTimeoutUnsuccessful
    ) {
        return;
    }
    let bond = ctx.bond_of(prev);
    log.burn(
        ctx.appealant_of(prev),
        Some(round_index),
        Some(ctx.label(round_index)),
        Role::Appealant,
        Some(VoteChoice::NotApplicable),
        bond,
    );
}
