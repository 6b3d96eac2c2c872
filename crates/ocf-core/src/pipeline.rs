//! The transaction pipeline: a single pure pass from ground-truth rounds to
//! the final fee-event log.
//!
//! Emission order is fixed and gives every event its sequence id: the
//! sender authorization first, then per round (slashes, the appealant's
//! bond, the label strategy) and the refund last. Round indices therefore
//! weakly increase across the log.

use tracing::debug;

use crate::adjust::{adjust_rounds, Adjustment, AdjustmentKind};
use crate::bond::appeal_bond;
use crate::constants::{DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT, IDLE_PENALTY_COEFFICIENT};
use crate::distribution::{distribute_round, DistributionCtx};
use crate::labeling::label_rounds;
use crate::model::{
    Address, FeeEvent, FeeEventLog, Role, RoundLabel, TransactionBudget, TransactionRounds,
    VoteChoice,
};
use crate::refund::{compute_refund, sender_authorization};

/// Final state of one processed transaction, as handed to the invariant
/// registry.
#[derive(Clone, Debug)]
pub struct TransactionState {
    /// Rounds after idle/violation adjustment.
    pub rounds: TransactionRounds,
    pub budget: TransactionBudget,
    pub labels: Vec<RoundLabel>,
    pub adjustments: Vec<Adjustment>,
    pub events: Vec<FeeEvent>,
    pub refund: u64,
}

/// Process one transaction.
///
/// Total and deterministic: identical inputs produce identical states.
/// `participants` supplies the reserve pool for idle replacement.
///
/// Preconditions (asserted): the budget carries exactly one appeal record
/// per appeal-labeled round.
pub fn process_transaction(
    participants: &[Address],
    rounds: &TransactionRounds,
    budget: &TransactionBudget,
) -> TransactionState {
    let adjusted = adjust_rounds(rounds, participants);
    let labels = label_rounds(&adjusted.rounds);

    let appeal_rounds = labels.iter().filter(|l| l.is_appeal()).count();
    assert_eq!(
        appeal_rounds,
        budget.appeals.len(),
        "budget must carry one appeal record per appeal round"
    );

    let mut log = FeeEventLog::new();
    let authorized = sender_authorization(&adjusted.rounds, budget);
    log.cost(budget.sender, None, None, Role::Sender, None, authorized);

    let ctx = DistributionCtx {
        rounds: &adjusted.rounds,
        labels: &labels,
        budget,
    };

    for round_index in 0..labels.len() {
        emit_slashes(&adjusted.adjustments, &labels, round_index, budget, &mut log);

        if labels[round_index].is_appeal() {
            let bond = appeal_bond(&labels, round_index, budget);
            log.cost(
                ctx.appealant_of(round_index),
                Some(round_index),
                Some(labels[round_index]),
                Role::Appealant,
                Some(VoteChoice::NotApplicable),
                bond,
            );
        }

        distribute_round(&ctx, round_index, &mut log);
    }

    let refund = compute_refund(log.events());
    log.earn(budget.sender, None, None, Role::Sender, None, refund);

    debug!(
        rounds = labels.len(),
        events = log.events().len(),
        refund,
        "transaction processed"
    );

    TransactionState {
        rounds: adjusted.rounds,
        budget: budget.clone(),
        labels,
        adjustments: adjusted.adjustments,
        events: log.into_events(),
        refund,
    }
}

fn emit_slashes(
    adjustments: &[Adjustment],
    labels: &[RoundLabel],
    round_index: usize,
    budget: &TransactionBudget,
    log: &mut FeeEventLog,
) {
    for adjustment in adjustments.iter().filter(|a| a.round_index == round_index) {
        let stake = budget.stake_of(&adjustment.address);
        let amount = match adjustment.kind {
            AdjustmentKind::Idle => IDLE_PENALTY_COEFFICIENT * stake,
            AdjustmentKind::HashMismatch => DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT * stake,
        };
        log.slash(
            adjustment.address,
            Some(round_index),
            Some(labels[round_index]),
            Role::Validator,
            Some(adjustment.vote),
            amount,
        );
    }
}
