//! Sender authorization and refund.
//!
//! The sender fronts the maximum spend the budget authorizes: one leader
//! timeout plus one validator timeout per seat, for every round. Appeal
//! rounds are additionally funded by their bonds (appealant cost events).
//! Whatever the distribution pass did not consume as earnings or burns
//! returns to the sender.

use crate::model::{FeeEvent, TransactionBudget, TransactionRounds};

/// Maximum spend the sender authorizes for these rounds.
pub fn sender_authorization(rounds: &TransactionRounds, budget: &TransactionBudget) -> u64 {
    rounds
        .rounds
        .iter()
        .map(|round| {
            let seats = round
                .last_rotation()
                .map(|r| r.len() as u64)
                .unwrap_or(0);
            budget.leader_timeout + budget.validators_timeout * seats
        })
        .sum()
}

/// Unused budget returned to the sender: total costs minus everything
/// earned or burned. Called before the refund event itself is emitted.
///
/// A negative refund means a strategy overspent its funding source; that is
/// a bug in the distribution rules, not bad input, and aborts.
pub fn compute_refund(events: &[FeeEvent]) -> u64 {
    let mut cost: i128 = 0;
    let mut spent: i128 = 0;
    for event in events {
        cost += event.cost as i128;
        spent += event.earned as i128 + event.burned as i128;
    }
    let refund = cost - spent;
    assert!(
        refund >= 0,
        "distribution overspent the transaction pool by {}",
        -refund
    );
    refund as u64
}
