//! Financial invariants: value conservation, deposits, bonds and burns.

use super::{Invariant, InvariantId, Violation};
use crate::bond::appeal_bond;
use crate::model::Role;
use crate::pipeline::TransactionState;
use crate::projection::aggregates;
use crate::refund::sender_authorization;
use crate::sizes::{appeal_ordinal, appeal_round_size};

/// Every unit the sender and appealants paid in is either earned by
/// someone, burned, or refunded; nothing appears or disappears.
pub(super) struct ConservationOfValue;

impl Invariant for ConservationOfValue {
    fn id(&self) -> InvariantId {
        InvariantId::ConservationOfValue
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let agg = aggregates(&state.events);
        // The refund is itself an earning event, so costs must be consumed
        // exactly by earnings and burns.
        let consumed = agg.earned + agg.burned;
        if agg.cost != consumed {
            return Some(
                Violation::new(
                    self.id(),
                    format!(
                        "costs {} != earnings {} + burns {}",
                        agg.cost, agg.earned, agg.burned
                    ),
                )
                .with("cost", agg.cost as i128)
                .with("earned", agg.earned as i128)
                .with("burned", agg.burned as i128),
            );
        }
        None
    }
}

/// No address is charged beyond its deposits: cost events exist only for
/// the sender (the authorization) and for appealants (their bonds), so
/// every other participant's cumulative fee balance is non-negative.
pub(super) struct NonNegativeBalances;

impl Invariant for NonNegativeBalances {
    fn id(&self) -> InvariantId {
        InvariantId::NonNegativeBalances
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let appealants: Vec<_> = state.budget.appeals.iter().map(|a| a.appealant).collect();
        for event in &state.events {
            if event.cost == 0 {
                continue;
            }
            let is_depositor =
                event.address == state.budget.sender || appealants.contains(&event.address);
            if !is_depositor {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("address {} charged without a deposit", event.address),
                    )
                    .with("cost", event.cost as i128)
                    .with("sequence_id", event.sequence_id as i128),
                );
            }
        }
        None
    }
}

/// Every posted bond covers the full cost of its appeal round.
pub(super) struct AppealBondCoverage;

impl Invariant for AppealBondCoverage {
    fn id(&self) -> InvariantId {
        InvariantId::AppealBondCoverage
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for (index, label) in state.labels.iter().enumerate() {
            if !label.is_appeal() {
                continue;
            }
            let required = appeal_round_size(appeal_ordinal(&state.labels, index))
                * state.budget.validators_timeout
                + state.budget.leader_timeout;
            let posted: u64 = state
                .events
                .iter()
                .filter(|e| e.round_index == Some(index) && e.role == Role::Appealant)
                .map(|e| e.cost)
                .sum();
            if posted < required {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("bond {posted} below round cost {required} at round {index}"),
                    )
                    .with("round", index as i128)
                    .with("posted", posted as i128)
                    .with("required", required as i128),
                );
            }
        }
        None
    }
}

/// Burn quantities are structurally non-negative and only ever attributed
/// to validators (penalties) or appealants (forfeited bonds).
pub(super) struct BurnNonNegativity;

impl Invariant for BurnNonNegativity {
    fn id(&self) -> InvariantId {
        InvariantId::BurnNonNegativity
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for event in &state.events {
            if event.burned > 0 && !matches!(event.role, Role::Validator | Role::Appealant) {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("burn attributed to {:?} role", event.role),
                    )
                    .with("sequence_id", event.sequence_id as i128)
                    .with("burned", event.burned as i128),
                );
            }
        }
        None
    }
}

/// The sender's refund is non-negative and equals the unconsumed part of
/// the total costs.
pub(super) struct RefundNonNegativity;

impl Invariant for RefundNonNegativity {
    fn id(&self) -> InvariantId {
        InvariantId::RefundNonNegativity
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let agg = aggregates(&state.events);
        let earned_before_refund = agg.earned as i128 - state.refund as i128;
        let residual = agg.cost as i128 - earned_before_refund - agg.burned as i128;
        if residual < 0 || residual != state.refund as i128 {
            return Some(
                Violation::new(
                    self.id(),
                    format!("recorded refund {} != residual {residual}", state.refund),
                )
                .with("refund", state.refund as i128)
                .with("residual", residual),
            );
        }
        None
    }
}

/// Posted bonds follow the appeal-size table chain exactly.
pub(super) struct AppealBondConsistency;

impl Invariant for AppealBondConsistency {
    fn id(&self) -> InvariantId {
        InvariantId::AppealBondConsistency
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for (index, label) in state.labels.iter().enumerate() {
            if !label.is_appeal() {
                continue;
            }
            let expected = appeal_bond(&state.labels, index, &state.budget);
            let posted: u64 = state
                .events
                .iter()
                .filter(|e| e.round_index == Some(index) && e.role == Role::Appealant)
                .map(|e| e.cost)
                .sum();
            if posted != expected {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("bond {posted} != expected {expected} at round {index}"),
                    )
                    .with("round", index as i128)
                    .with("posted", posted as i128)
                    .with("expected", expected as i128),
                );
            }
        }
        None
    }
}

/// Total costs decompose into the sender's authorization plus the posted
/// bonds, with no other charge anywhere.
pub(super) struct CostAccounting;

impl Invariant for CostAccounting {
    fn id(&self) -> InvariantId {
        InvariantId::CostAccounting
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let agg = aggregates(&state.events);
        let authorized = sender_authorization(&state.rounds, &state.budget) as u128;
        let bonds: u128 = state
            .labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_appeal())
            .map(|(i, _)| appeal_bond(&state.labels, i, &state.budget) as u128)
            .sum();
        let expected = authorized + bonds;
        if agg.cost != expected {
            return Some(
                Violation::new(
                    self.id(),
                    format!(
                        "costs {} != authorization {authorized} + bonds {bonds}",
                        agg.cost
                    ),
                )
                .with("cost", agg.cost as i128)
                .with("authorized", authorized as i128)
                .with("bonds", bonds as i128),
            );
        }
        None
    }
}
