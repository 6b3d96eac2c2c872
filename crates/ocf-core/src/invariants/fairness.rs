//! Fairness invariants: penalties, slashing and earning justification.

use super::{Invariant, InvariantId, Violation};
use crate::adjust::AdjustmentKind;
use crate::constants::{
    DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT, IDLE_PENALTY_COEFFICIENT,
    PENALTY_REWARD_COEFFICIENT,
};
use crate::majority::{compute_majority, partition_validators, Majority};
use crate::model::{Role, RoundLabel};
use crate::pipeline::TransactionState;

/// In a decided normal round, validator burns equal the penalty rate times
/// the minority size.
pub(super) struct MajorityMinorityConsistency;

impl Invariant for MajorityMinorityConsistency {
    fn id(&self) -> InvariantId {
        InvariantId::MajorityMinorityConsistency
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for (index, label) in state.labels.iter().enumerate() {
            if *label != RoundLabel::NormalRound {
                continue;
            }
            let Some(rotation) = state.rounds.last_rotation(index) else {
                continue;
            };
            let majority = compute_majority(rotation);
            if majority == Majority::Undetermined {
                continue;
            }
            let minority = partition_validators(rotation, majority).minority.len() as u64;
            let expected =
                PENALTY_REWARD_COEFFICIENT * minority * state.budget.validators_timeout;
            let actual: u64 = state
                .events
                .iter()
                .filter(|e| e.round_index == Some(index) && e.role == Role::Validator)
                .map(|e| e.burned)
                .sum();
            if actual != expected {
                return Some(
                    Violation::new(
                        self.id(),
                        format!(
                            "round {index}: validator burns {actual} != {expected} for {minority} minority votes"
                        ),
                    )
                    .with("round", index as i128)
                    .with("actual", actual as i128)
                    .with("expected", expected as i128),
                );
            }
        }
        None
    }
}

/// No address acts as both leader and validator within one round.
pub(super) struct RoleExclusivity;

impl Invariant for RoleExclusivity {
    fn id(&self) -> InvariantId {
        InvariantId::RoleExclusivity
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        use std::collections::BTreeMap;
        let mut seen: BTreeMap<(usize, crate::model::Address), (bool, bool)> = BTreeMap::new();
        for event in &state.events {
            let Some(round) = event.round_index else {
                continue;
            };
            let slot = seen.entry((round, event.address)).or_default();
            match event.role {
                Role::Leader => slot.0 = true,
                Role::Validator => slot.1 = true,
                Role::Appealant | Role::Sender => {}
            }
            if slot.0 && slot.1 {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("{} is both leader and validator in round {round}", event.address),
                    )
                    .with("round", round as i128),
                );
            }
        }
        None
    }
}

fn slashing_check(
    id: InvariantId,
    kind: AdjustmentKind,
    coefficient: u64,
    state: &TransactionState,
) -> Option<Violation> {
    for adjustment in state.adjustments.iter().filter(|a| a.kind == kind) {
        let expected = coefficient * state.budget.stake_of(&adjustment.address);
        let matching: Vec<_> = state
            .events
            .iter()
            .filter(|e| {
                e.slashed > 0
                    && e.address == adjustment.address
                    && e.round_index == Some(adjustment.round_index)
            })
            .collect();
        if matching.len() != 1 || matching[0].slashed != expected {
            let actual: u64 = matching.iter().map(|e| e.slashed).sum();
            return Some(
                Violation::new(
                    id,
                    format!(
                        "{} slashed {actual} over {} events, expected {expected} exactly once",
                        adjustment.address,
                        matching.len()
                    ),
                )
                .with("round", adjustment.round_index as i128)
                .with("actual", actual as i128)
                .with("expected", expected as i128)
                .with("events", matching.len() as i128),
            );
        }
    }
    None
}

/// Every idle replacement is slashed exactly once at the idle rate.
pub(super) struct IdleSlashingCorrectness;

impl Invariant for IdleSlashingCorrectness {
    fn id(&self) -> InvariantId {
        InvariantId::IdleSlashingCorrectness
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        slashing_check(
            self.id(),
            AdjustmentKind::Idle,
            IDLE_PENALTY_COEFFICIENT,
            state,
        )
    }
}

/// Every deterministic violation is slashed exactly once at the violation
/// rate.
pub(super) struct DeterministicViolationSlashing;

impl Invariant for DeterministicViolationSlashing {
    fn id(&self) -> InvariantId {
        InvariantId::DeterministicViolationSlashing
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        slashing_check(
            self.id(),
            AdjustmentKind::HashMismatch,
            DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT,
            state,
        )
    }
}

/// Leader earnings in timeout rounds stay within the label's cap.
pub(super) struct LeaderTimeoutEarningLimits;

impl Invariant for LeaderTimeoutEarningLimits {
    fn id(&self) -> InvariantId {
        InvariantId::LeaderTimeoutEarningLimits
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let lt = state.budget.leader_timeout;
        for (index, label) in state.labels.iter().enumerate() {
            let cap = match label {
                RoundLabel::LeaderTimeout50Percent => lt,
                RoundLabel::LeaderTimeout50PreviousAppealBond => lt,
                RoundLabel::LeaderTimeout150PreviousNormalRound => 3 * lt / 2,
                _ => continue,
            };
            let earned: u64 = state
                .events
                .iter()
                .filter(|e| e.round_index == Some(index) && e.role == Role::Leader)
                .map(|e| e.earned)
                .sum();
            if earned > cap {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("leader earned {earned} > cap {cap} in round {index} ({label})"),
                    )
                    .with("round", index as i128)
                    .with("earned", earned as i128)
                    .with("cap", cap as i128),
                );
            }
        }
        None
    }
}

/// A single event never both burns and slashes for the same offense.
pub(super) struct NoDoublePenalties;

impl Invariant for NoDoublePenalties {
    fn id(&self) -> InvariantId {
        InvariantId::NoDoublePenalties
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for event in &state.events {
            if event.burned > 0 && event.slashed > 0 {
                return Some(
                    Violation::new(self.id(), "event both burns and slashes")
                        .with("sequence_id", event.sequence_id as i128)
                        .with("burned", event.burned as i128)
                        .with("slashed", event.slashed as i128),
                );
            }
        }
        None
    }
}

/// Every earning has a role-appropriate cause: round-bound service for
/// leaders and validators, an appeal for appealants, the refund for the
/// sender.
pub(super) struct EarningJustification;

impl Invariant for EarningJustification {
    fn id(&self) -> InvariantId {
        InvariantId::EarningJustification
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for event in &state.events {
            if event.earned == 0 {
                continue;
            }
            let justified = match event.role {
                Role::Leader | Role::Validator => {
                    event.round_index.is_some() && event.round_label.is_some()
                }
                Role::Appealant => match (event.round_index, event.round_label) {
                    // Appealants are paid in their appeal round; forfeiture
                    // burns may land later, but earnings never do.
                    (Some(_), Some(label)) => label.is_appeal(),
                    _ => false,
                },
                Role::Sender => event.round_index.is_none() && event.round_label.is_none(),
            };
            if !justified {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("unjustified {:?} earning of {}", event.role, event.earned),
                    )
                    .with("sequence_id", event.sequence_id as i128)
                    .with("earned", event.earned as i128),
                );
            }
        }
        None
    }
}

/// Every slash is exactly a penalty coefficient times the stake.
pub(super) struct SlashingProportionality;

impl Invariant for SlashingProportionality {
    fn id(&self) -> InvariantId {
        InvariantId::SlashingProportionality
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for event in &state.events {
            if event.slashed == 0 {
                continue;
            }
            let stake = state.budget.stake_of(&event.address);
            let idle = IDLE_PENALTY_COEFFICIENT * stake;
            let violation = DETERMINISTIC_VIOLATION_PENALTY_COEFFICIENT * stake;
            if event.slashed != idle && event.slashed != violation {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("slash {} is no coefficient multiple of stake {stake}", event.slashed),
                    )
                    .with("sequence_id", event.sequence_id as i128)
                    .with("slashed", event.slashed as i128)
                    .with("stake", stake as i128),
                );
            }
        }
        None
    }
}
