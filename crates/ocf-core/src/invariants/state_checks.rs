//! State invariants: structural consistency between the label sequence,
//! the rounds, and the event log.

use super::{Invariant, InvariantId, Violation};
use crate::model::{Role, RoundLabel};
use crate::pipeline::TransactionState;
use crate::sizes::{appeal_round_size, normal_round_size};

/// Fee events are emitted round by round: round indices weakly increase.
pub(super) struct SequentialProcessing;

impl Invariant for SequentialProcessing {
    fn id(&self) -> InvariantId {
        InvariantId::SequentialProcessing
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let mut last: Option<usize> = None;
        for event in &state.events {
            let Some(round) = event.round_index else {
                continue;
            };
            if let Some(prev) = last {
                if round < prev {
                    return Some(
                        Violation::new(
                            self.id(),
                            format!("round {round} emitted after round {prev}"),
                        )
                        .with("round", round as i128)
                        .with("previous", prev as i128)
                        .with("sequence_id", event.sequence_id as i128),
                    );
                }
            }
            last = Some(round);
        }
        None
    }
}

/// Every appeal's effective predecessor is a normal-family round, and
/// chained appeals only ever follow unsuccessful appeals.
pub(super) struct AppealFollowsNormal;

impl Invariant for AppealFollowsNormal {
    fn id(&self) -> InvariantId {
        InvariantId::AppealFollowsNormal
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for (index, label) in state.labels.iter().enumerate() {
            if !label.is_appeal() {
                continue;
            }
            if index == 0 {
                return Some(
                    Violation::new(self.id(), "appeal opens the transaction")
                        .with("round", 0),
                );
            }
            let prev = state.labels[index - 1];
            if prev.is_appeal() && !prev.is_unsuccessful_appeal() {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("appeal at round {index} chains onto successful appeal"),
                    )
                    .with("round", index as i128),
                );
            }
            // Walking past the appeal chain must land on a normal-family
            // round.
            let mut origin = index;
            while origin > 0 && state.labels[origin - 1].is_appeal() {
                origin -= 1;
            }
            if origin == 0 {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("appeal at round {index} has no normal predecessor"),
                    )
                    .with("round", index as i128),
                );
            }
        }
        None
    }
}

/// Leader and validator events agree with the (adjusted) rotation record.
pub(super) struct VoteConsistency;

impl Invariant for VoteConsistency {
    fn id(&self) -> InvariantId {
        InvariantId::VoteConsistency
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for event in &state.events {
            if !matches!(event.role, Role::Leader | Role::Validator) {
                continue;
            }
            let (Some(round), Some(vote)) = (event.round_index, event.vote) else {
                continue;
            };
            let Some(rotation) = state.rounds.last_rotation(round) else {
                continue;
            };
            // Slashed idle validators were replaced and are no longer in
            // the rotation; only present addresses are compared.
            if let Some(entry) = rotation.get(&event.address) {
                if entry.ballot.choice() != vote {
                    return Some(
                        Violation::new(
                            self.id(),
                            format!(
                                "event vote {vote:?} != rotation vote {:?} for {} in round {round}",
                                entry.ballot.choice(),
                                event.address
                            ),
                        )
                        .with("round", round as i128)
                        .with("sequence_id", event.sequence_id as i128),
                    );
                }
            }
        }
        None
    }
}

/// Participant counts per round follow the size tables by ordinal.
pub(super) struct RoundSizeConsistency;

impl Invariant for RoundSizeConsistency {
    fn id(&self) -> InvariantId {
        InvariantId::RoundSizeConsistency
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        let mut normal_seen = 0usize;
        let mut appeal_seen = 0usize;
        for (index, label) in state.labels.iter().enumerate() {
            let Some(rotation) = state.rounds.last_rotation(index) else {
                continue;
            };
            if rotation.is_empty() {
                continue;
            }
            let expected = if label.is_appeal() {
                let size = appeal_round_size(appeal_seen);
                appeal_seen += 1;
                size
            } else {
                let size = normal_round_size(normal_seen);
                normal_seen += 1;
                size
            };
            let actual = rotation.len() as u64;
            if actual != expected {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("round {index} ({label}) has {actual} seats, expected {expected}"),
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

/// Sequence ids strictly increase across the log.
pub(super) struct FeeEventOrdering;

impl Invariant for FeeEventOrdering {
    fn id(&self) -> InvariantId {
        InvariantId::FeeEventOrdering
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for pair in state.events.windows(2) {
            if pair[1].sequence_id <= pair[0].sequence_id {
                return Some(
                    Violation::new(
                        self.id(),
                        format!(
                            "sequence id {} follows {}",
                            pair[1].sequence_id, pair[0].sequence_id
                        ),
                    )
                    .with("sequence_id", pair[1].sequence_id as i128),
                );
            }
        }
        None
    }
}

/// Stake never moves during a transaction.
pub(super) struct StakeImmutability;

impl Invariant for StakeImmutability {
    fn id(&self) -> InvariantId {
        InvariantId::StakeImmutability
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        for event in &state.events {
            if event.staked_delta != 0 {
                return Some(
                    Violation::new(
                        self.id(),
                        format!("stake delta {} on event", event.staked_delta),
                    )
                    .with("sequence_id", event.sequence_id as i128)
                    .with("staked_delta", event.staked_delta as i128),
                );
            }
        }
        None
    }
}

/// Exactly one label per round, and event labels agree with the sequence.
pub(super) struct RoundLabelValidity;

impl Invariant for RoundLabelValidity {
    fn id(&self) -> InvariantId {
        InvariantId::RoundLabelValidity
    }

    fn check(&self, state: &TransactionState) -> Option<Violation> {
        if state.labels.len() != state.rounds.len() {
            return Some(
                Violation::new(
                    self.id(),
                    format!(
                        "{} labels for {} rounds",
                        state.labels.len(),
                        state.rounds.len()
                    ),
                )
                .with("labels", state.labels.len() as i128)
                .with("rounds", state.rounds.len() as i128),
            );
        }
        for event in &state.events {
            if let (Some(round), Some(label)) = (event.round_index, event.round_label) {
                let expected: Option<RoundLabel> = state.labels.get(round).copied();
                if expected != Some(label) {
                    return Some(
                        Violation::new(
                            self.id(),
                            format!("event label {label} != round label at {round}"),
                        )
                        .with("round", round as i128)
                        .with("sequence_id", event.sequence_id as i128),
                    );
                }
            }
        }
        None
    }
}
