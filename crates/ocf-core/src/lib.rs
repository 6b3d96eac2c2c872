//! OCF core: a deterministic fee-distribution engine for an appeal-based
//! optimistic consensus protocol.
//!
//! Transactions alternate between *normal* rounds (a leader proposes a
//! result, validators vote) and *appeal* rounds (a dissenting party posts a
//! bond to challenge the prior round). Given the ground-truth record of how
//! each round unfolded, the pipeline computes who earns, who pays, who is
//! slashed, and how much the sender is refunded:
//!
//! ```text
//! (participants, rounds, budget)
//!   --> [idle / violation adjust] --> [label rounds]
//!   --> [distribute round x N]    --> fee event log
//!   --> [refund]                  --> fee event log'
//!   --> [invariant check]         --> violations
//! ```
//!
//! The whole pipeline is a pure function on the caller's thread: no I/O, no
//! clocks, no randomness. Violations discovered by the invariant registry
//! are values returned to the caller, never errors.

use thiserror::Error;

pub mod adjust;
pub mod bond;
pub mod constants;
pub mod distribution;
pub mod invariants;
pub mod labeling;
pub mod majority;
pub mod model;
pub mod pipeline;
pub mod projection;
pub mod refund;
pub mod sizes;
pub mod wire;

pub use adjust::{Adjustment, AdjustmentKind};
pub use invariants::{
    check_all_invariants, InvariantGroup, InvariantId, InvariantRegistry, Severity, Violation,
};
pub use majority::Majority;
pub use model::{
    Address, Appeal, Ballot, ContentHash, FeeEvent, LeaderAction, Role, Rotation, Round,
    RoundLabel, StakingDistribution, TransactionBudget, TransactionRounds, Vote, VoteChoice,
};
pub use pipeline::{process_transaction, TransactionState};

/// Unified error type for OCF core operations.
///
/// The pipeline itself is total; errors only arise at the construction
/// boundary (budget validation, wire decoding).
#[derive(Debug, Error)]
pub enum OcfError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, OcfError>;
