//! Round labeling: content-based classification followed by contextual
//! rewriting.
//!
//! Classification inspects each round in isolation (plus the effective
//! predecessor chain for appeals) and may produce the intermediate
//! `LeaderTimeout` marker. The rewriter then resolves every contextual
//! dependency; afterwards each round carries exactly one label from the
//! closed [`RoundLabel`] set.

mod classify;
mod rewrite;

use tracing::debug;

use crate::model::{RoundLabel, TransactionRounds};

/// Intermediate classification: either a final label or a timed-out round
/// whose meaning depends on what follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Prelim {
    Resolved(RoundLabel),
    LeaderTimeout,
}

/// Assign one label to every round.
pub fn label_rounds(rounds: &TransactionRounds) -> Vec<RoundLabel> {
    let prelim = classify::classify_rounds(rounds);
    let labels = rewrite::apply_rewrites(prelim, rounds);
    debug!(rounds = rounds.len(), "round labeling complete");
    debug_assert_eq!(labels.len(), rounds.len());
    labels
}
