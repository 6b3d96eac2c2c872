//! Round-size table lookups.
//!
//! Normal and appeal rounds advance through separate size tables by their
//! ordinal within the label sequence; both tables saturate at their last
//! entry.

use crate::constants::{APPEAL_ROUND_SIZES, NORMAL_ROUND_SIZES};
use crate::model::RoundLabel;

/// Size of the `ordinal`-th normal round (zero-based).
pub fn normal_round_size(ordinal: usize) -> u64 {
    *NORMAL_ROUND_SIZES
        .get(ordinal)
        .unwrap_or(NORMAL_ROUND_SIZES.last().expect("table is non-empty"))
}

/// Size of the `ordinal`-th appeal round (zero-based).
pub fn appeal_round_size(ordinal: usize) -> u64 {
    *APPEAL_ROUND_SIZES
        .get(ordinal)
        .unwrap_or(APPEAL_ROUND_SIZES.last().expect("table is non-empty"))
}

/// Zero-based ordinal of the appeal at `round_index` among all
/// appeal-labeled rounds (equivalently: how many appeals precede it).
pub fn appeal_ordinal(labels: &[RoundLabel], round_index: usize) -> usize {
    labels[..round_index.min(labels.len())]
        .iter()
        .filter(|l| l.is_appeal())
        .count()
}

/// Zero-based ordinal of the non-appeal round at `round_index` among all
/// non-appeal rounds.
pub fn normal_ordinal(labels: &[RoundLabel], round_index: usize) -> usize {
    labels[..round_index.min(labels.len())]
        .iter()
        .filter(|l| !l.is_appeal())
        .count()
}

/// Expected size of the round at `round_index` given the label sequence.
pub fn round_size(labels: &[RoundLabel], round_index: usize) -> u64 {
    if labels[round_index].is_appeal() {
        appeal_round_size(appeal_ordinal(labels, round_index))
    } else {
        normal_round_size(normal_ordinal(labels, round_index))
    }
}
