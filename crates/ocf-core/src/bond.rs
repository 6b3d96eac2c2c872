//! Appeal bond computation.
//!
//! A bond must cover the full cost of the appeal round it opens: every
//! appeal-round validator's timeout plus one leader timeout. The size is
//! looked up by the appeal's ordinal in the appeal-size table, not by its
//! raw round index.

use crate::model::{RoundLabel, TransactionBudget};
use crate::sizes::{appeal_ordinal, appeal_round_size};

/// Bond posted for the appeal at `appeal_index`.
///
/// Preconditions:
/// - `labels[appeal_index]` is an appeal label.
pub fn appeal_bond(
    labels: &[RoundLabel],
    appeal_index: usize,
    budget: &TransactionBudget,
) -> u64 {
    debug_assert!(
        labels[appeal_index].is_appeal(),
        "round {appeal_index} is not an appeal"
    );
    let size = appeal_round_size(appeal_ordinal(labels, appeal_index));
    size * budget.validators_timeout + budget.leader_timeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, RoundLabel as L};

    fn budget() -> TransactionBudget {
        TransactionBudget::new(100, 200, vec![], Address([0xEE; 20])).unwrap()
    }

    #[test]
    fn first_appeal_uses_first_table_entry() {
        let labels = [L::NormalRound, L::AppealValidatorUnsuccessful];
        assert_eq!(appeal_bond(&labels, 1, &budget()), 7 * 200 + 100);
    }

    #[test]
    fn chained_appeals_advance_the_table() {
        let labels = [
            L::NormalRound,
            L::AppealValidatorUnsuccessful,
            L::NormalRound,
            L::AppealValidatorUnsuccessful,
        ];
        assert_eq!(appeal_bond(&labels, 1, &budget()), 7 * 200 + 100);
        assert_eq!(appeal_bond(&labels, 3, &budget()), 13 * 200 + 100);
    }
}
