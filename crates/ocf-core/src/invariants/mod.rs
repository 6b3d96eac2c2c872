//! The invariant registry: 22 quantified properties over the final
//! transaction state.
//!
//! Invariants are first-class values with a single total
//! `check(state) -> Option<Violation>` method and no cross-invariant
//! dependencies, so they can be run all together, by group, or filtered to
//! the critical set. Violations are values returned to the caller, never
//! errors.

mod fairness;
mod financial;
mod state_checks;

use std::collections::BTreeMap;
use std::fmt;

use crate::pipeline::TransactionState;

/// Stable identifiers for the registry's invariants. The declaration order
/// is the persisted bitfield order and is additive-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InvariantId {
    ConservationOfValue,
    NonNegativeBalances,
    AppealBondCoverage,
    MajorityMinorityConsistency,
    RoleExclusivity,
    SequentialProcessing,
    AppealFollowsNormal,
    BurnNonNegativity,
    RefundNonNegativity,
    VoteConsistency,
    IdleSlashingCorrectness,
    DeterministicViolationSlashing,
    LeaderTimeoutEarningLimits,
    AppealBondConsistency,
    RoundSizeConsistency,
    FeeEventOrdering,
    StakeImmutability,
    RoundLabelValidity,
    NoDoublePenalties,
    EarningJustification,
    CostAccounting,
    SlashingProportionality,
}

impl InvariantId {
    pub const ALL: [InvariantId; 22] = [
        InvariantId::ConservationOfValue,
        InvariantId::NonNegativeBalances,
        InvariantId::AppealBondCoverage,
        InvariantId::MajorityMinorityConsistency,
        InvariantId::RoleExclusivity,
        InvariantId::SequentialProcessing,
        InvariantId::AppealFollowsNormal,
        InvariantId::BurnNonNegativity,
        InvariantId::RefundNonNegativity,
        InvariantId::VoteConsistency,
        InvariantId::IdleSlashingCorrectness,
        InvariantId::DeterministicViolationSlashing,
        InvariantId::LeaderTimeoutEarningLimits,
        InvariantId::AppealBondConsistency,
        InvariantId::RoundSizeConsistency,
        InvariantId::FeeEventOrdering,
        InvariantId::StakeImmutability,
        InvariantId::RoundLabelValidity,
        InvariantId::NoDoublePenalties,
        InvariantId::EarningJustification,
        InvariantId::CostAccounting,
        InvariantId::SlashingProportionality,
    ];

    /// Bit position in the persisted invariant bitfield.
    pub fn bit(self) -> u32 {
        Self::ALL
            .iter()
            .position(|i| *i == self)
            .expect("id listed in ALL") as u32
    }

    /// Stable wire name, shared with the persisted lookup tables.
    pub fn name(self) -> &'static str {
        match self {
            InvariantId::ConservationOfValue => "conservation_of_value",
            InvariantId::NonNegativeBalances => "non_negative_balances",
            InvariantId::AppealBondCoverage => "appeal_bond_coverage",
            InvariantId::MajorityMinorityConsistency => "majority_minority_consistency",
            InvariantId::RoleExclusivity => "role_exclusivity",
            InvariantId::SequentialProcessing => "sequential_processing",
            InvariantId::AppealFollowsNormal => "appeal_follows_normal",
            InvariantId::BurnNonNegativity => "burn_non_negativity",
            InvariantId::RefundNonNegativity => "refund_non_negativity",
            InvariantId::VoteConsistency => "vote_consistency",
            InvariantId::IdleSlashingCorrectness => "idle_slashing_correctness",
            InvariantId::DeterministicViolationSlashing => "deterministic_violation_slashing",
            InvariantId::LeaderTimeoutEarningLimits => "leader_timeout_earning_limits",
            InvariantId::AppealBondConsistency => "appeal_bond_consistency",
            InvariantId::RoundSizeConsistency => "round_size_consistency",
            InvariantId::FeeEventOrdering => "fee_event_ordering",
            InvariantId::StakeImmutability => "stake_immutability",
            InvariantId::RoundLabelValidity => "round_label_validity",
            InvariantId::NoDoublePenalties => "no_double_penalties",
            InvariantId::EarningJustification => "earning_justification",
            InvariantId::CostAccounting => "cost_accounting",
            InvariantId::SlashingProportionality => "slashing_proportionality",
        }
    }

    pub fn group(self) -> InvariantGroup {
        use InvariantId::*;
        match self {
            ConservationOfValue | NonNegativeBalances | AppealBondCoverage
            | BurnNonNegativity | RefundNonNegativity | AppealBondConsistency
            | CostAccounting => InvariantGroup::Financial,
            AppealFollowsNormal | VoteConsistency | RoundSizeConsistency | StakeImmutability
            | RoundLabelValidity => InvariantGroup::State,
            MajorityMinorityConsistency | RoleExclusivity | IdleSlashingCorrectness
            | DeterministicViolationSlashing | LeaderTimeoutEarningLimits | NoDoublePenalties
            | EarningJustification | SlashingProportionality => InvariantGroup::Fairness,
            SequentialProcessing | FeeEventOrdering => InvariantGroup::Performance,
        }
    }

    pub fn severity(self) -> Severity {
        use InvariantId::*;
        match self {
            ConservationOfValue | NonNegativeBalances | RefundNonNegativity | CostAccounting => {
                Severity::Critical
            }
            AppealBondCoverage | MajorityMinorityConsistency | RoleExclusivity
            | AppealFollowsNormal | IdleSlashingCorrectness | DeterministicViolationSlashing
            | AppealBondConsistency | NoDoublePenalties | EarningJustification
            | SlashingProportionality => Severity::High,
            SequentialProcessing | VoteConsistency | LeaderTimeoutEarningLimits
            | RoundSizeConsistency | FeeEventOrdering | StakeImmutability => Severity::Medium,
            BurnNonNegativity | RoundLabelValidity => Severity::Low,
        }
    }
}

impl fmt::Display for InvariantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvariantGroup {
    Financial,
    State,
    Fairness,
    Performance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// A failed invariant, with numeric evidence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub id: InvariantId,
    pub message: String,
    pub severity: Severity,
    pub context: BTreeMap<String, i128>,
}

impl Violation {
    pub fn new(id: InvariantId, message: impl Into<String>) -> Violation {
        Violation {
            id,
            message: message.into(),
            severity: id.severity(),
            context: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: i128) -> Violation {
        self.context.insert(key.into(), value);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {}: {}", self.severity, self.id, self.message)
    }
}

/// One quantified property over the final state.
pub trait Invariant {
    fn id(&self) -> InvariantId;

    /// Total: returns `Some` iff the property is violated.
    fn check(&self, state: &TransactionState) -> Option<Violation>;
}

/// The full, ordered invariant set.
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry holding all 22 invariants in bitfield order.
    pub fn standard() -> InvariantRegistry {
        let invariants: Vec<Box<dyn Invariant>> = vec![
            Box::new(financial::ConservationOfValue),
            Box::new(financial::NonNegativeBalances),
            Box::new(financial::AppealBondCoverage),
            Box::new(fairness::MajorityMinorityConsistency),
            Box::new(fairness::RoleExclusivity),
            Box::new(state_checks::SequentialProcessing),
            Box::new(state_checks::AppealFollowsNormal),
            Box::new(financial::BurnNonNegativity),
            Box::new(financial::RefundNonNegativity),
            Box::new(state_checks::VoteConsistency),
            Box::new(fairness::IdleSlashingCorrectness),
            Box::new(fairness::DeterministicViolationSlashing),
            Box::new(fairness::LeaderTimeoutEarningLimits),
            Box::new(financial::AppealBondConsistency),
            Box::new(state_checks::RoundSizeConsistency),
            Box::new(state_checks::FeeEventOrdering),
            Box::new(state_checks::StakeImmutability),
            Box::new(state_checks::RoundLabelValidity),
            Box::new(fairness::NoDoublePenalties),
            Box::new(fairness::EarningJustification),
            Box::new(financial::CostAccounting),
            Box::new(fairness::SlashingProportionality),
        ];
        debug_assert_eq!(invariants.len(), InvariantId::ALL.len());
        InvariantRegistry { invariants }
    }

    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }

    /// Check every invariant, in bitfield order.
    pub fn check_all(&self, state: &TransactionState) -> Vec<Violation> {
        self.invariants
            .iter()
            .filter_map(|i| i.check(state))
            .collect()
    }

    /// Check only the invariants of one group.
    pub fn check_group(&self, state: &TransactionState, group: InvariantGroup) -> Vec<Violation> {
        self.invariants
            .iter()
            .filter(|i| i.id().group() == group)
            .filter_map(|i| i.check(state))
            .collect()
    }

    /// Check only the critical invariants.
    pub fn check_critical(&self, state: &TransactionState) -> Vec<Violation> {
        self.invariants
            .iter()
            .filter(|i| i.id().severity() == Severity::Critical)
            .filter_map(|i| i.check(state))
            .collect()
    }

    /// Bitfield with bit `k` set iff invariant `k` passes.
    pub fn bitfield(&self, state: &TransactionState) -> u32 {
        let mut bits = 0u32;
        for invariant in &self.invariants {
            if invariant.check(state).is_none() {
                bits |= 1 << invariant.id().bit();
            }
        }
        bits
    }
}

/// Check the full standard registry against a final state.
pub fn check_all_invariants(state: &TransactionState) -> Vec<Violation> {
    InvariantRegistry::standard().check_all(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions_follow_declaration_order() {
        assert_eq!(InvariantId::ConservationOfValue.bit(), 0);
        assert_eq!(InvariantId::SlashingProportionality.bit(), 21);
    }

    #[test]
    fn standard_registry_holds_all_invariants_in_order() {
        let registry = InvariantRegistry::standard();
        assert_eq!(registry.len(), 22);
        for (i, invariant) in registry.invariants.iter().enumerate() {
            assert_eq!(invariant.id().bit() as usize, i);
        }
    }

    #[test]
    fn violation_carries_context() {
        let v = Violation::new(InvariantId::ConservationOfValue, "mismatch")
            .with("expected", 10)
            .with("actual", 9);
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.context["expected"], 10);
    }
}
