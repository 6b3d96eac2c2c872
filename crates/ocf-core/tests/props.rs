//! Property tests: determinism, label totality and conservation over
//! generated paths and varying budgets.

use proptest::prelude::*;

use ocf_core::invariants::InvariantRegistry;
use ocf_core::pipeline::process_transaction;
use ocf_core::projection::aggregates;
use ocf_generators::{build_transaction, FixtureParams, PathNode as N};

fn arb_path() -> impl Strategy<Value = Vec<N>> {
    use N::*;
    prop_oneof![
        Just(vec![LeaderReceiptMajorityAgree]),
        Just(vec![LeaderReceiptMajorityDisagree]),
        Just(vec![LeaderReceiptUndetermined]),
        Just(vec![LeaderTimeout]),
        Just(vec![LeaderReceiptMajorityAgree, ValidatorAppealSuccessful]),
        Just(vec![
            LeaderReceiptMajorityAgree,
            ValidatorAppealSuccessful,
            LeaderReceiptMajorityAgree,
        ]),
        Just(vec![
            LeaderReceiptMajorityAgree,
            ValidatorAppealUnsuccessful,
            LeaderReceiptMajorityAgree,
        ]),
        Just(vec![
            LeaderReceiptMajorityAgree,
            ValidatorAppealUnsuccessful,
            ValidatorAppealUnsuccessful,
        ]),
        Just(vec![
            LeaderReceiptUndetermined,
            LeaderAppealSuccessful,
            LeaderReceiptMajorityAgree,
        ]),
        Just(vec![
            LeaderReceiptMajorityDisagree,
            LeaderAppealUnsuccessful,
            LeaderReceiptUndetermined,
        ]),
        Just(vec![
            LeaderTimeout,
            LeaderAppealTimeoutSuccessful,
            LeaderReceiptMajorityAgree,
        ]),
        Just(vec![LeaderTimeout, LeaderAppealTimeoutUnsuccessful, LeaderTimeout]),
    ]
}

fn arb_params() -> impl Strategy<Value = FixtureParams> {
    // Validator timeouts at or above the leader timeout keep every label's
    // funding inside the authorization, as in production configurations.
    (1u64..=250).prop_flat_map(|leader_timeout| {
        (Just(leader_timeout), leader_timeout..=500).prop_map(
            |(leader_timeout, validators_timeout)| FixtureParams {
                leader_timeout,
                validators_timeout,
            },
        )
    })
}

proptest! {
    #[test]
    fn pipeline_is_deterministic(path in arb_path(), params in arb_params()) {
        let fixture = build_transaction(&path, params);
        let a = process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget);
        let b = process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget);
        prop_assert_eq!(a.events, b.events);
        prop_assert_eq!(a.labels, b.labels);
    }

    #[test]
    fn every_round_gets_exactly_one_label(path in arb_path(), params in arb_params()) {
        let fixture = build_transaction(&path, params);
        let state = process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget);
        prop_assert_eq!(state.labels.len(), fixture.rounds.len());
    }

    #[test]
    fn value_is_conserved(path in arb_path(), params in arb_params()) {
        let fixture = build_transaction(&path, params);
        let state = process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget);
        let agg = aggregates(&state.events);
        prop_assert_eq!(agg.cost, agg.earned + agg.burned);
    }

    #[test]
    fn no_invariant_is_violated(path in arb_path(), params in arb_params()) {
        let fixture = build_transaction(&path, params);
        let state = process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget);
        let violations = InvariantRegistry::standard().check_all(&state);
        prop_assert!(violations.is_empty(), "violations: {:?}", violations);
    }
}
