//! Registry behavior: grouping, filtering, and detection of corrupted
//! states.

use ocf_core::invariants::{InvariantGroup, InvariantId, InvariantRegistry, Severity};
use ocf_core::pipeline::process_transaction;
use ocf_generators::{build_transaction, FixtureParams, PathNode as N};

fn clean_state() -> ocf_core::TransactionState {
    let fixture = build_transaction(
        &[
            N::LeaderReceiptMajorityAgree,
            N::ValidatorAppealUnsuccessful,
            N::LeaderReceiptMajorityAgree,
        ],
        FixtureParams::default(),
    );
    process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget)
}

#[test]
fn clean_state_passes_every_group() {
    let registry = InvariantRegistry::standard();
    let state = clean_state();
    for group in [
        InvariantGroup::Financial,
        InvariantGroup::State,
        InvariantGroup::Fairness,
        InvariantGroup::Performance,
    ] {
        assert!(registry.check_group(&state, group).is_empty());
    }
    assert!(registry.check_critical(&state).is_empty());
}

#[test]
fn tampered_earning_breaks_conservation() {
    let registry = InvariantRegistry::standard();
    let mut state = clean_state();
    // Inflate one earning without funding it.
    let event = state
        .events
        .iter_mut()
        .find(|e| e.earned > 0)
        .expect("some earning exists");
    event.earned += 1;

    let violations = registry.check_all(&state);
    assert!(violations
        .iter()
        .any(|v| v.id == InvariantId::ConservationOfValue));
    let critical = registry.check_critical(&state);
    assert!(critical.iter().all(|v| v.severity == Severity::Critical));
    assert!(!critical.is_empty());

    // The bitfield clears exactly the failing bits.
    let bits = registry.bitfield(&state);
    assert_eq!(bits & 1, 0);
}

#[test]
fn tampered_sequence_breaks_ordering() {
    let registry = InvariantRegistry::standard();
    let mut state = clean_state();
    let last = state.events.len() - 1;
    state.events[last].sequence_id = 0;

    let violations = registry.check_group(&state, InvariantGroup::Performance);
    assert!(violations
        .iter()
        .any(|v| v.id == InvariantId::FeeEventOrdering));
}

#[test]
fn tampered_stake_delta_is_detected() {
    let registry = InvariantRegistry::standard();
    let mut state = clean_state();
    state.events[0].staked_delta = 5;

    let violations = registry.check_all(&state);
    assert!(violations
        .iter()
        .any(|v| v.id == InvariantId::StakeImmutability));
}

#[test]
fn dropped_slash_event_is_detected() {
    use ocf_core::model::{Ballot, VoteChoice, Vote};
    let registry = InvariantRegistry::standard();

    // A fixture with one idle validator.
    let mut fixture = build_transaction(&[N::LeaderReceiptMajorityAgree], FixtureParams::default());
    let rotation = &mut fixture.rounds.rounds[0].rotations[0];
    rotation.entries[2].ballot = Ballot::Validator(Vote::new(VoteChoice::Idle));
    let mut state = process_transaction(&fixture.participants, &fixture.rounds, &fixture.budget);
    assert!(registry.check_all(&state).is_empty());

    // Remove the slash: the idle invariant must notice.
    state.events.retain(|e| e.slashed == 0);
    let violations = registry.check_all(&state);
    assert!(violations
        .iter()
        .any(|v| v.id == InvariantId::IdleSlashingCorrectness));
}

#[test]
fn violations_carry_numeric_context() {
    let registry = InvariantRegistry::standard();
    let mut state = clean_state();
    let event = state
        .events
        .iter_mut()
        .find(|e| e.earned > 0)
        .expect("some earning exists");
    event.earned += 7;

    let violations = registry.check_all(&state);
    let conservation = violations
        .iter()
        .find(|v| v.id == InvariantId::ConservationOfValue)
        .expect("conservation violated");
    assert!(conservation.context.contains_key("cost"));
    assert!(conservation.context.contains_key("earned"));
}
