//! Label sequences over generated paths.

use ocf_core::labeling::label_rounds;
use ocf_core::model::RoundLabel as L;
use ocf_generators::{build_transaction, FixtureParams, PathNode as N};

fn labels_of(path: &[N]) -> Vec<L> {
    let fixture = build_transaction(path, FixtureParams::default());
    label_rounds(&fixture.rounds)
}

#[test]
fn single_normal_rounds() {
    assert_eq!(labels_of(&[N::LeaderReceiptMajorityAgree]), vec![L::NormalRound]);
    assert_eq!(labels_of(&[N::LeaderReceiptUndetermined]), vec![L::NormalRound]);
    assert_eq!(labels_of(&[N::LeaderReceiptMajorityDisagree]), vec![L::NormalRound]);
    assert_eq!(
        labels_of(&[N::LeaderTimeout]),
        vec![L::LeaderTimeout50Percent]
    );
}

#[test]
fn successful_validator_appeal_skips_its_target() {
    assert_eq!(
        labels_of(&[N::LeaderReceiptMajorityAgree, N::ValidatorAppealSuccessful]),
        vec![L::SkipRound, L::AppealValidatorSuccessful]
    );
    assert_eq!(
        labels_of(&[
            N::LeaderReceiptMajorityAgree,
            N::ValidatorAppealSuccessful,
            N::LeaderReceiptMajorityAgree,
        ]),
        vec![L::SkipRound, L::AppealValidatorSuccessful, L::NormalRound]
    );
}

#[test]
fn successful_leader_appeal_skips_its_target() {
    assert_eq!(
        labels_of(&[
            N::LeaderReceiptUndetermined,
            N::LeaderAppealSuccessful,
            N::LeaderReceiptMajorityAgree,
        ]),
        vec![L::SkipRound, L::AppealLeaderSuccessful, L::NormalRound]
    );
}

#[test]
fn unsuccessful_leader_appeal_leads_to_a_bond_split() {
    assert_eq!(
        labels_of(&[
            N::LeaderReceiptMajorityDisagree,
            N::LeaderAppealUnsuccessful,
            N::LeaderReceiptUndetermined,
        ]),
        vec![
            L::NormalRound,
            L::AppealLeaderUnsuccessful,
            L::SplitPreviousAppealBond,
        ]
    );
}

#[test]
fn unsuccessful_validator_appeal_before_a_decided_round_does_not_split() {
    assert_eq!(
        labels_of(&[
            N::LeaderReceiptMajorityAgree,
            N::ValidatorAppealUnsuccessful,
            N::LeaderReceiptMajorityAgree,
        ]),
        vec![
            L::NormalRound,
            L::AppealValidatorUnsuccessful,
            L::NormalRound,
        ]
    );
}

#[test]
fn successful_timeout_appeal_grants_the_150_percent_round() {
    assert_eq!(
        labels_of(&[
            N::LeaderTimeout,
            N::LeaderAppealTimeoutSuccessful,
            N::LeaderReceiptMajorityAgree,
        ]),
        vec![
            L::SkipRound,
            L::AppealLeaderTimeoutSuccessful,
            L::LeaderTimeout150PreviousNormalRound,
        ]
    );
}

#[test]
fn failed_timeout_appeals_chain_half_bond_settlements() {
    assert_eq!(
        labels_of(&[N::LeaderTimeout, N::LeaderAppealTimeoutUnsuccessful, N::LeaderTimeout]),
        vec![
            L::LeaderTimeout50Percent,
            L::AppealLeaderTimeoutUnsuccessful,
            L::LeaderTimeout50PreviousAppealBond,
        ]
    );
    assert_eq!(
        labels_of(&[
            N::LeaderTimeout,
            N::LeaderAppealTimeoutUnsuccessful,
            N::LeaderTimeout,
            N::LeaderAppealTimeoutUnsuccessful,
            N::LeaderTimeout,
        ]),
        vec![
            L::LeaderTimeout50Percent,
            L::AppealLeaderTimeoutUnsuccessful,
            L::LeaderTimeout50PreviousAppealBond,
            L::AppealLeaderTimeoutUnsuccessful,
            L::LeaderTimeout50PreviousAppealBond,
        ]
    );
}

#[test]
fn chained_unsuccessful_validator_appeals_keep_their_labels() {
    assert_eq!(
        labels_of(&[
            N::LeaderReceiptMajorityAgree,
            N::ValidatorAppealUnsuccessful,
            N::ValidatorAppealUnsuccessful,
        ]),
        vec![
            L::NormalRound,
            L::AppealValidatorUnsuccessful,
            L::AppealValidatorUnsuccessful,
        ]
    );
}

#[test]
fn terminal_timeout_after_a_successful_appeal_settles_as_half_pay() {
    assert_eq!(
        labels_of(&[
            N::LeaderReceiptUndetermined,
            N::LeaderAppealSuccessful,
            N::LeaderTimeout,
        ]),
        vec![
            L::SkipRound,
            L::AppealLeaderSuccessful,
            L::LeaderTimeout50Percent,
        ]
    );
}

#[test]
fn empty_round_is_labeled_empty() {
    use ocf_core::model::{Round, TransactionRounds};
    let rounds = TransactionRounds::new(vec![Round::new(vec![])]);
    assert_eq!(label_rounds(&rounds), vec![L::EmptyRound]);
}
