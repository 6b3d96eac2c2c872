//! Per-round content classification.

use super::Prelim;
use crate::majority::{compute_majority, Majority};
use crate::model::{LeaderAction, Rotation, RoundLabel, TransactionRounds, VoteChoice};

/// Whether a rotation's vote pattern reads as an appeal round.
///
/// Leader appeals carry only `NotApplicable` votes; validator appeals carry
/// `Agree`/`Disagree` votes without any leader submission. A round with a
/// leader timeout or a leader receipt is never an appeal.
pub(crate) fn is_appeal_shaped(rotation: &Rotation) -> bool {
    if rotation.is_empty() {
        return false;
    }
    match rotation.leader_action() {
        Some(LeaderAction::Timeout) => return false,
        Some(LeaderAction::Receipt { .. }) => {
            // A receipt round where every follow-up vote is NA still reads
            // as a leader appeal; anything else is a normal round.
            return rotation
                .entries
                .iter()
                .all(|e| e.ballot.choice() == VoteChoice::NotApplicable);
        }
        None => {}
    }
    if rotation
        .entries
        .iter()
        .all(|e| e.ballot.choice() == VoteChoice::NotApplicable)
    {
        return true;
    }
    rotation.entries.iter().any(|e| {
        matches!(
            e.ballot.choice(),
            VoteChoice::Agree | VoteChoice::Disagree
        )
    })
}

fn majority_at(rounds: &TransactionRounds, index: usize) -> Majority {
    rounds
        .last_rotation(index)
        .map(compute_majority)
        .unwrap_or(Majority::Undetermined)
}

fn leader_action_at(rounds: &TransactionRounds, index: usize) -> Option<LeaderAction> {
    rounds
        .last_rotation(index)
        .and_then(Rotation::leader_action)
}

/// Classify an appeal round against its effective predecessor: the nearest
/// prior round that is not itself appeal-shaped (walking past any chain of
/// intermediate appeals).
fn classify_appeal(rounds: &TransactionRounds, index: usize) -> Prelim {
    if index == 0 {
        // An appeal cannot open a transaction.
        return Prelim::Resolved(RoundLabel::EmptyRound);
    }

    let mut origin = index - 1;
    while origin > 0 {
        match rounds.last_rotation(origin) {
            Some(rotation) if is_appeal_shaped(rotation) => origin -= 1,
            _ => break,
        }
    }

    let total = rounds.len();
    if leader_action_at(rounds, origin) == Some(LeaderAction::Timeout) {
        // Appeal against a timed-out leader: successful iff the next round
        // produced an actual result.
        let successful = index + 1 < total
            && leader_action_at(rounds, index + 1) != Some(LeaderAction::Timeout);
        return Prelim::Resolved(if successful {
            RoundLabel::AppealLeaderTimeoutSuccessful
        } else {
            RoundLabel::AppealLeaderTimeoutUnsuccessful
        });
    }

    let origin_majority = majority_at(rounds, origin);
    if matches!(origin_majority, Majority::Undetermined | Majority::Disagree) {
        // Leader appeal: the origin round rejected or failed to decide on
        // the leader's result. The appeal succeeds iff the deciding round
        // (the next one, or the appeal itself when it closes the
        // transaction) reaches a positive majority.
        let deciding = if index + 1 < total {
            majority_at(rounds, index + 1)
        } else {
            majority_at(rounds, index)
        };
        let successful = !matches!(deciding, Majority::Undetermined | Majority::Disagree);
        return Prelim::Resolved(if successful {
            RoundLabel::AppealLeaderSuccessful
        } else {
            RoundLabel::AppealLeaderUnsuccessful
        });
    }

    // Validator appeal: successful iff the appeal's own majority is
    // determined and contradicts the origin round.
    let appeal_majority = majority_at(rounds, index);
    let successful =
        appeal_majority != Majority::Undetermined && appeal_majority != origin_majority;
    Prelim::Resolved(if successful {
        RoundLabel::AppealValidatorSuccessful
    } else {
        RoundLabel::AppealValidatorUnsuccessful
    })
}

/// Preliminary classification of every round.
pub(crate) fn classify_rounds(rounds: &TransactionRounds) -> Vec<Prelim> {
    let total = rounds.len();
    let mut prelim = Vec::with_capacity(total);

    for index in 0..total {
        let rotation = match rounds.last_rotation(index) {
            Some(r) if !r.is_empty() => r,
            _ => {
                prelim.push(Prelim::Resolved(RoundLabel::EmptyRound));
                continue;
            }
        };

        let action = rotation.leader_action();

        if action == Some(LeaderAction::Timeout) {
            if total == 1 {
                prelim.push(Prelim::Resolved(RoundLabel::LeaderTimeout50Percent));
                continue;
            }
            // An opening timeout whose appeal fails back into another
            // timeout resolves early: the rewrite pass anchors its
            // bond-settlement chain on this label.
            if index == 0
                && index + 2 < total
                && rounds
                    .last_rotation(1)
                    .is_some_and(is_appeal_shaped)
                && leader_action_at(rounds, 2) == Some(LeaderAction::Timeout)
            {
                prelim.push(Prelim::Resolved(RoundLabel::LeaderTimeout50Percent));
                continue;
            }
        }

        if is_appeal_shaped(rotation) {
            prelim.push(classify_appeal(rounds, index));
        } else {
            match action {
                Some(LeaderAction::Timeout) => prelim.push(Prelim::LeaderTimeout),
                _ => prelim.push(Prelim::Resolved(RoundLabel::NormalRound)),
            }
        }
    }

    prelim
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Address, Ballot, ContentHash, RotationEntry, Round, Vote};

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    fn validator(b: u8, choice: VoteChoice) -> RotationEntry {
        RotationEntry {
            address: addr(b),
            ballot: Ballot::Validator(Vote::new(choice)),
        }
    }

    fn receipt_leader(b: u8, choice: VoteChoice) -> RotationEntry {
        RotationEntry {
            address: addr(b),
            ballot: Ballot::Leader {
                action: LeaderAction::Receipt {
                    content_hash: ContentHash::DEFAULT,
                },
                vote: Vote::new(choice),
            },
        }
    }

    fn timeout_leader(b: u8) -> RotationEntry {
        RotationEntry {
            address: addr(b),
            ballot: Ballot::Leader {
                action: LeaderAction::Timeout,
                vote: Vote::new(VoteChoice::NotApplicable),
            },
        }
    }

    #[test]
    fn receipt_round_is_not_appeal_shaped() {
        let r = Rotation::new(vec![
            receipt_leader(1, VoteChoice::Agree),
            validator(2, VoteChoice::Agree),
        ]);
        assert!(!is_appeal_shaped(&r));
    }

    #[test]
    fn all_na_round_is_appeal_shaped() {
        let r = Rotation::new(vec![
            validator(1, VoteChoice::NotApplicable),
            validator(2, VoteChoice::NotApplicable),
        ]);
        assert!(is_appeal_shaped(&r));
    }

    #[test]
    fn leaderless_vote_round_is_appeal_shaped() {
        let r = Rotation::new(vec![
            validator(1, VoteChoice::Agree),
            validator(2, VoteChoice::Disagree),
        ]);
        assert!(is_appeal_shaped(&r));
    }

    #[test]
    fn timeout_round_is_never_appeal_shaped() {
        let r = Rotation::new(vec![timeout_leader(1), validator(2, VoteChoice::Agree)]);
        assert!(!is_appeal_shaped(&r));
    }

    #[test]
    fn sole_leader_timeout_classifies_to_half_pay() {
        let rounds = TransactionRounds::new(vec![Round::from_rotation(Rotation::new(vec![
            timeout_leader(1),
            validator(2, VoteChoice::Agree),
        ]))]);
        let prelim = classify_rounds(&rounds);
        assert_eq!(
            prelim,
            vec![Prelim::Resolved(RoundLabel::LeaderTimeout50Percent)]
        );
    }
}
