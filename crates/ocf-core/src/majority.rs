//! Vote tallying.
//!
//! The tally covers every effective choice in a rotation, including the
//! leader's follow-up vote on its own submission. `Idle` and
//! `NotApplicable` never count: idle entries are rewritten by the adjuster
//! before labeling, and `NotApplicable` marks rounds where no vote is
//! taken.

use crate::model::{Address, Rotation, VoteChoice};

/// The winning vote of a rotation, or `Undetermined` when no unique strict
/// maximum exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Majority {
    Agree,
    Disagree,
    Timeout,
    Undetermined,
}

impl Majority {
    /// Whether `choice` counts as a vote for this majority.
    pub fn matches(self, choice: VoteChoice) -> bool {
        matches!(
            (self, choice),
            (Majority::Agree, VoteChoice::Agree)
                | (Majority::Disagree, VoteChoice::Disagree)
                | (Majority::Timeout, VoteChoice::Timeout)
        )
    }
}

/// Tally a rotation. A choice wins iff its count is strictly greater than
/// both others.
pub fn compute_majority(rotation: &Rotation) -> Majority {
    let (mut agree, mut disagree, mut timeout) = (0u32, 0u32, 0u32);
    for entry in &rotation.entries {
        match entry.ballot.choice() {
            VoteChoice::Agree => agree += 1,
            VoteChoice::Disagree => disagree += 1,
            VoteChoice::Timeout => timeout += 1,
            VoteChoice::Idle | VoteChoice::NotApplicable => {}
        }
    }
    if agree > disagree && agree > timeout {
        Majority::Agree
    } else if disagree > agree && disagree > timeout {
        Majority::Disagree
    } else if timeout > agree && timeout > disagree {
        Majority::Timeout
    } else {
        Majority::Undetermined
    }
}

/// Validator entries split against a decided majority, in rotation order.
/// Entries voting `Idle` or `NotApplicable` fall in neither list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VotePartition {
    pub majority: Vec<Address>,
    pub minority: Vec<Address>,
}

/// Partition the non-leader entries of a rotation by the given majority.
/// With an `Undetermined` majority both lists are empty.
pub fn partition_validators(rotation: &Rotation, majority: Majority) -> VotePartition {
    let mut partition = VotePartition::default();
    if majority == Majority::Undetermined {
        return partition;
    }
    for entry in rotation.validators() {
        let choice = entry.ballot.choice();
        if majority.matches(choice) {
            partition.majority.push(entry.address);
        } else if matches!(
            choice,
            VoteChoice::Agree | VoteChoice::Disagree | VoteChoice::Timeout
        ) {
            partition.minority.push(entry.address);
        }
    }
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Ballot, ContentHash, LeaderAction, RotationEntry, Vote};

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    fn validator(b: u8, choice: VoteChoice) -> RotationEntry {
        RotationEntry {
            address: addr(b),
            ballot: Ballot::Validator(Vote::new(choice)),
        }
    }

    fn leader(b: u8, choice: VoteChoice) -> RotationEntry {
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

    #[test]
    fn unique_strict_maximum_wins() {
        let r = Rotation::new(vec![
            validator(1, VoteChoice::Agree),
            validator(2, VoteChoice::Agree),
            validator(3, VoteChoice::Disagree),
        ]);
        assert_eq!(compute_majority(&r), Majority::Agree);
    }

    #[test]
    fn tie_is_undetermined() {
        let r = Rotation::new(vec![
            validator(1, VoteChoice::Agree),
            validator(2, VoteChoice::Disagree),
        ]);
        assert_eq!(compute_majority(&r), Majority::Undetermined);
    }

    #[test]
    fn leader_follow_up_vote_counts() {
        let r = Rotation::new(vec![
            leader(1, VoteChoice::Agree),
            validator(2, VoteChoice::Agree),
            validator(3, VoteChoice::Disagree),
        ]);
        assert_eq!(compute_majority(&r), Majority::Agree);
    }

    #[test]
    fn idle_and_na_are_excluded() {
        let r = Rotation::new(vec![
            validator(1, VoteChoice::Idle),
            validator(2, VoteChoice::NotApplicable),
            validator(3, VoteChoice::Disagree),
        ]);
        assert_eq!(compute_majority(&r), Majority::Disagree);
    }

    #[test]
    fn partition_excludes_leader_and_abstainers() {
        let r = Rotation::new(vec![
            leader(1, VoteChoice::Agree),
            validator(2, VoteChoice::Agree),
            validator(3, VoteChoice::Timeout),
            validator(4, VoteChoice::NotApplicable),
        ]);
        let p = partition_validators(&r, Majority::Agree);
        assert_eq!(p.majority, vec![addr(2)]);
        assert_eq!(p.minority, vec![addr(3)]);
    }

    #[test]
    fn undetermined_partition_is_empty() {
        let r = Rotation::new(vec![
            validator(1, VoteChoice::Agree),
            validator(2, VoteChoice::Disagree),
        ]);
        let p = partition_validators(&r, Majority::Undetermined);
        assert!(p.majority.is_empty() && p.minority.is_empty());
    }
}
