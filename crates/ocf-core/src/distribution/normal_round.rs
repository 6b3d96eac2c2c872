//! Normal round: the leader proposed a result and validators voted on it.

use super::{settle_forfeited_leader_bond, DistributionCtx};
use crate::constants::PENALTY_REWARD_COEFFICIENT;
use crate::majority::{compute_majority, partition_validators, Majority};
use crate::model::{FeeEventLog, Role, RoundLabel, VoteChoice};

pub(super) fn apply(ctx: &DistributionCtx<'_>, round_index: usize, log: &mut FeeEventLog) {
    let label = RoundLabel::NormalRound;
    let Some(rotation) = ctx.last_rotation(round_index) else {
        return;
    };
    let vt = ctx.budget.validators_timeout;
    let lt = ctx.budget.leader_timeout;
    let majority = compute_majority(rotation);

    match majority {
        Majority::Undetermined => {
            // No outcome to judge anyone against: the leader is paid for
            // the proposal alone and every validator for showing up.
            if let Some(leader) = rotation.leader() {
                log.earn(
                    leader.address,
                    Some(round_index),
                    Some(label),
                    Role::Leader,
                    Some(leader.ballot.choice()),
                    lt,
                );
            }
            for entry in rotation.validators() {
                log.earn(
                    entry.address,
                    Some(round_index),
                    Some(label),
                    Role::Validator,
                    Some(entry.ballot.choice()),
                    vt,
                );
            }
        }
        _ => {
            if let Some(leader) = rotation.leader() {
                log.earn(
                    leader.address,
                    Some(round_index),
                    Some(label),
                    Role::Leader,
                    Some(leader.ballot.choice()),
                    lt + vt,
                );
            }
            let partition = partition_validators(rotation, majority);
            for address in &partition.majority {
                let entry = rotation.get(address).expect("partition address in rotation");
                log.earn(
                    *address,
                    Some(round_index),
                    Some(label),
                    Role::Validator,
                    Some(entry.ballot.choice()),
                    vt,
                );
            }
            for address in &partition.minority {
                let entry = rotation.get(address).expect("partition address in rotation");
                log.burn(
                    *address,
                    Some(round_index),
                    Some(label),
                    Role::Validator,
                    Some(entry.ballot.choice()),
                    PENALTY_REWARD_COEFFICIENT * vt,
                );
            }
        }
    }

    settle_forfeited_leader_bond(ctx, round_index, log);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Address, Appeal, Ballot, ContentHash, LeaderAction, Rotation, RotationEntry, Round,
        TransactionBudget, TransactionRounds, Vote,
    };

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    fn fixture(votes: &[VoteChoice]) -> TransactionRounds {
        let mut entries = vec![RotationEntry {
            address: addr(1),
            ballot: Ballot::Leader {
                action: LeaderAction::Receipt {
                    content_hash: ContentHash::DEFAULT,
                },
                vote: Vote::new(VoteChoice::Agree),
            },
        }];
        for (i, choice) in votes.iter().enumerate() {
            entries.push(RotationEntry {
                address: addr(10 + i as u8),
                ballot: Ballot::Validator(Vote::new(*choice)),
            });
        }
        TransactionRounds::new(vec![Round::from_rotation(Rotation::new(entries))])
    }

    fn budget() -> TransactionBudget {
        TransactionBudget::new(100, 200, Vec::<Appeal>::new(), addr(0xEE)).unwrap()
    }

    #[test]
    fn clear_majority_pays_leader_and_majority_and_burns_minority() {
        use VoteChoice::*;
        let rounds = fixture(&[Agree, Agree, Agree, Agree, Disagree]);
        let budget = budget();
        let labels = [RoundLabel::NormalRound];
        let ctx = DistributionCtx {
            rounds: &rounds,
            labels: &labels,
            budget: &budget,
        };
        let mut log = FeeEventLog::new();
        apply(&ctx, 0, &mut log);

        let events = log.events();
        assert_eq!(events.len(), 6);
        let leader = &events[0];
        assert_eq!((leader.role, leader.earned), (Role::Leader, 300));
        let earned: u64 = events.iter().map(|e| e.earned).sum();
        let burned: u64 = events.iter().map(|e| e.burned).sum();
        assert_eq!(earned, 300 + 4 * 200);
        assert_eq!(burned, 200);
    }

    #[test]
    fn undetermined_majority_pays_everyone_base_rates() {
        use VoteChoice::*;
        // Leader Agree + Disagree + Timeout tallies 1/1/1.
        let rounds = fixture(&[Disagree, Timeout]);
        let budget = budget();
        let labels = [RoundLabel::NormalRound];
        let ctx = DistributionCtx {
            rounds: &rounds,
            labels: &labels,
            budget: &budget,
        };
        let mut log = FeeEventLog::new();
        apply(&ctx, 0, &mut log);

        let events = log.events();
        assert_eq!(events.len(), 3);
        assert_eq!((events[0].role, events[0].earned), (Role::Leader, 100));
        assert!(events[1..].iter().all(|e| e.earned == 200 && e.burned == 0));
    }
}
