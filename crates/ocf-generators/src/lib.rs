//! Deterministic transaction fixtures for the OCF fee pipeline.
//!
//! Converts a symbolic transaction path (a sequence of round-outcome
//! nodes) into concrete rounds, a budget and a participant pool. All
//! addresses come from a domain-separated SHA-256 counter generator, so a
//! given path always produces the identical fixture.

use sha2::{Digest, Sha256};

use ocf_core::model::{
    Address, Appeal, Ballot, ContentHash, LeaderAction, Rotation, RotationEntry, Round,
    TransactionBudget, TransactionRounds, Vote, VoteChoice,
};
use ocf_core::sizes::{appeal_round_size, normal_round_size};

const ADDRESS_DOMAIN: &[u8] = b"OCF_FIXTURE_ADDRESS_V1";

/// Symbolic round outcomes, with the wire node indices of the persisted
/// lookup table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathNode {
    Start,
    LeaderReceiptMajorityAgree,
    LeaderReceiptUndetermined,
    LeaderReceiptMajorityDisagree,
    LeaderReceiptMajorityTimeout,
    LeaderTimeout,
    ValidatorAppealSuccessful,
    ValidatorAppealUnsuccessful,
    LeaderAppealSuccessful,
    LeaderAppealUnsuccessful,
    LeaderAppealTimeoutSuccessful,
    LeaderAppealTimeoutUnsuccessful,
    End,
}

impl PathNode {
    pub fn wire_index(self) -> u16 {
        match self {
            PathNode::Start => 0,
            PathNode::LeaderReceiptMajorityAgree => 1,
            PathNode::LeaderReceiptUndetermined => 2,
            PathNode::LeaderReceiptMajorityDisagree => 3,
            PathNode::LeaderReceiptMajorityTimeout => 4,
            PathNode::LeaderTimeout => 5,
            PathNode::ValidatorAppealSuccessful => 6,
            PathNode::ValidatorAppealUnsuccessful => 7,
            PathNode::LeaderAppealSuccessful => 8,
            PathNode::LeaderAppealUnsuccessful => 9,
            PathNode::LeaderAppealTimeoutSuccessful => 10,
            PathNode::LeaderAppealTimeoutUnsuccessful => 11,
            PathNode::End => 12,
        }
    }

    pub fn is_appeal(self) -> bool {
        matches!(
            self,
            PathNode::ValidatorAppealSuccessful
                | PathNode::ValidatorAppealUnsuccessful
                | PathNode::LeaderAppealSuccessful
                | PathNode::LeaderAppealUnsuccessful
                | PathNode::LeaderAppealTimeoutSuccessful
                | PathNode::LeaderAppealTimeoutUnsuccessful
        )
    }

    fn is_leader_appeal(self) -> bool {
        matches!(
            self,
            PathNode::LeaderAppealSuccessful
                | PathNode::LeaderAppealUnsuccessful
                | PathNode::LeaderAppealTimeoutSuccessful
                | PathNode::LeaderAppealTimeoutUnsuccessful
        )
    }
}

/// Deterministic address source.
#[derive(Clone, Debug, Default)]
pub struct AddressGen {
    counter: u64,
}

impl AddressGen {
    pub fn new() -> AddressGen {
        AddressGen::default()
    }

    pub fn next(&mut self) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(ADDRESS_DOMAIN);
        hasher.update(self.counter.to_le_bytes());
        self.counter += 1;
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address(bytes)
    }

    pub fn take(&mut self, n: usize) -> Vec<Address> {
        (0..n).map(|_| self.next()).collect()
    }
}

/// Tunable fixture parameters.
#[derive(Clone, Copy, Debug)]
pub struct FixtureParams {
    pub leader_timeout: u64,
    pub validators_timeout: u64,
}

impl Default for FixtureParams {
    fn default() -> FixtureParams {
        FixtureParams {
            leader_timeout: 100,
            validators_timeout: 200,
        }
    }
}

/// A complete, processable transaction fixture.
#[derive(Clone, Debug)]
pub struct Fixture {
    pub rounds: TransactionRounds,
    pub budget: TransactionBudget,
    pub participants: Vec<Address>,
    pub sender: Address,
    pub appealant: Address,
    /// Wire node indices of the generating path, including markers.
    pub path_indices: Vec<u16>,
}

fn leader_entry(address: Address, action: LeaderAction, choice: VoteChoice) -> RotationEntry {
    RotationEntry {
        address,
        ballot: Ballot::Leader {
            action,
            vote: Vote::new(choice),
        },
    }
}

fn validator_entry(address: Address, choice: VoteChoice) -> RotationEntry {
    RotationEntry {
        address,
        ballot: Ballot::Validator(Vote::new(choice)),
    }
}

fn receipt() -> LeaderAction {
    LeaderAction::Receipt {
        content_hash: ContentHash::DEFAULT,
    }
}

/// A receipt round where the leader's side reaches `choice` with a strict
/// majority; the rest alternate between the two losing choices.
fn majority_round(addresses: &[Address], choice: VoteChoice) -> Rotation {
    let size = addresses.len();
    let majority_count = size / 2 + 1;
    let (alt_a, alt_b) = match choice {
        VoteChoice::Agree => (VoteChoice::Disagree, VoteChoice::Timeout),
        VoteChoice::Disagree => (VoteChoice::Agree, VoteChoice::Timeout),
        _ => (VoteChoice::Agree, VoteChoice::Disagree),
    };
    let mut entries = vec![leader_entry(addresses[0], receipt(), choice)];
    for (i, address) in addresses.iter().enumerate().skip(1) {
        let vote = if i < majority_count {
            choice
        } else if (i - majority_count) % 2 == 0 {
            alt_a
        } else {
            alt_b
        };
        entries.push(validator_entry(*address, vote));
    }
    Rotation::new(entries)
}

/// A receipt round with no clear majority: validators split in thirds.
fn undetermined_round(addresses: &[Address]) -> Rotation {
    let mut entries = vec![leader_entry(addresses[0], receipt(), VoteChoice::Agree)];
    let validators = addresses.len() - 1;
    let third = validators / 3;
    for (i, address) in addresses.iter().enumerate().skip(1) {
        let slot = i - 1;
        let vote = if slot < third {
            VoteChoice::Agree
        } else if slot < 2 * third {
            VoteChoice::Disagree
        } else {
            VoteChoice::Timeout
        };
        entries.push(validator_entry(*address, vote));
    }
    Rotation::new(entries)
}

/// A round whose leader timed out; validators acknowledge the timeout.
fn leader_timeout_round(addresses: &[Address]) -> Rotation {
    let mut entries = vec![leader_entry(
        addresses[0],
        LeaderAction::Timeout,
        VoteChoice::NotApplicable,
    )];
    for address in &addresses[1..] {
        entries.push(validator_entry(*address, VoteChoice::Agree));
    }
    Rotation::new(entries)
}

/// An appeal round. Leader appeals take no vote; validator appeals vote to
/// confirm or overturn the previous normal round's majority.
fn appeal_round(node: PathNode, addresses: &[Address], prev_majority: VoteChoice) -> Rotation {
    let size = addresses.len();
    if node.is_leader_appeal() {
        return Rotation::new(
            addresses
                .iter()
                .map(|a| validator_entry(*a, VoteChoice::NotApplicable))
                .collect(),
        );
    }

    let overturn = node == PathNode::ValidatorAppealSuccessful;
    let majority_count = size / 2 + 1;
    let mut entries = Vec::with_capacity(size);
    match (overturn, prev_majority) {
        (true, VoteChoice::Agree) => {
            for (i, a) in addresses.iter().enumerate() {
                entries.push(validator_entry(
                    *a,
                    if i < majority_count {
                        VoteChoice::Disagree
                    } else {
                        VoteChoice::Agree
                    },
                ));
            }
        }
        (true, _) => {
            for (i, a) in addresses.iter().enumerate() {
                entries.push(validator_entry(
                    *a,
                    if i < majority_count {
                        VoteChoice::Agree
                    } else {
                        VoteChoice::Disagree
                    },
                ));
            }
        }
        (false, VoteChoice::Disagree) => {
            for (i, a) in addresses.iter().enumerate() {
                entries.push(validator_entry(
                    *a,
                    if i < majority_count {
                        VoteChoice::Disagree
                    } else {
                        VoteChoice::Agree
                    },
                ));
            }
        }
        (false, VoteChoice::Agree) => {
            for (i, a) in addresses.iter().enumerate() {
                entries.push(validator_entry(
                    *a,
                    if i < majority_count {
                        VoteChoice::Agree
                    } else {
                        VoteChoice::Disagree
                    },
                ));
            }
        }
        (false, _) => {
            // Confirm a timeout outcome: a strict timeout plurality.
            for (i, a) in addresses.iter().enumerate() {
                entries.push(validator_entry(
                    *a,
                    if i < majority_count {
                        VoteChoice::Timeout
                    } else if (i - majority_count) % 2 == 0 {
                        VoteChoice::Agree
                    } else {
                        VoteChoice::Disagree
                    },
                ));
            }
        }
    }
    Rotation::new(entries)
}

/// Build the transaction a path describes. Start/end markers are optional.
pub fn build_transaction(path: &[PathNode], params: FixtureParams) -> Fixture {
    let nodes: Vec<PathNode> = path
        .iter()
        .copied()
        .filter(|n| !matches!(n, PathNode::Start | PathNode::End))
        .collect();

    let mut gen = AddressGen::new();
    let sender = gen.next();
    let appealant = gen.next();
    let mut participants = vec![sender, appealant];

    let mut rounds = Vec::with_capacity(nodes.len());
    let mut appeals = Vec::new();
    let mut normal_count = 0usize;
    let mut appeal_count = 0usize;
    let mut last_normal_majority = VoteChoice::Agree;

    for node in &nodes {
        if node.is_appeal() {
            let size = appeal_round_size(appeal_count) as usize;
            let addresses = gen.take(size);
            participants.extend_from_slice(&addresses);
            rounds.push(Round::from_rotation(appeal_round(
                *node,
                &addresses,
                last_normal_majority,
            )));
            appeals.push(Appeal { appealant });
            appeal_count += 1;
        } else {
            let size = normal_round_size(normal_count) as usize;
            let addresses = gen.take(size);
            participants.extend_from_slice(&addresses);
            let rotation = match node {
                PathNode::LeaderReceiptMajorityAgree => {
                    last_normal_majority = VoteChoice::Agree;
                    majority_round(&addresses, VoteChoice::Agree)
                }
                PathNode::LeaderReceiptMajorityDisagree => {
                    last_normal_majority = VoteChoice::Disagree;
                    majority_round(&addresses, VoteChoice::Disagree)
                }
                PathNode::LeaderReceiptMajorityTimeout => {
                    last_normal_majority = VoteChoice::Timeout;
                    majority_round(&addresses, VoteChoice::Timeout)
                }
                PathNode::LeaderReceiptUndetermined => {
                    last_normal_majority = VoteChoice::Timeout;
                    undetermined_round(&addresses)
                }
                _ => leader_timeout_round(&addresses),
            };
            rounds.push(Round::from_rotation(rotation));
            normal_count += 1;
        }
    }

    // Spare addresses back the reserve pool for idle replacement.
    participants.extend(gen.take(8));

    let budget = TransactionBudget::new(
        params.leader_timeout,
        params.validators_timeout,
        appeals,
        sender,
    )
    .expect("fixture params are positive");

    Fixture {
        rounds: TransactionRounds::new(rounds),
        budget,
        participants,
        sender,
        appealant,
        path_indices: path.iter().map(|n| n.wire_index()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocf_core::majority::{compute_majority, Majority};

    #[test]
    fn addresses_are_deterministic() {
        let mut a = AddressGen::new();
        let mut b = AddressGen::new();
        assert_eq!(a.take(5), b.take(5));
    }

    #[test]
    fn majority_round_reaches_the_requested_outcome() {
        let mut gen = AddressGen::new();
        let addresses = gen.take(5);
        let rotation = majority_round(&addresses, VoteChoice::Disagree);
        assert_eq!(compute_majority(&rotation), Majority::Disagree);
    }

    #[test]
    fn undetermined_round_has_no_majority() {
        let mut gen = AddressGen::new();
        for size in [5usize, 11, 23, 47] {
            let addresses = gen.take(size);
            let rotation = undetermined_round(&addresses);
            assert_eq!(compute_majority(&rotation), Majority::Undetermined);
        }
    }

    #[test]
    fn fixture_sizes_follow_the_tables() {
        let fixture = build_transaction(
            &[
                PathNode::Start,
                PathNode::LeaderReceiptMajorityAgree,
                PathNode::ValidatorAppealUnsuccessful,
                PathNode::LeaderReceiptMajorityAgree,
                PathNode::End,
            ],
            FixtureParams::default(),
        );
        let sizes: Vec<usize> = fixture
            .rounds
            .rounds
            .iter()
            .map(|r| r.last_rotation().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![5, 7, 11]);
        assert_eq!(fixture.budget.appeals.len(), 1);
        assert_eq!(fixture.path_indices, vec![0, 1, 7, 1, 12]);
    }
}
