//! Core value types for the fee pipeline.
//!
//! Everything here is constructed once at the boundary and never mutated;
//! the pipeline produces a fresh, immutable fee-event log. Rotations keep
//! their entries in protocol order, and that order is the only iteration
//! order used anywhere in the crate.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{OcfError, Result};

/// Opaque participant identifier. Ordering is only used to break ties
/// deterministically where the protocol calls for it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(D::Error::custom)?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("address must be 20 bytes"))?;
        Ok(Address(arr))
    }
}

/// Commitment to a leader result or a validator's recomputation of it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Placeholder commitment used by fixtures that do not exercise
    /// deterministic-violation detection.
    pub const DEFAULT: ContentHash = ContentHash([0u8; 32]);
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(D::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("content hash must be 32 bytes"))?;
        Ok(ContentHash(arr))
    }
}

/// A single validator vote choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Agree,
    Disagree,
    Timeout,
    Idle,
    NotApplicable,
}

/// A vote, optionally committing to the voter's recomputed result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub choice: VoteChoice,
    pub content_hash: Option<ContentHash>,
}

impl Vote {
    pub fn new(choice: VoteChoice) -> Vote {
        Vote {
            choice,
            content_hash: None,
        }
    }

    pub fn with_hash(choice: VoteChoice, hash: ContentHash) -> Vote {
        Vote {
            choice,
            content_hash: Some(hash),
        }
    }
}

/// What the leader submitted for the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaderAction {
    Receipt { content_hash: ContentHash },
    Timeout,
}

/// One participant's contribution to a rotation. The leader both submits a
/// result and casts a follow-up vote on its own submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ballot {
    Validator(Vote),
    Leader { action: LeaderAction, vote: Vote },
}

impl Ballot {
    /// The effective vote choice: a leader's follow-up vote, or the
    /// validator's vote.
    pub fn choice(&self) -> VoteChoice {
        match self {
            Ballot::Validator(v) => v.choice,
            Ballot::Leader { vote, .. } => vote.choice,
        }
    }

    pub fn content_hash(&self) -> Option<ContentHash> {
        match self {
            Ballot::Validator(v) => v.content_hash,
            Ballot::Leader { vote, .. } => vote.content_hash,
        }
    }

    pub fn leader_action(&self) -> Option<LeaderAction> {
        match self {
            Ballot::Validator(_) => None,
            Ballot::Leader { action, .. } => Some(*action),
        }
    }
}

/// One entry of a rotation, in protocol order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationEntry {
    pub address: Address,
    pub ballot: Ballot,
}

/// One election attempt: an ordered mapping from address to ballot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    pub entries: Vec<RotationEntry>,
}

impl Rotation {
    pub fn new(entries: Vec<RotationEntry>) -> Rotation {
        Rotation { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The unique entry carrying a leader ballot, if any.
    pub fn leader(&self) -> Option<&RotationEntry> {
        self.entries
            .iter()
            .find(|e| matches!(e.ballot, Ballot::Leader { .. }))
    }

    pub fn leader_action(&self) -> Option<LeaderAction> {
        self.leader().and_then(|e| e.ballot.leader_action())
    }

    /// All non-leader entries, in rotation order.
    pub fn validators(&self) -> impl Iterator<Item = &RotationEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.ballot, Ballot::Validator(_)))
    }

    pub fn validator_count(&self) -> usize {
        self.validators().count()
    }

    pub fn get(&self, address: &Address) -> Option<&RotationEntry> {
        self.entries.iter().find(|e| e.address == *address)
    }
}

/// One election in the transaction. The last rotation is authoritative for
/// labeling and distribution; earlier rotations are re-elections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub rotations: Vec<Rotation>,
}

impl Round {
    pub fn new(rotations: Vec<Rotation>) -> Round {
        Round { rotations }
    }

    pub fn from_rotation(rotation: Rotation) -> Round {
        Round {
            rotations: vec![rotation],
        }
    }

    pub fn last_rotation(&self) -> Option<&Rotation> {
        self.rotations.last()
    }
}

/// The ground-truth record of every round of one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRounds {
    pub rounds: Vec<Round>,
}

impl TransactionRounds {
    pub fn new(rounds: Vec<Round>) -> TransactionRounds {
        TransactionRounds { rounds }
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn last_rotation(&self, round_index: usize) -> Option<&Rotation> {
        self.rounds.get(round_index).and_then(Round::last_rotation)
    }
}

/// Binding from an appeal (in appeal order) to the party that posted the
/// bond.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appeal {
    pub appealant: Address,
}

/// How stake is distributed across participants. Other distributions are
/// reserved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakingDistribution {
    #[default]
    Constant,
}

/// Sender-provided configuration for one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBudget {
    pub leader_timeout: u64,
    pub validators_timeout: u64,
    /// One record per appeal round, in order.
    pub appeals: Vec<Appeal>,
    pub sender: Address,
    pub staking: StakingDistribution,
}

impl TransactionBudget {
    /// Validates the budget once at the boundary.
    ///
    /// Preconditions (enforced):
    /// - both timeouts are strictly positive.
    pub fn new(
        leader_timeout: u64,
        validators_timeout: u64,
        appeals: Vec<Appeal>,
        sender: Address,
    ) -> Result<TransactionBudget> {
        if leader_timeout == 0 {
            return Err(OcfError::InvalidInput(
                "leader_timeout must be > 0".into(),
            ));
        }
        if validators_timeout == 0 {
            return Err(OcfError::InvalidInput(
                "validators_timeout must be > 0".into(),
            ));
        }
        Ok(TransactionBudget {
            leader_timeout,
            validators_timeout,
            appeals,
            sender,
            staking: StakingDistribution::Constant,
        })
    }

    /// Stake of any participant under the configured distribution.
    pub fn stake_of(&self, _address: &Address) -> u64 {
        match self.staking {
            StakingDistribution::Constant => crate::constants::DEFAULT_STAKE,
        }
    }
}

/// The capacity a participant acted in when a fee event was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Leader,
    Validator,
    Appealant,
    Sender,
}

/// Semantic classification of a round after content inspection and
/// contextual rewriting. Closed set; exhaustive matching everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundLabel {
    NormalRound,
    SkipRound,
    EmptyRound,
    AppealLeaderSuccessful,
    AppealLeaderUnsuccessful,
    AppealValidatorSuccessful,
    AppealValidatorUnsuccessful,
    AppealLeaderTimeoutSuccessful,
    AppealLeaderTimeoutUnsuccessful,
    LeaderTimeout50Percent,
    LeaderTimeout150PreviousNormalRound,
    LeaderTimeout50PreviousAppealBond,
    SplitPreviousAppealBond,
}

impl RoundLabel {
    /// Whether this label denotes an appeal round (a round funded by a
    /// bond). The bond-settlement labels are normal rounds.
    pub fn is_appeal(self) -> bool {
        matches!(
            self,
            RoundLabel::AppealLeaderSuccessful
                | RoundLabel::AppealLeaderUnsuccessful
                | RoundLabel::AppealValidatorSuccessful
                | RoundLabel::AppealValidatorUnsuccessful
                | RoundLabel::AppealLeaderTimeoutSuccessful
                | RoundLabel::AppealLeaderTimeoutUnsuccessful
        )
    }

    pub fn is_unsuccessful_appeal(self) -> bool {
        matches!(
            self,
            RoundLabel::AppealLeaderUnsuccessful
                | RoundLabel::AppealValidatorUnsuccessful
                | RoundLabel::AppealLeaderTimeoutUnsuccessful
        )
    }

    /// Stable wire name, shared with the persisted lookup tables.
    pub fn as_str(self) -> &'static str {
        match self {
            RoundLabel::NormalRound => "NORMAL_ROUND",
            RoundLabel::SkipRound => "SKIP_ROUND",
            RoundLabel::EmptyRound => "EMPTY_ROUND",
            RoundLabel::AppealLeaderSuccessful => "APPEAL_LEADER_SUCCESSFUL",
            RoundLabel::AppealLeaderUnsuccessful => "APPEAL_LEADER_UNSUCCESSFUL",
            RoundLabel::AppealValidatorSuccessful => "APPEAL_VALIDATOR_SUCCESSFUL",
            RoundLabel::AppealValidatorUnsuccessful => "APPEAL_VALIDATOR_UNSUCCESSFUL",
            RoundLabel::AppealLeaderTimeoutSuccessful => "APPEAL_LEADER_TIMEOUT_SUCCESSFUL",
            RoundLabel::AppealLeaderTimeoutUnsuccessful => "APPEAL_LEADER_TIMEOUT_UNSUCCESSFUL",
            RoundLabel::LeaderTimeout50Percent => "LEADER_TIMEOUT_50_PERCENT",
            RoundLabel::LeaderTimeout150PreviousNormalRound => {
                "LEADER_TIMEOUT_150_PREVIOUS_NORMAL_ROUND"
            }
            RoundLabel::LeaderTimeout50PreviousAppealBond => {
                "LEADER_TIMEOUT_50_PREVIOUS_APPEAL_BOND"
            }
            RoundLabel::SplitPreviousAppealBond => "SPLIT_PREVIOUS_APPEAL_BOND",
        }
    }
}

impl fmt::Display for RoundLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable accounting record for one participant in one round (or a
/// transaction-level record such as the sender authorization or refund,
/// which carry no round index).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEvent {
    pub sequence_id: u64,
    pub address: Address,
    pub round_index: Option<usize>,
    pub round_label: Option<RoundLabel>,
    pub role: Role,
    pub vote: Option<VoteChoice>,
    pub earned: u64,
    pub cost: u64,
    pub burned: u64,
    pub slashed: u64,
    /// Stake movement. Stake is immutable across a transaction; the field
    /// exists for forward compatibility and is always zero.
    pub staked_delta: i64,
}

/// Monotonic allocator for fee-event sequence ids.
#[derive(Clone, Debug, Default)]
pub struct EventSequence {
    next: u64,
}

impl EventSequence {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Append-only fee-event log with a fixed intra-round emission order. The
/// sequence id is assigned in emission order and is the only event
/// identity.
#[derive(Clone, Debug, Default)]
pub struct FeeEventLog {
    sequence: EventSequence,
    events: Vec<FeeEvent>,
}

impl FeeEventLog {
    pub fn new() -> FeeEventLog {
        FeeEventLog::default()
    }

    pub fn events(&self) -> &[FeeEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<FeeEvent> {
        self.events
    }

    fn push(&mut self, mut event: FeeEvent) {
        event.sequence_id = self.sequence.next_id();
        self.events.push(event);
    }

    pub fn earn(
        &mut self,
        address: Address,
        round_index: Option<usize>,
        round_label: Option<RoundLabel>,
        role: Role,
        vote: Option<VoteChoice>,
        amount: u64,
    ) {
        self.push(FeeEvent {
            sequence_id: 0,
            address,
            round_index,
            round_label,
            role,
            vote,
            earned: amount,
            cost: 0,
            burned: 0,
            slashed: 0,
            staked_delta: 0,
        });
    }

    pub fn cost(
        &mut self,
        address: Address,
        round_index: Option<usize>,
        round_label: Option<RoundLabel>,
        role: Role,
        vote: Option<VoteChoice>,
        amount: u64,
    ) {
        self.push(FeeEvent {
            sequence_id: 0,
            address,
            round_index,
            round_label,
            role,
            vote,
            earned: 0,
            cost: amount,
            burned: 0,
            slashed: 0,
            staked_delta: 0,
        });
    }

    pub fn burn(
        &mut self,
        address: Address,
        round_index: Option<usize>,
        round_label: Option<RoundLabel>,
        role: Role,
        vote: Option<VoteChoice>,
        amount: u64,
    ) {
        self.push(FeeEvent {
            sequence_id: 0,
            address,
            round_index,
            round_label,
            role,
            vote,
            earned: 0,
            cost: 0,
            burned: amount,
            slashed: 0,
            staked_delta: 0,
        });
    }

    pub fn slash(
        &mut self,
        address: Address,
        round_index: Option<usize>,
        round_label: Option<RoundLabel>,
        role: Role,
        vote: Option<VoteChoice>,
        amount: u64,
    ) {
        self.push(FeeEvent {
            sequence_id: 0,
            address,
            round_index,
            round_label,
            role,
            vote,
            earned: 0,
            cost: 0,
            burned: 0,
            slashed: amount,
            staked_delta: 0,
        });
    }

    /// Total earned at a given round so far. Used by bond settlement to
    /// determine how much of a forfeited bond was already paid out.
    pub fn earned_at_round(&self, round_index: usize) -> u64 {
        self.events
            .iter()
            .filter(|e| e.round_index == Some(round_index))
            .map(|e| e.earned)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address([b; 20])
    }

    #[test]
    fn budget_rejects_zero_timeouts() {
        assert!(TransactionBudget::new(0, 200, vec![], addr(1)).is_err());
        assert!(TransactionBudget::new(100, 0, vec![], addr(1)).is_err());
        assert!(TransactionBudget::new(100, 200, vec![], addr(1)).is_ok());
    }

    #[test]
    fn sequence_ids_are_strictly_increasing() {
        let mut log = FeeEventLog::new();
        log.earn(addr(1), Some(0), None, Role::Validator, None, 10);
        log.burn(addr(2), Some(0), None, Role::Validator, None, 5);
        log.cost(addr(3), None, None, Role::Sender, None, 100);
        let ids: Vec<u64> = log.events().iter().map(|e| e.sequence_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn address_serde_round_trips_as_hex() {
        let a = addr(0xAB);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn rotation_leader_is_first_leader_ballot() {
        let rotation = Rotation::new(vec![
            RotationEntry {
                address: addr(1),
                ballot: Ballot::Leader {
                    action: LeaderAction::Receipt {
                        content_hash: ContentHash::DEFAULT,
                    },
                    vote: Vote::new(VoteChoice::Agree),
                },
            },
            RotationEntry {
                address: addr(2),
                ballot: Ballot::Validator(Vote::new(VoteChoice::Disagree)),
            },
        ]);
        assert_eq!(rotation.leader().unwrap().address, addr(1));
        assert_eq!(rotation.validator_count(), 1);
    }
}
