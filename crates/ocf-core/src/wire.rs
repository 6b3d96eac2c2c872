//! Persisted wire format: the compressed path record.
//!
//! Each processed transaction serializes to a compact record of node
//! indices, label indices, per-participant aggregates, the invariant
//! bitfield and a 64-bit content hash. The index tables are stable across
//! releases and additive-only; index 8 of the label table is reserved for
//! the intermediate timeout label and never appears in final records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::invariants::{InvariantId, InvariantRegistry};
use crate::model::{Role, RoundLabel};
use crate::pipeline::TransactionState;
use crate::{OcfError, Result};

/// Stable node-index table for the symbolic round-outcome alphabet.
pub const NODE_NAMES: [&str; 13] = [
    "START",
    "LEADER_RECEIPT_MAJORITY_AGREE",
    "LEADER_RECEIPT_UNDETERMINED",
    "LEADER_RECEIPT_MAJORITY_DISAGREE",
    "LEADER_RECEIPT_MAJORITY_TIMEOUT",
    "LEADER_TIMEOUT",
    "VALIDATOR_APPEAL_SUCCESSFUL",
    "VALIDATOR_APPEAL_UNSUCCESSFUL",
    "LEADER_APPEAL_SUCCESSFUL",
    "LEADER_APPEAL_UNSUCCESSFUL",
    "LEADER_APPEAL_TIMEOUT_SUCCESSFUL",
    "LEADER_APPEAL_TIMEOUT_UNSUCCESSFUL",
    "END",
];

/// Stable label index, shared with every persisted record.
pub fn label_index(label: RoundLabel) -> u16 {
    match label {
        RoundLabel::NormalRound => 0,
        RoundLabel::EmptyRound => 1,
        RoundLabel::AppealLeaderTimeoutUnsuccessful => 2,
        RoundLabel::AppealLeaderTimeoutSuccessful => 3,
        RoundLabel::AppealLeaderSuccessful => 4,
        RoundLabel::AppealLeaderUnsuccessful => 5,
        RoundLabel::AppealValidatorSuccessful => 6,
        RoundLabel::AppealValidatorUnsuccessful => 7,
        // 8 is reserved for the intermediate timeout label.
        RoundLabel::SkipRound => 9,
        RoundLabel::LeaderTimeout50Percent => 10,
        RoundLabel::SplitPreviousAppealBond => 11,
        RoundLabel::LeaderTimeout50PreviousAppealBond => 12,
        RoundLabel::LeaderTimeout150PreviousNormalRound => 13,
    }
}

/// Stable role index.
pub fn role_index(role: Role) -> u8 {
    match role {
        Role::Leader => 0,
        Role::Validator => 1,
        Role::Sender => 2,
        Role::Appealant => 3,
    }
}

/// Per-participant aggregate, keyed by a sequentially assigned id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// `(round_index, role_index)` tuples, one per fee event.
    #[serde(rename = "r")]
    pub rounds: Vec<(u32, u8)>,
    #[serde(rename = "c")]
    pub cost: u64,
    #[serde(rename = "e")]
    pub earned: u64,
    #[serde(rename = "s")]
    pub slashed: u64,
    #[serde(rename = "b")]
    pub burned: u64,
}

impl ParticipantRecord {
    fn is_active(&self) -> bool {
        self.cost > 0 || self.earned > 0 || self.slashed > 0 || self.burned > 0
    }
}

/// One processed transaction in compressed form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: Vec<u16>,
    pub labels: Vec<u16>,
    /// Participants by first-appearance id (1, 2, ...), filtered to those
    /// with any fee activity.
    pub participants: BTreeMap<u32, ParticipantRecord>,
    /// Bit `k` set iff invariant `k` passes.
    pub invariants: u32,
    /// Lower 64 bits of SHA-256 over the canonical serialization of this
    /// record with `hash` zeroed.
    pub hash: u64,
}

impl PathRecord {
    /// Build the record for a processed transaction. `path` carries the
    /// node indices of the generating path (including start/end markers).
    pub fn build(
        path: &[u16],
        state: &TransactionState,
        registry: &InvariantRegistry,
    ) -> PathRecord {
        let mut ids: BTreeMap<crate::model::Address, u32> = BTreeMap::new();
        let mut participants: BTreeMap<u32, ParticipantRecord> = BTreeMap::new();
        let mut next_id = 1u32;

        for event in &state.events {
            let id = *ids.entry(event.address).or_insert_with(|| {
                let id = next_id;
                next_id += 1;
                id
            });
            let record = participants.entry(id).or_default();
            if let Some(round) = event.round_index {
                record.rounds.push((round as u32, role_index(event.role)));
            }
            record.cost += event.cost;
            record.earned += event.earned;
            record.slashed += event.slashed;
            record.burned += event.burned;
        }
        participants.retain(|_, record| record.is_active());

        let mut record = PathRecord {
            path: path.to_vec(),
            labels: state.labels.iter().map(|l| label_index(*l)).collect(),
            participants,
            invariants: registry.bitfield(state),
            hash: 0,
        };
        record.hash = record.content_hash();
        record
    }

    /// Lower 64 bits of SHA-256 over the canonical (compact JSON, hash
    /// zeroed) serialization.
    pub fn content_hash(&self) -> u64 {
        let mut canonical = self.clone();
        canonical.hash = 0;
        let bytes = serde_json::to_vec(&canonical).expect("record serializes");
        let digest = Sha256::digest(&bytes);
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&digest[24..32]);
        u64::from_be_bytes(tail)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| OcfError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<PathRecord> {
        let record: PathRecord =
            serde_json::from_str(json).map_err(|e| OcfError::Serialization(e.to_string()))?;
        if record.hash != record.content_hash() {
            return Err(OcfError::Serialization("content hash mismatch".into()));
        }
        Ok(record)
    }
}

/// Index-to-name maps for decoding persisted records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupTables {
    pub node_map: BTreeMap<u16, String>,
    pub label_map: BTreeMap<u16, String>,
    pub role_map: BTreeMap<u8, String>,
    pub invariant_bits: BTreeMap<u32, String>,
}

/// The current lookup tables.
pub fn lookup_tables() -> LookupTables {
    let node_map = NODE_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| (i as u16, name.to_string()))
        .collect();

    let mut label_map: BTreeMap<u16, String> = [
        RoundLabel::NormalRound,
        RoundLabel::EmptyRound,
        RoundLabel::AppealLeaderTimeoutUnsuccessful,
        RoundLabel::AppealLeaderTimeoutSuccessful,
        RoundLabel::AppealLeaderSuccessful,
        RoundLabel::AppealLeaderUnsuccessful,
        RoundLabel::AppealValidatorSuccessful,
        RoundLabel::AppealValidatorUnsuccessful,
        RoundLabel::SkipRound,
        RoundLabel::LeaderTimeout50Percent,
        RoundLabel::SplitPreviousAppealBond,
        RoundLabel::LeaderTimeout50PreviousAppealBond,
        RoundLabel::LeaderTimeout150PreviousNormalRound,
    ]
    .into_iter()
    .map(|l| (label_index(l), l.as_str().to_string()))
    .collect();
    label_map.insert(8, "LEADER_TIMEOUT".to_string());

    let role_map = [Role::Leader, Role::Validator, Role::Sender, Role::Appealant]
        .into_iter()
        .map(|r| {
            (
                role_index(r),
                match r {
                    Role::Leader => "LEADER",
                    Role::Validator => "VALIDATOR",
                    Role::Sender => "SENDER",
                    Role::Appealant => "APPEALANT",
                }
                .to_string(),
            )
        })
        .collect();

    let invariant_bits = InvariantId::ALL
        .iter()
        .map(|id| (id.bit(), id.name().to_string()))
        .collect();

    LookupTables {
        node_map,
        label_map,
        role_map,
        invariant_bits,
    }
}
