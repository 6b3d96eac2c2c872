//! Derived views over the fee-event log.

use std::collections::BTreeMap;

use crate::model::{Address, FeeEvent};

/// Cumulative quantities for one address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AddressTotals {
    pub earned: u64,
    pub cost: u64,
    pub burned: u64,
    pub slashed: u64,
    pub staked_delta: i64,
}

impl AddressTotals {
    /// Fee-flow balance: what the address received minus what it was
    /// charged. Burns and slashes are penalties against earnings and stake,
    /// not charges, and do not enter.
    pub fn fee_balance(&self) -> i128 {
        self.earned as i128 - self.cost as i128
    }
}

/// Per-address totals in deterministic (address) order.
pub fn address_totals(events: &[FeeEvent]) -> BTreeMap<Address, AddressTotals> {
    let mut totals: BTreeMap<Address, AddressTotals> = BTreeMap::new();
    for event in events {
        let t = totals.entry(event.address).or_default();
        t.earned += event.earned;
        t.cost += event.cost;
        t.burned += event.burned;
        t.slashed += event.slashed;
        t.staked_delta += event.staked_delta;
    }
    totals
}

/// Whole-log aggregates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub earned: u128,
    pub cost: u128,
    pub burned: u128,
    pub slashed: u128,
}

pub fn aggregates(events: &[FeeEvent]) -> Aggregates {
    let mut agg = Aggregates::default();
    for event in events {
        agg.earned += event.earned as u128;
        agg.cost += event.cost as u128;
        agg.burned += event.burned as u128;
        agg.slashed += event.slashed as u128;
    }
    agg
}
