use crate::decimal::DecimalValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named components of a price snapshot.
///
/// The set is closed: a snapshot producer and the validator agree on these names at
/// compile time, and every field always has a (possibly unconstrained) limit validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceField {
    #[serde(rename = "atomPrice")]
    AtomPrice,
    #[serde(rename = "bAtomPrice")]
    BAtomPrice,
    #[serde(rename = "ethPrice")]
    EthPrice,
    #[serde(rename = "stEthRate")]
    StEthRate,
    #[serde(rename = "bEthRate")]
    BEthRate,
    #[serde(rename = "bEthPrice")]
    BEthPrice,
}

impl PriceField {
    pub const ALL: [PriceField; 6] = [
        PriceField::AtomPrice,
        PriceField::BAtomPrice,
        PriceField::EthPrice,
        PriceField::StEthRate,
        PriceField::BEthRate,
        PriceField::BEthPrice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::AtomPrice => "atomPrice",
            PriceField::BAtomPrice => "bAtomPrice",
            PriceField::EthPrice => "ethPrice",
            PriceField::StEthRate => "stEthRate",
            PriceField::BEthRate => "bEthRate",
            PriceField::BEthPrice => "bEthPrice",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field values of a derived price at one block, in insertion order.
///
/// A field can be declared without a value (`mark_unavailable`) when its producer could
/// not resolve it; validation then treats it as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSnapshot {
    values: IndexMap<PriceField, Option<DecimalValue>>,
}

impl PriceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: PriceField, value: DecimalValue) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: PriceField, value: DecimalValue) {
        self.values.insert(field, Some(value));
    }

    pub fn mark_unavailable(&mut self, field: PriceField) {
        self.values.insert(field, None);
    }

    pub fn get(&self, field: PriceField) -> Option<&DecimalValue> {
        self.values.get(&field).and_then(Option::as_ref)
    }

    /// Fields in insertion order, including declared-but-unavailable ones.
    pub fn fields(&self) -> impl Iterator<Item = PriceField> + '_ {
        self.values.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(PriceField, DecimalValue)> for PriceSnapshot {
    fn from_iter<I: IntoIterator<Item = (PriceField, DecimalValue)>>(iter: I) -> Self {
        let mut snapshot = PriceSnapshot::new();
        for (field, value) in iter {
            snapshot.insert(field, value);
        }
        snapshot
    }
}

/// A historical snapshot and the block it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub block_number: u64,
    pub snapshot: PriceSnapshot,
}

impl ReferenceEntry {
    pub fn new(block_number: u64, snapshot: PriceSnapshot) -> Self {
        Self {
            block_number,
            snapshot,
        }
    }
}
