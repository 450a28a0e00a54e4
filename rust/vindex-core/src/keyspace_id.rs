//! Keyspace ids, keyspace ranges and the adapters between keyspace ids and
//! [`Value`]s.
//!
//! A keyspace id is an opaque byte string. Nothing in this crate interprets its
//! contents.

use crate::value::{Value, ValueType};

/// An opaque shard-routing key.
pub type Ksid = Vec<u8>;

/// A half-open range `[start, end)` of keyspace ids.
///
/// An empty `start` means "from the beginning", an empty `end` means "to the end".
/// Both empty is the full keyspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl KeyRange {
    /// The range covering the whole keyspace.
    pub fn full() -> KeyRange {
        KeyRange::default()
    }

    pub fn is_full(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

/// The result of mapping one input value through a non-unique vindex.
///
/// Either a (possibly empty) list of keyspace ids, or a keyspace range the row
/// may live anywhere in. The two are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ksids {
    /// The value maps to exactly these keyspace ids, in lookup order.
    /// An empty list means the value does not exist.
    Ids(Vec<Ksid>),
    /// The mapping cannot be resolved; the router must not prune within this range.
    Range(KeyRange),
}

impl Ksids {
    /// The "could be anywhere" result used in write-only mode.
    pub fn full_range() -> Ksids {
        Ksids::Range(KeyRange::full())
    }

    pub fn ids(&self) -> Option<&[Ksid]> {
        match self {
            Ksids::Ids(ids) => Some(ids),
            Ksids::Range(_) => None,
        }
    }

    pub fn range(&self) -> Option<&KeyRange> {
        match self {
            Ksids::Ids(_) => None,
            Ksids::Range(range) => Some(range),
        }
    }
}

impl Default for Ksids {
    fn default() -> Self {
        Ksids::Ids(Vec::new())
    }
}

/// Converts a keyspace id into the binary value bound into lookup statements.
pub fn ksid_to_value(ksid: &[u8]) -> Value {
    Value::make_trusted(ValueType::VarBinary, ksid)
}

pub fn ksids_to_values(ksids: &[Ksid]) -> Vec<Value> {
    ksids.iter().map(|ksid| ksid_to_value(ksid)).collect()
}

/// Extracts the keyspace id carried by a lookup result column.
pub fn value_to_ksid(value: &Value) -> Ksid {
    value.to_bytes()
}
