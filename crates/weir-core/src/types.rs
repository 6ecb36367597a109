// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core data types for the weir spill buffer.
//!
//! The buffer stores opaque caller payloads keyed by a logical [`Timestamp`].
//! A [`Record`] is what producers push and consumers pop; a [`StoredEntry`]
//! is its persisted shape, with the timestamp promoted to the backing store's
//! primary sort key and the record riding embedded as encoded bytes.
//!
//! # Ordering
//!
//! The timestamp is the buffer's only ordering authority. The backing store
//! sorts entries by it, so its ascending iteration order is oldest-to-newest
//! regardless of insertion order. Timestamp uniqueness within a buffer's
//! lifetime is a caller-enforced precondition; pushing two records with the
//! same timestamp is undefined and may silently overwrite.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Timestamp
// =============================================================================

/// A logical timestamp ordering entries within the buffer.
///
/// Modeled as a `(seconds, increment)` pair so that multiple records produced
/// within the same second still carry distinct, totally ordered keys. The
/// derived ordering compares `secs` first, then `inc`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Seconds component.
    pub secs: u32,
    /// Increment component, disambiguating same-second records.
    pub inc: u32,
}

impl Timestamp {
    /// Creates a new timestamp from a seconds/increment pair.
    pub const fn new(secs: u32, inc: u32) -> Self {
        Self { secs, inc }
    }

    /// Returns the timestamp packed into a single sortable `u64`.
    ///
    /// Packing preserves the pair ordering: `a < b ⇔ a.as_u64() < b.as_u64()`.
    pub const fn as_u64(&self) -> u64 {
        ((self.secs as u64) << 32) | self.inc as u64
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.secs, self.inc)
    }
}

// =============================================================================
// Record
// =============================================================================

/// A single buffered record: an opaque payload plus its order key.
///
/// The payload is whatever bytes the producer serialized; the buffer never
/// inspects it. The timestamp is extracted at push time and becomes the
/// persisted entry's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The logical timestamp ordering this record.
    pub ts: Timestamp,
    /// Opaque, caller-serialized payload bytes.
    pub payload: Vec<u8>,
}

impl Record {
    /// Creates a new record.
    pub fn new(ts: Timestamp, payload: Vec<u8>) -> Self {
        Self { ts, payload }
    }

    /// Returns the order key this record sorts by.
    #[inline]
    pub fn order_key(&self) -> Timestamp {
        self.ts
    }
}

// =============================================================================
// Stored Entry
// =============================================================================

/// The persisted representation of a record.
///
/// The record's timestamp is lifted out as the store's primary key and the
/// record itself is embedded as `bincode`-encoded bytes. The encoded length is
/// the buffer's unit of size accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Primary sort key, equal to the embedded record's timestamp.
    pub key: Timestamp,
    /// The embedded record, encoded with `bincode`.
    pub record: Vec<u8>,
}

impl StoredEntry {
    /// Wraps a record into its stored shape.
    ///
    /// The entry key is taken from the record's order key.
    pub fn from_record(record: &Record) -> Result<Self, bincode::Error> {
        let encoded = bincode::serialize(record)?;
        Ok(Self {
            key: record.order_key(),
            record: encoded,
        })
    }

    /// Unwraps the embedded record.
    ///
    /// Fails if the embedded bytes do not decode to a record, which indicates
    /// a malformed entry in the backing structure.
    pub fn into_record(self) -> Result<Record, bincode::Error> {
        bincode::deserialize(&self.record)
    }

    /// Returns the size this entry contributes to the buffer's accounting.
    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.record.len() as u64
    }
}

// =============================================================================
// Namespace
// =============================================================================

/// Default namespace for the temporary structure backing a spill buffer.
pub const DEFAULT_NAMESPACE: &str = "local.weir.spill_buffer";

/// Identifies which backing structure a buffer instance binds to.
///
/// Pure data; creating a namespace has no side effects. The structure it
/// names is created by the buffer's `startup` and dropped by `shutdown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a namespace from a structure name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the well-known default namespace.
    pub fn default_namespace() -> Self {
        Self(DEFAULT_NAMESPACE.to_string())
    }

    /// Returns the structure name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ordering() {
        let a = Timestamp::new(1, 5);
        let b = Timestamp::new(2, 0);
        let c = Timestamp::new(2, 1);

        assert!(a < b);
        assert!(b < c);
        assert!(a.as_u64() < b.as_u64());
        assert!(b.as_u64() < c.as_u64());
    }

    #[test]
    fn test_timestamp_display() {
        assert_eq!(Timestamp::new(42, 7).to_string(), "42.7");
    }

    #[test]
    fn test_stored_entry_wraps_record_key() {
        let record = Record::new(Timestamp::new(3, 1), vec![1, 2, 3]);
        let entry = StoredEntry::from_record(&record).unwrap();

        assert_eq!(entry.key, record.order_key());
        assert!(entry.size_bytes() > 0);

        let unwrapped = entry.into_record().unwrap();
        assert_eq!(unwrapped, record);
    }

    #[test]
    fn test_stored_entry_rejects_garbage() {
        let entry = StoredEntry {
            key: Timestamp::new(1, 1),
            record: vec![0xff],
        };
        assert!(entry.into_record().is_err());
    }

    #[test]
    fn test_record_carries_caller_serialized_payload() {
        // Producers serialize their own documents; the buffer treats the
        // bytes as opaque.
        let doc = serde_json::json!({"op": "i", "ns": "a.a", "o": {"_id": 1}});
        let payload = serde_json::to_vec(&doc).unwrap();
        let record = Record::new(Timestamp::new(1, 1), payload.clone());

        let entry = StoredEntry::from_record(&record).unwrap();
        let roundtrip = entry.into_record().unwrap();
        let decoded: serde_json::Value = serde_json::from_slice(&roundtrip.payload).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn test_default_namespace() {
        let ns = Namespace::default_namespace();
        assert_eq!(ns.as_str(), DEFAULT_NAMESPACE);
        assert_eq!(ns, Namespace::new(DEFAULT_NAMESPACE));
    }
}
