// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory backing store for testing and development.
//!
//! This module provides a thread-safe, key-sorted store that implements the
//! [`BackingStore`] trait over a `BTreeMap`, so entries iterate in natural
//! ascending timestamp order. It is the reference collaborator for buffer
//! tests; nothing persists beyond the process.
//!
//! # Conflict Injection
//!
//! Real transactional stores report contention the buffer must absorb. To
//! exercise that path, [`MemoryStore::inject_conflicts`] arms a counter that
//! makes the next N data operations fail with a transient conflict before
//! succeeding, proving the retry loop is invisible to callers.
//!
//! # Key Collisions
//!
//! Inserting an entry whose key already exists overwrites the previous entry
//! (last-writer-wins), which the store contract permits.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use weir_core::error::{StoreError, StoreResult};
use weir_core::types::{Namespace, StoredEntry, Timestamp};

use crate::traits::{BackingStore, ScanDirection, StoreSession};

// =============================================================================
// Memory Store
// =============================================================================

/// An in-memory, key-sorted backing store.
///
/// # Thread Safety
///
/// `Send + Sync`. Structures live under a `parking_lot::RwLock`; the
/// conflict-injection counter is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Named structures, each a timestamp-sorted entry map.
    structures: RwLock<HashMap<String, BTreeMap<Timestamp, StoredEntry>>>,

    /// Number of upcoming data operations that fail with a transient
    /// conflict before succeeding.
    injected_conflicts: AtomicU64,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the next `count` data operations to fail with a transient
    /// conflict.
    ///
    /// Structure lifecycle calls (`create`, `drop_structure`, `exists`) are
    /// not affected.
    pub fn inject_conflicts(&self, count: u64) {
        self.injected_conflicts.fetch_add(count, Ordering::SeqCst);
    }

    /// Consumes one armed conflict, if any.
    fn take_conflict(&self, operation: &'static str) -> StoreResult<()> {
        let mut armed = self.injected_conflicts.load(Ordering::SeqCst);
        while armed > 0 {
            match self.injected_conflicts.compare_exchange(
                armed,
                armed - 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    debug!(operation, remaining = armed - 1, "Injected transient conflict");
                    return Err(StoreError::transient_conflict(format!(
                        "injected conflict during {}",
                        operation
                    )));
                }
                Err(current) => armed = current,
            }
        }
        Ok(())
    }

    /// Runs `f` against the named structure, or fails if it does not exist.
    fn with_structure<T>(
        &self,
        namespace: &Namespace,
        f: impl FnOnce(&mut BTreeMap<Timestamp, StoredEntry>) -> T,
    ) -> StoreResult<T> {
        let mut structures = self.structures.write();
        match structures.get_mut(namespace.as_str()) {
            Some(entries) => Ok(f(entries)),
            None => Err(StoreError::structure_missing(namespace.as_str())),
        }
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn create(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<()> {
        let mut structures = self.structures.write();
        if structures.contains_key(namespace.as_str()) {
            return Err(StoreError::structure_exists(namespace.as_str()));
        }
        structures.insert(namespace.as_str().to_string(), BTreeMap::new());
        debug!(namespace = %namespace, "Structure created");
        Ok(())
    }

    async fn drop_structure(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<()> {
        let mut structures = self.structures.write();
        if structures.remove(namespace.as_str()).is_none() {
            return Err(StoreError::structure_missing(namespace.as_str()));
        }
        debug!(namespace = %namespace, "Structure dropped");
        Ok(())
    }

    async fn exists(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<bool> {
        Ok(self.structures.read().contains_key(namespace.as_str()))
    }

    async fn insert_one(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
        entry: StoredEntry,
    ) -> StoreResult<()> {
        self.take_conflict("insert_one")?;
        self.with_structure(namespace, |entries| {
            entries.insert(entry.key, entry);
        })
    }

    async fn insert_many(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
        batch: Vec<StoredEntry>,
    ) -> StoreResult<()> {
        self.take_conflict("insert_many")?;
        self.with_structure(namespace, |entries| {
            for entry in batch {
                entries.insert(entry.key, entry);
            }
        })
    }

    async fn delete_one(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
        key: Timestamp,
    ) -> StoreResult<bool> {
        self.take_conflict("delete_one")?;
        self.with_structure(namespace, |entries| entries.remove(&key).is_some())
    }

    async fn delete_all(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<()> {
        self.take_conflict("delete_all")?;
        self.with_structure(namespace, |entries| {
            entries.clear();
        })
    }

    async fn find_extreme(
        &self,
        _session: &StoreSession,
        namespace: &Namespace,
        direction: ScanDirection,
    ) -> StoreResult<Option<StoredEntry>> {
        self.take_conflict("find_extreme")?;
        self.with_structure(namespace, |entries| match direction {
            ScanDirection::Ascending => entries.values().next().cloned(),
            ScanDirection::Descending => entries.values().next_back().cloned(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use weir_core::types::Record;

    fn entry(secs: u32) -> StoredEntry {
        let record = Record::new(Timestamp::new(secs, 0), vec![secs as u8]);
        StoredEntry::from_record(&record).unwrap()
    }

    fn namespace(name: &str) -> Namespace {
        Namespace::new(format!("local.test.{}", name))
    }

    #[tokio::test]
    async fn test_create_and_drop() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("create_drop");

        assert!(!store.exists(&session, &ns).await.unwrap());
        store.create(&session, &ns).await.unwrap();
        assert!(store.exists(&session, &ns).await.unwrap());
        store.drop_structure(&session, &ns).await.unwrap();
        assert!(!store.exists(&session, &ns).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("create_twice");

        store.create(&session, &ns).await.unwrap();
        let error = store.create(&session, &ns).await.unwrap_err();
        assert!(matches!(error, StoreError::StructureExists { .. }));
    }

    #[tokio::test]
    async fn test_operations_on_missing_structure_fail() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("missing");

        let error = store.insert_one(&session, &ns, entry(1)).await.unwrap_err();
        assert!(matches!(error, StoreError::StructureMissing { .. }));

        let error = store
            .find_extreme(&session, &ns, ScanDirection::Ascending)
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::StructureMissing { .. }));
    }

    #[tokio::test]
    async fn test_find_extreme_resolves_key_order() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("extremes");
        store.create(&session, &ns).await.unwrap();

        // Inserted out of key order on purpose.
        store
            .insert_many(&session, &ns, vec![entry(2), entry(1), entry(3)])
            .await
            .unwrap();

        let oldest = store
            .find_extreme(&session, &ns, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest.key, Timestamp::new(1, 0));

        let newest = store
            .find_extreme(&session, &ns, ScanDirection::Descending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(newest.key, Timestamp::new(3, 0));
    }

    #[tokio::test]
    async fn test_find_extreme_empty_returns_none() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("empty");
        store.create(&session, &ns).await.unwrap();

        let found = store
            .find_extreme(&session, &ns, ScanDirection::Ascending)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_delete_one_and_all() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("delete");
        store.create(&session, &ns).await.unwrap();

        store
            .insert_many(&session, &ns, vec![entry(1), entry(2)])
            .await
            .unwrap();

        let removed = store
            .delete_one(&session, &ns, Timestamp::new(1, 0))
            .await
            .unwrap();
        assert!(removed);

        // Deleting the same key again is a no-op and says so.
        let removed = store
            .delete_one(&session, &ns, Timestamp::new(1, 0))
            .await
            .unwrap();
        assert!(!removed);

        let oldest = store
            .find_extreme(&session, &ns, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest.key, Timestamp::new(2, 0));

        store.delete_all(&session, &ns).await.unwrap();
        assert!(store
            .find_extreme(&session, &ns, ScanDirection::Ascending)
            .await
            .unwrap()
            .is_none());
        // Structure itself survives delete_all.
        assert!(store.exists(&session, &ns).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_key_overwrites() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("dup");
        store.create(&session, &ns).await.unwrap();

        let first = entry(5);
        let second = StoredEntry::from_record(&Record::new(
            Timestamp::new(5, 0),
            vec![0xAA, 0xBB],
        ))
        .unwrap();

        store.insert_one(&session, &ns, first).await.unwrap();
        store.insert_one(&session, &ns, second.clone()).await.unwrap();

        let found = store
            .find_extreme(&session, &ns, ScanDirection::Ascending)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, second);
    }

    #[tokio::test]
    async fn test_injected_conflicts_drain() {
        let store = MemoryStore::new();
        let session = StoreSession::new();
        let ns = namespace("conflicts");
        store.create(&session, &ns).await.unwrap();

        store.inject_conflicts(2);

        let error = store.insert_one(&session, &ns, entry(1)).await.unwrap_err();
        assert!(error.is_transient());
        let error = store.insert_one(&session, &ns, entry(1)).await.unwrap_err();
        assert!(error.is_transient());

        // Third attempt goes through.
        store.insert_one(&session, &ns, entry(1)).await.unwrap();
    }
}
