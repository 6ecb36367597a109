// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Backing store traits and interfaces.
//!
//! This module defines the contract between the buffer core and the
//! transactional, key-sorted store it spills to. The store is an external
//! collaborator: the buffer never manages its transactions or its on-disk
//! layout, it only addresses a named structure through this trait.
//!
//! # Design Principles
//!
//! - **Key-sorted**: entries are sorted by their [`Timestamp`] key, so the
//!   store's natural ascending order is oldest-to-newest.
//! - **Session-scoped**: every call executes within a caller-provided
//!   [`StoreSession`], the transaction scope of the public operation that
//!   triggered it.
//! - **Conflict-tagged**: stores report contention as
//!   `StoreError::TransientConflict`, which the buffer core retries
//!   transparently. All other errors are fatal and propagate.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use weir_core::error::StoreResult;
use weir_core::types::{Namespace, StoredEntry, Timestamp};

// =============================================================================
// Store Session
// =============================================================================

/// The transaction/session scope a store call executes within.
///
/// Supplied by the caller of each public buffer operation; all storage work
/// performed on behalf of that operation shares the same session. The buffer
/// core treats it as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreSession {
    id: u64,
}

impl StoreSession {
    /// Opens a new session scope with a process-unique id.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Returns the session id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for StoreSession {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Scan Direction
// =============================================================================

/// Direction of an extreme read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Resolve the minimum-keyed (oldest) entry.
    Ascending,
    /// Resolve the maximum-keyed (newest) entry.
    Descending,
}

// =============================================================================
// Backing Store Trait
// =============================================================================

/// The contract for a transactional, key-sorted backing store.
///
/// # Implementation Requirements
///
/// - Implementations must be thread-safe (`Send + Sync`); the buffer core
///   issues calls from concurrent producers and consumers.
/// - Contention must surface as `StoreError::TransientConflict` so the buffer
///   can retry it; any other error is treated as fatal.
/// - Key collision behavior is store-defined (fail distinguishably with
///   `StoreError::DuplicateKey`, or overwrite last-writer-wins). The buffer
///   relies on neither; key uniqueness is a caller precondition.
#[async_trait]
pub trait BackingStore: Send + Sync + Debug {
    /// Creates the named structure.
    ///
    /// Not idempotent: creating a structure that already exists is an error.
    async fn create(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<()>;

    /// Drops the named structure and everything in it.
    async fn drop_structure(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<()>;

    /// Returns whether the named structure exists.
    async fn exists(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<bool>;

    /// Inserts a single entry, keyed by its timestamp.
    async fn insert_one(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
        entry: StoredEntry,
    ) -> StoreResult<()>;

    /// Inserts a batch of entries in one store operation.
    async fn insert_many(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
        entries: Vec<StoredEntry>,
    ) -> StoreResult<()>;

    /// Deletes the entry with the given key, if present.
    ///
    /// Returns whether an entry with that key existed, so callers keeping
    /// derived accounting can tell a real removal from a no-op.
    async fn delete_one(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
        key: Timestamp,
    ) -> StoreResult<bool>;

    /// Deletes every entry, leaving the structure itself in place.
    async fn delete_all(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
    ) -> StoreResult<()>;

    /// Returns the minimum- or maximum-keyed entry, or `None` when empty.
    async fn find_extreme(
        &self,
        session: &StoreSession,
        namespace: &Namespace,
        direction: ScanDirection,
    ) -> StoreResult<Option<StoredEntry>>;
}

// =============================================================================
// Tests
// =============================================================================
