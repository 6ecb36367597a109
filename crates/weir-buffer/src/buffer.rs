// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The spill buffer core.
//!
//! [`SpillBuffer`] owns capacity accounting, ordering semantics, and the
//! blocking/timeout coordination between producers and consumers. Records are
//! written through the backing store keyed by their timestamp; pops and peeks
//! resolve key extremes, so consumers always drain in strictly increasing
//! timestamp order no matter how concurrent producers interleaved.
//!
//! # Accounting
//!
//! `count` and `total_size` are authoritative caches of the store's contents,
//! maintained incrementally. They are updated only after the corresponding
//! store mutation is confirmed, under a mutex held just for the bookkeeping,
//! never across a store call. At every observable instant
//! `count == 0 ⇔ total_size == 0` and both agree with the persisted entry
//! set.
//!
//! # Lifecycle
//!
//! A buffer is created closed. `startup` creates the backing structure and
//! opens it; `shutdown` drops the structure and closes it, releasing every
//! blocked waiter. All other operations require the open state and fail with
//! `BufferError::Closed` otherwise.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use weir_core::error::{BufferError, BufferResult};
use weir_core::types::{Namespace, Record, StoredEntry};
use weir_store::{BackingStore, ScanDirection, StoreSession};

use crate::config::BufferConfig;
use crate::retry::with_conflict_retry;
use crate::stats::{BufferStats, BufferStatsInner};

// =============================================================================
// Buffer State
// =============================================================================

/// Mutex-guarded accounting fields.
///
/// The mutex is held only for bookkeeping; store calls happen outside it.
#[derive(Debug, Default)]
struct BufferInner {
    /// Whether the buffer is between `startup` and `shutdown`.
    is_open: bool,
    /// Number of entries currently persisted.
    count: u64,
    /// Aggregate encoded size of persisted entries, in bytes.
    total_size: u64,
}

// =============================================================================
// Spill Buffer
// =============================================================================

/// A durable, timestamp-ordered, capacity-bounded FIFO buffer.
///
/// # Thread Safety
///
/// `Send + Sync`; multiple producer and consumer tasks may call the public
/// operations concurrently on one instance. The design is single-consumer,
/// single-logical-producer-stream per instance, but the API admits concurrent
/// callers.
///
/// # Capacity
///
/// The configured `capacity_bytes` is a soft watermark. [`SpillBuffer::push`]
/// waits for space below it; [`SpillBuffer::push_even_if_full`] and
/// [`SpillBuffer::push_all_non_blocking`] insert unconditionally and may
/// drive the aggregate size above it.
#[derive(Debug)]
pub struct SpillBuffer {
    /// The transactional store entries spill to.
    store: Arc<dyn BackingStore>,

    /// The backing structure this buffer binds to.
    namespace: Namespace,

    /// Buffer configuration.
    config: BufferConfig,

    /// Accounting fields, guarded for short bookkeeping sections only.
    inner: Mutex<BufferInner>,

    /// Wakeup primitive shared by both wait reasons: "data became available"
    /// and "space became available". Every waiter re-checks its own predicate
    /// after a wakeup.
    changed: Notify,

    /// Serializes the find-then-delete section of removing pops. Without it
    /// two overlapping pops can resolve the same oldest entry and deliver it
    /// twice. Held across store calls, so it is an async mutex, distinct from
    /// the accounting mutex.
    remove_lock: tokio::sync::Mutex<()>,

    /// Cumulative observability counters.
    stats: BufferStatsInner,
}

impl SpillBuffer {
    /// Creates a closed buffer bound to the given namespace.
    ///
    /// No storage work happens here; call [`SpillBuffer::startup`] before any
    /// other operation.
    pub fn new(store: Arc<dyn BackingStore>, namespace: Namespace, config: BufferConfig) -> Self {
        Self {
            store,
            namespace,
            config,
            inner: Mutex::new(BufferInner::default()),
            changed: Notify::new(),
            remove_lock: tokio::sync::Mutex::new(()),
            stats: BufferStatsInner::new(),
        }
    }

    /// Creates a closed buffer bound to the default namespace.
    pub fn with_default_namespace(store: Arc<dyn BackingStore>, config: BufferConfig) -> Self {
        Self::new(store, Namespace::default_namespace(), config)
    }

    /// Returns the namespace of the backing structure this buffer uses.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Creates the backing structure and opens the buffer.
    ///
    /// One-shot: calling it on an already-open buffer fails with
    /// `BufferError::AlreadyOpen`. If creation fails the error propagates and
    /// the buffer stays closed.
    pub async fn startup(&self, session: &StoreSession) -> BufferResult<()> {
        if self.inner.lock().is_open {
            return Err(BufferError::AlreadyOpen);
        }

        self.store.create(session, &self.namespace).await?;

        {
            let mut inner = self.inner.lock();
            inner.is_open = true;
            inner.count = 0;
            inner.total_size = 0;
        }

        info!(namespace = %self.namespace, "Spill buffer opened");
        Ok(())
    }

    /// Drops the backing structure and closes the buffer, discarding all
    /// entries.
    ///
    /// The buffer is marked closed and blocked waiters are released before
    /// the drop is attempted, so a drop failure still leaves the buffer
    /// unusable for further operations. Drop errors propagate. Calling this
    /// on a buffer that is not open, including one never started, fails with
    /// `BufferError::Closed` like every other operation.
    pub async fn shutdown(&self, session: &StoreSession) -> BufferResult<()> {
        {
            let mut inner = self.inner.lock();
            if !inner.is_open {
                return Err(BufferError::Closed);
            }
            inner.is_open = false;
            inner.count = 0;
            inner.total_size = 0;
        }
        self.changed.notify_waiters();

        match self.store.drop_structure(session, &self.namespace).await {
            Ok(()) => {
                info!(namespace = %self.namespace, "Spill buffer shut down");
                Ok(())
            }
            Err(error) => {
                warn!(
                    namespace = %self.namespace,
                    error = %error,
                    "Backing structure drop failed during shutdown"
                );
                Err(error.into())
            }
        }
    }

    /// Deletes every entry and resets accounting to zero.
    ///
    /// The backing structure itself survives and immediately accepts new
    /// pushes. All waiters are reevaluated since capacity becomes fully
    /// available.
    pub async fn clear(&self, session: &StoreSession) -> BufferResult<()> {
        self.require_open()?;

        with_conflict_retry(
            "delete_all",
            self.config.conflict_retry_delay,
            &self.stats,
            || self.store.delete_all(session, &self.namespace),
        )
        .await?;

        {
            let mut inner = self.inner.lock();
            inner.count = 0;
            inner.total_size = 0;
        }
        self.stats.record_clear();
        self.changed.notify_waiters();

        debug!(namespace = %self.namespace, "Spill buffer cleared");
        Ok(())
    }

    // =========================================================================
    // Push Family
    // =========================================================================

    /// Pushes a record, waiting until the soft capacity admits it.
    ///
    /// Equivalent to [`SpillBuffer::wait_for_space`] for the record's encoded
    /// size followed by an unconditional insert. Never silently drops: if the
    /// buffer closed while waiting, the insert fails with
    /// `BufferError::Closed`.
    pub async fn push(&self, session: &StoreSession, record: Record) -> BufferResult<()> {
        let entry = encode(&record)?;
        self.wait_for_space(entry.size_bytes()).await;
        self.insert_entries(session, vec![entry]).await
    }

    /// Pushes a record unconditionally, bypassing the capacity check.
    ///
    /// May drive the aggregate size above the configured watermark.
    pub async fn push_even_if_full(
        &self,
        session: &StoreSession,
        record: Record,
    ) -> BufferResult<()> {
        let entry = encode(&record)?;
        self.insert_entries(session, vec![entry]).await
    }

    /// Pushes a batch of records without blocking.
    ///
    /// The batch is always inserted in full; capacity is evaluated but never
    /// waited on. Returns `true` iff the aggregate size after insertion is
    /// within the configured watermark, letting the caller throttle its next
    /// batch. An empty batch is a no-op returning `true`.
    pub async fn push_all_non_blocking(
        &self,
        session: &StoreSession,
        records: Vec<Record>,
    ) -> BufferResult<bool> {
        if records.is_empty() {
            self.require_open()?;
            let inner = self.inner.lock();
            return Ok(inner.total_size <= self.config.capacity_bytes);
        }

        let entries = records
            .iter()
            .map(encode)
            .collect::<BufferResult<Vec<_>>>()?;
        self.insert_entries(session, entries).await?;

        let within_capacity = self.inner.lock().total_size <= self.config.capacity_bytes;
        Ok(within_capacity)
    }

    /// Parks until `size` more bytes fit under the watermark, or the buffer
    /// closes.
    ///
    /// Returning after a close carries no space guarantee; it exists so
    /// `shutdown` can unblock producers. A `size` larger than the watermark
    /// itself can only be satisfied by closure.
    pub async fn wait_for_space(&self, size: u64) {
        loop {
            let notified = self.changed.notified();
            {
                let inner = self.inner.lock();
                if !inner.is_open || inner.total_size + size <= self.config.capacity_bytes {
                    return;
                }
            }
            notified.await;
        }
    }

    /// Writes entries through the store, then updates accounting and wakes
    /// waiters.
    async fn insert_entries(
        &self,
        session: &StoreSession,
        entries: Vec<StoredEntry>,
    ) -> BufferResult<()> {
        self.require_open()?;

        let count = entries.len() as u64;
        let total_bytes: u64 = entries.iter().map(StoredEntry::size_bytes).sum();
        let delay = self.config.conflict_retry_delay;

        if let [entry] = entries.as_slice() {
            // Single-entry fast path: re-clones one entry per retry attempt
            // instead of the whole batch.
            with_conflict_retry("insert_one", delay, &self.stats, || {
                let entry = entry.clone();
                async move { self.store.insert_one(session, &self.namespace, entry).await }
            })
            .await?;
        } else {
            with_conflict_retry("insert_many", delay, &self.stats, || {
                let batch = entries.clone();
                async move { self.store.insert_many(session, &self.namespace, batch).await }
            })
            .await?;
        }

        {
            let mut inner = self.inner.lock();
            inner.count += count;
            inner.total_size += total_bytes;
        }
        self.stats.record_push(count, total_bytes);
        self.changed.notify_waiters();
        Ok(())
    }

    // =========================================================================
    // Pop / Peek Family
    // =========================================================================

    /// Removes and returns the oldest record, or `None` when empty.
    pub async fn try_pop(&self, session: &StoreSession) -> BufferResult<Option<Record>> {
        self.read_extreme(session, ScanDirection::Ascending, true)
            .await
    }

    /// Removes and returns the oldest record, waiting indefinitely for one.
    ///
    /// There is no timeout; cancellation happens only through `shutdown`,
    /// which releases waiters with `BufferError::Closed`.
    pub async fn blocking_pop(&self, session: &StoreSession) -> BufferResult<Record> {
        loop {
            let notified = self.changed.notified();
            let has_data = {
                let inner = self.inner.lock();
                if !inner.is_open {
                    return Err(BufferError::Closed);
                }
                inner.count > 0
            };

            if has_data {
                if let Some(record) = self
                    .read_extreme(session, ScanDirection::Ascending, true)
                    .await?
                {
                    return Ok(record);
                }
                // Lost the race to a concurrent consumer; wait again.
                continue;
            }

            notified.await;
        }
    }

    /// Returns the oldest record without removing it, or `None` when empty.
    ///
    /// Idempotent: repeated peeks with no intervening pop observe the same
    /// record.
    pub async fn peek(&self, session: &StoreSession) -> BufferResult<Option<Record>> {
        self.read_extreme(session, ScanDirection::Ascending, false)
            .await
    }

    /// Returns the oldest record without removing it, waiting up to
    /// `wait_duration` for one to arrive.
    ///
    /// A definite `None` is returned once the duration elapses with the
    /// buffer still empty. This is a point-in-time read, not a reservation:
    /// another consumer may pop the observed record before the caller acts.
    pub async fn blocking_peek(
        &self,
        session: &StoreSession,
        wait_duration: Duration,
    ) -> BufferResult<Option<Record>> {
        let deadline = tokio::time::Instant::now() + wait_duration;
        loop {
            let notified = self.changed.notified();
            let has_data = {
                let inner = self.inner.lock();
                if !inner.is_open {
                    return Err(BufferError::Closed);
                }
                inner.count > 0
            };

            if has_data {
                if let Some(record) = self
                    .read_extreme(session, ScanDirection::Ascending, false)
                    .await?
                {
                    return Ok(Some(record));
                }
                continue;
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    /// Returns the newest record without removing it, or `None` when empty.
    ///
    /// "Newest" means the maximum order key currently stored, not literally
    /// the argument of the most recent push call.
    pub async fn last_record_pushed(
        &self,
        session: &StoreSession,
    ) -> BufferResult<Option<Record>> {
        self.read_extreme(session, ScanDirection::Descending, false)
            .await
    }

    /// Reads one key extreme, optionally removing it.
    ///
    /// The single primitive behind the whole pop/peek family. Removing reads
    /// hold `remove_lock` from the find through the delete so concurrent
    /// consumers resolve distinct entries; plain peeks stay lock-free.
    async fn read_extreme(
        &self,
        session: &StoreSession,
        direction: ScanDirection,
        remove: bool,
    ) -> BufferResult<Option<Record>> {
        self.require_open()?;
        let delay = self.config.conflict_retry_delay;

        let _remove_guard = if remove {
            Some(self.remove_lock.lock().await)
        } else {
            None
        };

        let found = with_conflict_retry("find_extreme", delay, &self.stats, || {
            self.store.find_extreme(session, &self.namespace, direction)
        })
        .await?;

        let Some(entry) = found else {
            return Ok(None);
        };

        let key = entry.key;
        let size = entry.size_bytes();
        let record = entry.into_record().map_err(|error| {
            warn!(namespace = %self.namespace, key = %key, error = %error, "Malformed stored entry");
            BufferError::corrupted_entry(format!("entry {} did not decode: {}", key, error))
        })?;

        if remove {
            let removed = with_conflict_retry("delete_one", delay, &self.stats, || {
                self.store.delete_one(session, &self.namespace, key)
            })
            .await?;

            // A concurrent clear may have emptied the structure between the
            // find and the delete; accounting then already reads zero and
            // must not move.
            if removed {
                {
                    let mut inner = self.inner.lock();
                    inner.count = inner.count.saturating_sub(1);
                    inner.total_size = inner.total_size.saturating_sub(size);
                }
                self.stats.record_pop(size);
                self.changed.notify_waiters();
            }
        }

        Ok(Some(record))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().count == 0
    }

    /// Returns the number of entries currently buffered.
    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    /// Returns the aggregate encoded size of buffered entries, in bytes.
    pub fn size(&self) -> u64 {
        self.inner.lock().total_size
    }

    /// Returns the configured soft capacity watermark, in bytes.
    pub fn max_size(&self) -> u64 {
        self.config.capacity_bytes
    }

    /// Returns a snapshot of the cumulative statistics.
    pub fn stats(&self) -> BufferStats {
        self.stats.snapshot()
    }

    /// Fails with `BufferError::Closed` unless the buffer is open.
    fn require_open(&self) -> BufferResult<()> {
        if self.inner.lock().is_open {
            Ok(())
        } else {
            Err(BufferError::Closed)
        }
    }
}

/// Wraps a record into its stored shape, mapping encode failures.
fn encode(record: &Record) -> BufferResult<StoredEntry> {
    StoredEntry::from_record(record)
        .map_err(|error| BufferError::corrupted_entry(format!("record did not encode: {}", error)))
}

// =============================================================================
// Tests
// =============================================================================
