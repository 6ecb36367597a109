// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Lock-free cumulative buffer statistics.
//!
//! These counters are observability only; the authoritative count/size
//! accounting lives under the buffer's mutex. All operations here are O(1)
//! atomic updates.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free cumulative statistics using atomic types.
#[derive(Debug, Default)]
pub struct BufferStatsInner {
    /// Total records pushed (cumulative).
    pub records_pushed: AtomicU64,
    /// Total records popped (cumulative).
    pub records_popped: AtomicU64,
    /// Total bytes pushed (cumulative).
    pub bytes_pushed: AtomicU64,
    /// Total bytes popped (cumulative).
    pub bytes_popped: AtomicU64,
    /// Transient store conflicts absorbed by the retry loop (cumulative).
    pub conflicts_retried: AtomicU64,
    /// Number of clear operations (cumulative).
    pub clears: AtomicU64,
}

impl BufferStatsInner {
    /// Creates new statistics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful push of `count` records totalling `bytes`.
    #[inline]
    pub fn record_push(&self, count: u64, bytes: u64) {
        self.records_pushed.fetch_add(count, Ordering::Relaxed);
        self.bytes_pushed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a successful pop.
    #[inline]
    pub fn record_pop(&self, bytes: u64) {
        self.records_popped.fetch_add(1, Ordering::Relaxed);
        self.bytes_popped.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records one absorbed transient conflict.
    #[inline]
    pub fn record_conflict_retry(&self) {
        self.conflicts_retried.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a clear operation.
    #[inline]
    pub fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Creates a snapshot of the statistics.
    pub fn snapshot(&self) -> BufferStats {
        BufferStats {
            records_pushed: self.records_pushed.load(Ordering::Relaxed),
            records_popped: self.records_popped.load(Ordering::Relaxed),
            bytes_pushed: self.bytes_pushed.load(Ordering::Relaxed),
            bytes_popped: self.bytes_popped.load(Ordering::Relaxed),
            conflicts_retried: self.conflicts_retried.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

/// Immutable snapshot of buffer statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferStats {
    /// Total records pushed (cumulative).
    pub records_pushed: u64,
    /// Total records popped (cumulative).
    pub records_popped: u64,
    /// Total bytes pushed (cumulative).
    pub bytes_pushed: u64,
    /// Total bytes popped (cumulative).
    pub bytes_popped: u64,
    /// Transient store conflicts absorbed by the retry loop (cumulative).
    pub conflicts_retried: u64,
    /// Number of clear operations (cumulative).
    pub clears: u64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_counters() {
        let stats = BufferStatsInner::new();

        stats.record_push(3, 300);
        stats.record_pop(100);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.records_pushed, 3);
        assert_eq!(snapshot.bytes_pushed, 300);
        assert_eq!(snapshot.records_popped, 1);
        assert_eq!(snapshot.bytes_popped, 100);
    }

    #[test]
    fn test_conflict_and_clear_counters() {
        let stats = BufferStatsInner::new();

        stats.record_conflict_retry();
        stats.record_conflict_retry();
        stats.record_clear();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.conflicts_retried, 2);
        assert_eq!(snapshot.clears, 1);
    }
}
