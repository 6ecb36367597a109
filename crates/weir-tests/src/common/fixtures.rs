// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Pre-built test data and buffer setups.
//!
//! Fixtures keep the integration suites focused on behavior: every test gets
//! records with predictable keys and payloads, and a freshly started buffer
//! bound to a namespace derived from the test name so parallel tests never
//! collide.

use std::sync::Arc;

use weir_buffer::{BufferConfig, SpillBuffer};
use weir_core::types::{Namespace, Record, Timestamp};
use weir_store::{MemoryStore, StoreSession};

/// Creates a record keyed at `(secs, 0)` with a small recognizable payload.
pub fn record(secs: u32) -> Record {
    record_at(secs, 0)
}

/// Creates a record with an explicit `(secs, inc)` key.
pub fn record_at(secs: u32, inc: u32) -> Record {
    Record::new(
        Timestamp::new(secs, inc),
        format!("entry-{}-{}", secs, inc).into_bytes(),
    )
}

/// Creates a record with a payload of exactly `len` bytes.
pub fn sized_record(secs: u32, len: usize) -> Record {
    Record::new(Timestamp::new(secs, 0), vec![0x5A; len])
}

/// Creates a batch of records keyed `first..first + count`.
pub fn record_batch(first: u32, count: u32) -> Vec<Record> {
    (first..first + count).map(record).collect()
}

/// Creates a per-test namespace so parallel tests never share a structure.
pub fn test_namespace(test_name: &str) -> Namespace {
    Namespace::new(format!("local.weir_test.{}", test_name))
}

/// A started buffer over a fresh in-memory store, plus the pieces tests poke
/// at directly.
pub struct BufferFixture {
    /// The backing store, exposed for conflict injection and existence
    /// checks.
    pub store: Arc<MemoryStore>,
    /// The started buffer.
    pub buffer: Arc<SpillBuffer>,
    /// A session to drive operations with.
    pub session: StoreSession,
}

/// Creates and starts a buffer with the testing config.
pub async fn started_buffer(test_name: &str) -> BufferFixture {
    started_buffer_with_config(test_name, BufferConfig::for_testing()).await
}

/// Creates and starts a buffer with an explicit config.
pub async fn started_buffer_with_config(test_name: &str, config: BufferConfig) -> BufferFixture {
    let store = Arc::new(MemoryStore::new());
    let buffer = Arc::new(SpillBuffer::new(
        store.clone(),
        test_namespace(test_name),
        config,
    ));
    let session = StoreSession::new();
    buffer
        .startup(&session)
        .await
        .expect("fixture startup failed");

    BufferFixture {
        store,
        buffer,
        session,
    }
}
