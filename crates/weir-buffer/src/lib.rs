// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # weir-buffer
//!
//! Durable, timestamp-ordered, capacity-bounded FIFO buffer that spills to a
//! transactional backing store.
//!
//! The buffer decouples a producer ingesting an ordered record stream from a
//! consumer draining it at a different rate. Backlog is bounded by storage,
//! not process memory: every record is written through the store and only
//! count/size accounting stays in memory. Pops and peeks always resolve the
//! lowest-keyed (oldest) entry, so the buffer reorders by timestamp rather
//! than preserving call-arrival order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weir_buffer::{BufferConfig, SpillBuffer};
//! use weir_core::types::{Record, Timestamp};
//! use weir_store::{MemoryStore, StoreSession};
//!
//! let store = Arc::new(MemoryStore::new());
//! let buffer = SpillBuffer::with_default_namespace(store, BufferConfig::default());
//! let session = StoreSession::new();
//!
//! buffer.startup(&session).await?;
//! buffer.push(&session, Record::new(Timestamp::new(1, 0), payload)).await?;
//! let record = buffer.blocking_pop(&session).await?;
//! buffer.shutdown(&session).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
mod retry;
pub mod stats;

pub use buffer::SpillBuffer;
pub use config::{BufferConfig, BufferConfigBuilder};
pub use stats::{BufferStats, BufferStatsInner};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
