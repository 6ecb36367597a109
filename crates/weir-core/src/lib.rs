// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # weir-core
//!
//! Shared types and the unified error hierarchy for the weir spill buffer.
//!
//! This crate provides the foundational pieces used across all weir
//! components:
//!
//! - **Types**: `Timestamp`, `Record`, `StoredEntry`, `Namespace`
//! - **Error**: `WeirError` root type with `StoreError` and `BufferError`
//!   branches, including the transient-conflict classification the buffer
//!   core's retry loop relies on
//!
//! ## Example
//!
//! ```rust
//! use weir_core::types::{Namespace, Record, Timestamp};
//!
//! let record = Record::new(Timestamp::new(12, 1), b"event-payload".to_vec());
//! assert_eq!(record.order_key(), Timestamp::new(12, 1));
//!
//! let ns = Namespace::default_namespace();
//! assert!(ns.as_str().starts_with("local."));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod types;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
