// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # weir-store
//!
//! Backing store contract for the weir spill buffer, plus an in-memory
//! reference implementation.
//!
//! The buffer core writes through a transactional, key-sorted store it does
//! not own. This crate defines that collaborator's surface:
//!
//! - [`BackingStore`]: structure lifecycle, single/batch insert, delete,
//!   delete-all, and extreme reads (minimum/maximum keyed entry)
//! - [`StoreSession`]: the caller-supplied transaction/session scope every
//!   store call executes within
//! - [`MemoryStore`]: a `BTreeMap`-backed store for tests and development,
//!   with transient-conflict injection for exercising the buffer's retry loop

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod memory;
pub mod traits;

pub use memory::MemoryStore;
pub use traits::{BackingStore, ScanDirection, StoreSession};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
