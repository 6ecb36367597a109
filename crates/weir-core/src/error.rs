// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for weir.
//!
//! This module defines the error taxonomy the buffer core is built around:
//!
//! - **Transient store conflicts** are the only retryable condition. The
//!   buffer retries them internally; callers never observe them.
//! - **Fatal store errors** propagate unchanged to the caller of the
//!   operation in progress.
//! - **Misuse** (operating on a closed buffer, malformed stored entries) is a
//!   programming error, fatal, never retried.
//! - **Not-found** on an empty buffer is not an error at all; it is a normal
//!   `Option`/`bool` result and does not appear here.
//!
//! # Error Hierarchy
//!
//! ```text
//! WeirError (root)
//! ├── StoreError   - Backing store operations
//! └── BufferError  - Buffer core operations
//! ```
//!
//! # Examples
//!
//! ```
//! use weir_core::error::{StoreError, WeirError};
//!
//! let error = StoreError::transient_conflict("write-write conflict on key 4.1");
//! assert!(error.is_transient());
//!
//! let root: WeirError = error.into();
//! assert!(root.is_retryable());
//! ```

use thiserror::Error;

// =============================================================================
// WeirError - Root Error Type
// =============================================================================

/// The root error type for weir.
///
/// All errors in weir can be converted to this type, providing a unified
/// handling interface for embedding pipelines.
#[derive(Debug, Error)]
pub enum WeirError {
    /// Backing store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Buffer core error.
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
}

impl WeirError {
    /// Returns `true` if this error is retryable.
    ///
    /// Only transient store conflicts qualify. The buffer core retries them
    /// internally, so a conflict escaping to this level means the caller is
    /// driving the store directly.
    pub fn is_retryable(&self) -> bool {
        match self {
            WeirError::Store(e) => e.is_transient(),
            WeirError::Buffer(e) => e.is_retryable(),
        }
    }

    /// Returns the error type as a string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            WeirError::Store(_) => "store",
            WeirError::Buffer(_) => "buffer",
        }
    }
}

// =============================================================================
// StoreError
// =============================================================================

/// Errors reported by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Concurrent-transaction conflict expected to succeed on retry.
    ///
    /// This is the only variant the buffer core retries; it is never
    /// surfaced through the buffer's public operations.
    #[error("Transient store conflict: {message}")]
    TransientConflict {
        /// Store-reported conflict detail.
        message: String,
    },

    /// The backing structure does not exist.
    #[error("Structure missing: {namespace}")]
    StructureMissing {
        /// The namespace that was addressed.
        namespace: String,
    },

    /// The backing structure already exists and cannot be created again.
    #[error("Structure already exists: {namespace}")]
    StructureExists {
        /// The namespace that was addressed.
        namespace: String,
    },

    /// An entry with the same key already exists.
    ///
    /// Whether a store reports this or silently overwrites is store-defined;
    /// the buffer core depends on neither beyond the caller's key-uniqueness
    /// precondition.
    #[error("Duplicate key: {key}")]
    DuplicateKey {
        /// The colliding key, rendered for diagnostics.
        key: String,
    },

    /// Underlying storage I/O failure.
    #[error("Store I/O error: {message}")]
    Io {
        /// Error message.
        message: String,
        /// Underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Creates a transient conflict error.
    pub fn transient_conflict(message: impl Into<String>) -> Self {
        Self::TransientConflict {
            message: message.into(),
        }
    }

    /// Creates a structure-missing error.
    pub fn structure_missing(namespace: impl Into<String>) -> Self {
        Self::StructureMissing {
            namespace: namespace.into(),
        }
    }

    /// Creates a structure-exists error.
    pub fn structure_exists(namespace: impl Into<String>) -> Self {
        Self::StructureExists {
            namespace: namespace.into(),
        }
    }

    /// Creates a duplicate-key error.
    pub fn duplicate_key(key: impl ToString) -> Self {
        Self::DuplicateKey {
            key: key.to_string(),
        }
    }

    /// Creates an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` if this error is a transient conflict.
    ///
    /// Distinguishes the one condition the buffer core retries from all
    /// others, which are fatal to the operation in progress.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::TransientConflict { .. })
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            StoreError::TransientConflict { .. } => "transient_conflict",
            StoreError::StructureMissing { .. } => "structure_missing",
            StoreError::StructureExists { .. } => "structure_exists",
            StoreError::DuplicateKey { .. } => "duplicate_key",
            StoreError::Io { .. } => "io",
        }
    }
}

// =============================================================================
// BufferError
// =============================================================================

/// Errors reported by the buffer core.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Operation attempted on a buffer that has not been started up or has
    /// already been shut down.
    ///
    /// Also returned to waiters released by `shutdown`, since the buffer is
    /// no longer usable.
    #[error("Buffer is closed")]
    Closed,

    /// `startup` called on a buffer that is already open.
    #[error("Buffer is already open")]
    AlreadyOpen,

    /// A stored entry did not decode to a record.
    #[error("Corrupted entry: {message}")]
    CorruptedEntry {
        /// Decode failure detail.
        message: String,
    },

    /// Backing store error during a buffer operation.
    ///
    /// Transient conflicts are consumed by the internal retry loop; this
    /// variant only ever carries fatal store errors.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl BufferError {
    /// Creates a corrupted-entry error.
    pub fn corrupted_entry(message: impl Into<String>) -> Self {
        Self::CorruptedEntry {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    ///
    /// Always `false` from the public surface: conflicts are retried before
    /// they can escape, and everything else is fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            BufferError::Store(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Returns the error type for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            BufferError::Closed => "closed",
            BufferError::AlreadyOpen => "already_open",
            BufferError::CorruptedEntry { .. } => "corrupted_entry",
            BufferError::Store(e) => e.error_type(),
        }
    }
}

// =============================================================================
// Result Aliases
// =============================================================================

/// A Result type with WeirError.
pub type WeirResult<T> = Result<T, WeirError>;

/// A Result type with StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

/// A Result type with BufferError.
pub type BufferResult<T> = Result<T, BufferError>;

// =============================================================================
// Tests
// =============================================================================
