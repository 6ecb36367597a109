// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Weir Integration Tests
//!
//! This crate provides integration tests for the weir spill buffer, along
//! with shared fixtures and helpers.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built records, batches, and buffer setups
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p weir-tests
//!
//! # Run specific test suite
//! cargo test -p weir-tests --test integration_buffer
//! cargo test -p weir-tests --test integration_store
//!
//! # Run with verbose output
//! cargo test -p weir-tests -- --nocapture
//! ```

pub mod common;
