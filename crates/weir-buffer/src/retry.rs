// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Transparent retry of transient store conflicts.
//!
//! The backing store may reject an operation with a transient conflict when
//! concurrent transactions collide. The buffer retries such failures until
//! they succeed; callers of the public operations never observe them. Any
//! other store error aborts the loop and propagates.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use weir_core::error::StoreResult;

use crate::stats::BufferStatsInner;

/// Runs a store operation, retrying transient conflicts until it succeeds or
/// fails with a non-transient error.
///
/// `call` is invoked once per attempt; each attempt re-clones whatever
/// payload it writes.
pub(crate) async fn with_conflict_retry<T, F, Fut>(
    operation: &'static str,
    delay: Duration,
    stats: &BufferStatsInner,
    mut call: F,
) -> StoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = StoreResult<T>>,
{
    let mut attempt = 0u32;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() => {
                attempt += 1;
                stats.record_conflict_retry();
                debug!(
                    operation,
                    attempt,
                    error = %error,
                    "Retrying store operation after transient conflict"
                );
                if delay.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(delay).await;
                }
            }
            Err(error) => return Err(error),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use weir_core::error::StoreError;

    #[tokio::test]
    async fn test_retries_until_success() {
        let stats = BufferStatsInner::new();
        let failures = AtomicU32::new(3);
        let failures = &failures;

        let result = with_conflict_retry("test_op", Duration::ZERO, &stats, || async move {
            if failures.load(Ordering::SeqCst) > 0 {
                failures.fetch_sub(1, Ordering::SeqCst);
                Err(StoreError::transient_conflict("busy"))
            } else {
                Ok(42u32)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(stats.snapshot().conflicts_retried, 3);
    }

    #[tokio::test]
    async fn test_fatal_error_aborts() {
        let stats = BufferStatsInner::new();
        let attempts = AtomicU32::new(0);

        let result: StoreResult<()> =
            with_conflict_retry("test_op", Duration::ZERO, &stats, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(StoreError::io("disk failure")) }
            })
            .await;

        assert!(matches!(result.unwrap_err(), StoreError::Io { .. }));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(stats.snapshot().conflicts_retried, 0);
    }
}
