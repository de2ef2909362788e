//! Consumed-payment-id tracking for replay rejection.
//!
//! Verification itself is stateless per call; rejecting the reuse of a
//! `payment_id` requires remembering which ids were already accepted.
//! [`ReplayGuard`] is that seam: [`MemoryReplayGuard`] covers a
//! single-process server, and deployments spanning processes can back the
//! trait with a shared store.

use dashmap::DashSet;

/// Records consumed `payment_id`s.
pub trait ReplayGuard: Send + Sync {
    /// Atomically marks `payment_id` as consumed.
    ///
    /// Returns `true` if the id was fresh and is now consumed, `false` if
    /// it had already been consumed. Two concurrent calls with the same id
    /// must not both observe `true`.
    fn consume(&self, payment_id: &str) -> bool;
}

/// In-memory replay guard for single-process servers.
///
/// Entries are retained for the process lifetime; offers expire within
/// minutes, so the set grows with accepted payments only.
#[derive(Debug, Default)]
pub struct MemoryReplayGuard {
    consumed: DashSet<String>,
}

impl MemoryReplayGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of consumed ids currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    /// Whether no id has been consumed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}

impl ReplayGuard for MemoryReplayGuard {
    fn consume(&self, payment_id: &str) -> bool {
        self.consumed.insert(payment_id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_consumes_second_is_rejected() {
        let guard = MemoryReplayGuard::new();
        assert!(guard.consume("p1"));
        assert!(!guard.consume("p1"));
        assert!(guard.consume("p2"));
        assert_eq!(guard.len(), 2);
    }

    #[test]
    fn concurrent_consumers_agree_on_a_single_winner() {
        use std::sync::Arc;

        let guard = Arc::new(MemoryReplayGuard::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.consume("contested"))
            })
            .collect();
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }
}
