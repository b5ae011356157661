//! Debounced search dispatch for type-ahead inputs (patient lookup and
//! the drug catalog).
//!
//! Rapid keystrokes coalesce into at most one in-flight request per quiet
//! period, and results apply last-query-wins by recency: a ticket issued
//! for an older query goes stale the moment a newer one arrives, even if
//! the older response lands later. Teardown bumps the generation so a
//! pending debounce never fires after the screen is gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Proof that a query survived its quiet period. Carries the generation
/// it was issued for; check `is_current` again before committing results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

/// Generation-counter debouncer. One instance per search input.
pub struct Debouncer {
    generation: AtomicU64,
    quiet_period: Duration,
}

impl Debouncer {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            generation: AtomicU64::new(0),
            quiet_period,
        }
    }

    /// Register a new query and wait out the quiet period.
    ///
    /// Returns `None` when a newer query (or a cancel) superseded this one
    /// while waiting — the caller must not issue the request.
    pub async fn debounce(&self) -> Option<SearchTicket> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.quiet_period).await;
        if self.generation.load(Ordering::SeqCst) == generation {
            Some(SearchTicket { generation })
        } else {
            None
        }
    }

    /// Is this ticket still the newest query? Callers re-check after the
    /// network round trip, discarding stale responses regardless of
    /// arrival order.
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Teardown: invalidate anything pending or in flight.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> Debouncer {
        Debouncer::new(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn single_query_survives_quiet_period() {
        let debouncer = fast();
        let ticket = debouncer.debounce().await;
        assert!(ticket.is_some());
        assert!(debouncer.is_current(ticket.unwrap()));
    }

    #[tokio::test]
    async fn rapid_keystrokes_coalesce_to_latest() {
        let debouncer = std::sync::Arc::new(fast());

        // Three keystrokes, each superseding the previous inside the
        // quiet window.
        let first = {
            let d = debouncer.clone();
            tokio::spawn(async move { d.debounce().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = {
            let d = debouncer.clone();
            tokio::spawn(async move { d.debounce().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        let third = debouncer.debounce().await;

        assert!(first.await.unwrap().is_none());
        assert!(second.await.unwrap().is_none());
        assert!(third.is_some());
    }

    #[tokio::test]
    async fn stale_ticket_rejected_after_newer_query() {
        let debouncer = fast();
        let old = debouncer.debounce().await.unwrap();

        // A newer query arrives while the old request is "in flight".
        let new = debouncer.debounce().await.unwrap();

        assert!(!debouncer.is_current(old));
        assert!(debouncer.is_current(new));
    }

    #[tokio::test]
    async fn cancel_stops_pending_debounce() {
        let debouncer = std::sync::Arc::new(fast());
        let pending = {
            let d = debouncer.clone();
            tokio::spawn(async move { d.debounce().await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        debouncer.cancel();
        assert!(pending.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancel_invalidates_issued_tickets() {
        let debouncer = fast();
        let ticket = debouncer.debounce().await.unwrap();
        debouncer.cancel();
        assert!(!debouncer.is_current(ticket));
    }
}
