//! Keyed expiry timers for pending orders
//!
//! Every order gets its own one-shot timer, registered under its order id,
//! so concurrent orders never clobber each other's timers. A timer that
//! fires after the order already left the pending state is a safe no-op:
//! the cancellation it attempts loses the claim race and the resulting
//! "not found"/"invalid status" outcome is discarded.

use crate::orders::engine::OrderEngine;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Registry of per-order cancellation timers
///
/// Owned by the [`OrderEngine`]; the engine hands each armed task a weak
/// reference to itself so shutdown never deadlocks on the cycle.
pub struct ExpiryTimers {
    timers: Arc<DashMap<String, CancellationToken>>,
    shutdown: CancellationToken,
    /// Captured at construction so timers can be armed from any thread
    runtime: tokio::runtime::Handle,
}

impl ExpiryTimers {
    /// Must be created from within a tokio runtime
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            shutdown,
            runtime: tokio::runtime::Handle::current(),
        }
    }

    /// Arm a one-shot auto-cancel timer for an order
    ///
    /// Re-arming an order id replaces (and cancels) the previous timer.
    pub fn arm(
        &self,
        engine: Weak<OrderEngine>,
        user_id: String,
        order_id: String,
        after: Duration,
    ) {
        let token = CancellationToken::new();
        if let Some(prev) = self.timers.insert(order_id.clone(), token.clone()) {
            prev.cancel();
        }

        let timers = Arc::clone(&self.timers);
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => {}
                _ = token.cancelled() => return,
                _ = shutdown.cancelled() => return,
            }
            timers.remove(&order_id);
            if let Some(engine) = engine.upgrade() {
                engine.handle_expiry(&user_id, &order_id);
            }
        });
    }

    /// Suppress the timer for an order (best-effort)
    ///
    /// A no-op for unknown ids — the timer may already have fired, or the
    /// order may never have had one.
    pub fn disarm(&self, order_id: &str) {
        if let Some((_, token)) = self.timers.remove(order_id) {
            token.cancel();
        }
    }

    /// Number of currently armed timers
    pub fn active(&self) -> usize {
        self.timers.len()
    }
}
