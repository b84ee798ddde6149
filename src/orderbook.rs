//! Shared order book state.
//!
//! [`OrderBookHandle`] is cloned into every component that reads the book.
//! Readers receive an immutable [`Arc`] of the current snapshot; the stream
//! publishes by swapping in a fully built replacement, so the lock is held
//! only for a pointer store and a reader never sees one side updated
//! without the other.

use std::sync::{Arc, PoisonError, RwLock};

use crate::models::book::OrderBookSnapshot;

/// Cheaply cloneable handle to the latest order book.
#[derive(Debug, Clone, Default)]
pub struct OrderBookHandle {
    current: Arc<RwLock<Arc<OrderBookSnapshot>>>,
}

impl OrderBookHandle {
    /// Creates a handle holding an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<OrderBookSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replaces the book with `snapshot`.
    pub(crate) fn publish(&self, snapshot: OrderBookSnapshot) {
        let next = Arc::new(snapshot);
        let previous = {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        // Last reference to the old book may be freed here, outside the lock.
        drop(previous);
    }
}
