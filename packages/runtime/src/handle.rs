//! Subscriber-facing handles

use std::sync::Arc;

use crate::cell::{SubscriptionCell, SubscriptionState};

/// Handle to an active stream subscription: grow demand, or cancel.
#[derive(Clone)]
pub struct Subscription {
    cell: Arc<SubscriptionCell>,
}

impl Subscription {
    pub fn new(cell: Arc<SubscriptionCell>) -> Self {
        Self { cell }
    }

    /// Authorize `n` more item deliveries. Additive; saturates at
    /// [`crate::UNBOUNDED`].
    pub fn request(&self, n: u64) {
        self.cell.request(n);
    }

    /// Stop deliveries and signal producers upstream. Idempotent.
    pub fn cancel(&self) {
        self.cell.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cell.is_cancelled()
    }

    pub fn state(&self) -> SubscriptionState {
        self.cell.state()
    }

    /// Underlying cell, for operators layering on top of a raw subscription.
    pub fn cell(&self) -> &Arc<SubscriptionCell> {
        &self.cell
    }
}

/// Handle to a pending `Eventual` outcome: cancellation only, there is no
/// demand to manage for a single value.
#[derive(Clone)]
pub struct Cancellation {
    cell: Arc<SubscriptionCell>,
}

impl Cancellation {
    pub fn new(cell: Arc<SubscriptionCell>) -> Self {
        Self { cell }
    }

    /// Drop interest in the outcome. Idempotent; the producer observes the
    /// flag through its emitter.
    pub fn cancel(&self) {
        self.cell.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cell.is_cancelled()
    }

    pub fn cell(&self) -> &Arc<SubscriptionCell> {
        &self.cell
    }
}
