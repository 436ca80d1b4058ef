//! Producer-side completion handle for `Eventual`

use std::sync::Arc;

use parking_lot::Mutex;
use rill_runtime::{Failure, SubscriptionCell, SubscriptionState};

pub(crate) struct Handlers<T> {
    pub(crate) on_success: Box<dyn FnOnce(T) + Send>,
    pub(crate) on_failure: Box<dyn FnOnce(Failure) + Send>,
}

/// Single-fire completion handle handed to an `Eventual` producer.
///
/// `complete` and `fail` deliver at most once between them: the first call
/// wins the terminal-state transition, every later call is a silent no-op.
/// A producer running on its own thread should poll [`is_cancelled`] between
/// units of work; cancellation is cooperative and never interrupts producer
/// code.
///
/// [`is_cancelled`]: EventualEmitter::is_cancelled
pub struct EventualEmitter<T> {
    cell: Arc<SubscriptionCell>,
    slot: Arc<Mutex<Option<Handlers<T>>>>,
}

impl<T> Clone for EventualEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T: Send + 'static> EventualEmitter<T> {
    pub(crate) fn new(cell: Arc<SubscriptionCell>, handlers: Handlers<T>) -> Self {
        Self {
            cell,
            slot: Arc::new(Mutex::new(Some(handlers))),
        }
    }

    /// Deliver the value. No-op if the outcome is already settled or the
    /// subscriber cancelled.
    pub fn complete(&self, value: T) {
        if !self.cell.terminate(SubscriptionState::Completed) {
            return;
        }
        if let Some(handlers) = self.slot.lock().take() {
            (handlers.on_success)(value);
        }
    }

    /// Deliver the failure. No-op if the outcome is already settled or the
    /// subscriber cancelled.
    pub fn fail(&self, failure: Failure) {
        if !self.cell.terminate(SubscriptionState::Failed) {
            return;
        }
        if let Some(handlers) = self.slot.lock().take() {
            (handlers.on_failure)(failure);
        }
    }

    /// Whether the subscriber has cancelled. Producers should stop
    /// side-effecting work once this turns true.
    pub fn is_cancelled(&self) -> bool {
        self.cell.is_cancelled()
    }

    /// Subscription cell backing this emitter. Operator implementations use
    /// it to link upstream subscriptions for cancellation propagation.
    pub fn cell(&self) -> &Arc<SubscriptionCell> {
        &self.cell
    }
}
