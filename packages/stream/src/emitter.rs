//! Producer-side emission handle for `Stream`

use rill_runtime::Failure;

use crate::stream::Downstream;

/// Handle a stream producer uses to push items, completion or failure into
/// one subscription.
///
/// `emit` is demand-accounted: each successful call consumes one unit of the
/// subscriber's outstanding demand, and pushing with nothing outstanding
/// terminates the subscription with [`Failure::BackpressureViolation`]
/// (fail-fast, not buffered). Producers driving emission from their own
/// execution context should poll [`requested`](StreamEmitter::requested) and
/// [`is_cancelled`](StreamEmitter::is_cancelled) between emissions.
///
/// Delivery to the subscriber is serialized; calling `emit` re-entrantly
/// from inside a subscriber callback of the same subscription is not
/// supported.
pub struct StreamEmitter<T> {
    downstream: Downstream<T>,
}

impl<T> Clone for StreamEmitter<T> {
    fn clone(&self) -> Self {
        Self {
            downstream: self.downstream.clone(),
        }
    }
}

impl<T: Send + 'static> StreamEmitter<T> {
    pub(crate) fn new(downstream: Downstream<T>) -> Self {
        Self { downstream }
    }

    /// Push one item. `Err(Cancelled)` when the subscriber is gone,
    /// `Err(BackpressureViolation)` when demand is exhausted (the
    /// subscription is failed as a side effect).
    pub fn emit(&self, item: T) -> Result<(), Failure> {
        self.downstream.emit(item)
    }

    /// Signal normal end of the sequence. No-op after any terminal event.
    pub fn complete(&self) {
        self.downstream.dispatch_complete();
    }

    /// Terminate the sequence with a failure. No-op after any terminal
    /// event.
    pub fn fail(&self, failure: Failure) {
        self.downstream.dispatch_failure(failure);
    }

    /// Outstanding demand not yet consumed by emissions.
    pub fn requested(&self) -> u64 {
        self.downstream.cell().demand().outstanding()
    }

    /// True once the subscription reached any terminal state, including
    /// downstream cancellation. Producers should stop generating work when
    /// this turns true.
    pub fn is_cancelled(&self) -> bool {
        !self.downstream.cell().is_live()
    }
}
