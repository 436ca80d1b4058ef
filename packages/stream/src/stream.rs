//! The multi-item primitive and its delivery machinery

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rill_runtime::{Failure, Subscription, SubscriptionCell, SubscriptionState};

/// Event consumer side of one subscription. Operators implement this to
/// transform the event flow; the terminal implementation wraps the
/// subscriber's callbacks.
pub(crate) trait Sink<T>: Send {
    fn item(&mut self, item: T);
    fn failure(&mut self, failure: Failure);
    fn complete(&mut self);
}

/// One hop of a subscription chain: a cell for lifecycle/demand plus the
/// serialized sink events are delivered into.
///
/// Delivery discipline: every dispatch acquires the sink mutex, re-checks
/// the lifecycle state inside the lock, then calls the sink. That gives each
/// subscriber single-writer delivery even when producers emit from foreign
/// threads. Dispatch never performs demand accounting; only [`emit`]
/// (the source-facing path) consumes demand.
///
/// Pass-through operators share one cell across several hops, so the cell's
/// state transition cannot double as a per-hop delivery guard: the first hop
/// to see the terminal event flips the cell, and every hop forwards it
/// exactly once behind its own `finished` flag. A cancelled cell delivers
/// nothing.
///
/// [`emit`]: Downstream::emit
pub(crate) struct Downstream<T> {
    cell: Arc<SubscriptionCell>,
    sink: Arc<Mutex<Box<dyn Sink<T>>>>,
    finished: Arc<AtomicBool>,
}

impl<T> Clone for Downstream<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            sink: Arc::clone(&self.sink),
            finished: Arc::clone(&self.finished),
        }
    }
}

impl<T: Send + 'static> Downstream<T> {
    pub(crate) fn new(cell: Arc<SubscriptionCell>, sink: impl Sink<T> + 'static) -> Self {
        Self {
            cell,
            sink: Arc::new(Mutex::new(Box::new(sink))),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn cell(&self) -> &Arc<SubscriptionCell> {
        &self.cell
    }

    /// Forward an item without touching demand. Dropped once the
    /// subscription is no longer live.
    pub(crate) fn dispatch_item(&self, item: T) {
        let mut sink = self.sink.lock();
        if !self.cell.is_live() {
            return;
        }
        sink.item(item);
    }

    /// Terminate with a failure. The first hop to reach the cell wins the
    /// state transition; duplicate terminations at the same hop vanish.
    pub(crate) fn dispatch_failure(&self, failure: Failure) {
        let mut sink = self.sink.lock();
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.cell.terminate(SubscriptionState::Failed) && self.cell.is_cancelled() {
            return;
        }
        sink.failure(failure);
    }

    /// Terminate with completion, same once-per-hop rule as failures.
    pub(crate) fn dispatch_complete(&self) {
        let mut sink = self.sink.lock();
        if self.finished.swap(true, Ordering::AcqRel) {
            return;
        }
        if !self.cell.terminate(SubscriptionState::Completed) && self.cell.is_cancelled() {
            return;
        }
        sink.complete();
    }

    /// Source-facing emission: consume one unit of demand, then dispatch.
    ///
    /// Emitting with zero outstanding demand is a protocol violation and
    /// fails the subscription (fail-fast policy). Emitting after the
    /// subscriber is gone reports [`Failure::Cancelled`] to the producer.
    pub(crate) fn emit(&self, item: T) -> Result<(), Failure> {
        if !self.cell.is_live() {
            return Err(Failure::Cancelled);
        }
        if !self.cell.demand().try_consume() {
            self.dispatch_failure(Failure::BackpressureViolation);
            return Err(Failure::BackpressureViolation);
        }
        self.dispatch_item(item);
        Ok(())
    }
}

type OnSubscribe<T> = dyn Fn(Downstream<T>) + Send + Sync;

/// Zero-or-more asynchronously produced items terminated by exactly one of
/// completion or failure.
///
/// A `Stream` is a recipe: cloning it clones the composition, and every
/// `subscribe` re-runs production from the start. Finite sources like
/// [`from_items`](Stream::from_items) are therefore replayable per
/// subscription.
pub struct Stream<T> {
    on_subscribe: Arc<OnSubscribe<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            on_subscribe: Arc::clone(&self.on_subscribe),
        }
    }
}

impl<T: Send + 'static> Stream<T> {
    pub(crate) fn from_on_subscribe(f: impl Fn(Downstream<T>) + Send + Sync + 'static) -> Self {
        Self {
            on_subscribe: Arc::new(f),
        }
    }

    /// Wire an operator (or subscriber) chain into this stream's producer.
    pub(crate) fn attach(&self, downstream: Downstream<T>) {
        (self.on_subscribe)(downstream);
    }

    /// Subscribe with item/failure/completion handlers and an initial demand
    /// grant. Exactly one of the terminal handlers fires, after which no
    /// further callback of any kind is invoked. The returned handle grows
    /// demand with `request(n)` and stops the subscription with `cancel()`.
    pub fn subscribe(
        &self,
        on_item: impl FnMut(T) + Send + 'static,
        on_failure: impl FnOnce(Failure) + Send + 'static,
        on_complete: impl FnOnce() + Send + 'static,
        initial_demand: u64,
    ) -> Subscription {
        let cell = SubscriptionCell::root();
        cell.activate();
        let downstream = Downstream::new(
            Arc::clone(&cell),
            CallbackSink {
                on_item: Some(Box::new(on_item)),
                on_failure: Some(Box::new(on_failure)),
                on_complete: Some(Box::new(on_complete)),
            },
        );
        self.attach(downstream);
        if initial_demand > 0 {
            cell.request(initial_demand);
        }
        Subscription::new(cell)
    }
}

/// Terminal sink wrapping the subscriber's callbacks. Handlers are dropped
/// at the terminal event so resources captured by them (channel senders,
/// emitter handles) are released promptly.
struct CallbackSink<T> {
    on_item: Option<Box<dyn FnMut(T) + Send>>,
    on_failure: Option<Box<dyn FnOnce(Failure) + Send>>,
    on_complete: Option<Box<dyn FnOnce() + Send>>,
}

impl<T: Send> Sink<T> for CallbackSink<T> {
    fn item(&mut self, item: T) {
        if let Some(on_item) = self.on_item.as_mut() {
            on_item(item);
        }
    }

    fn failure(&mut self, failure: Failure) {
        self.on_item = None;
        self.on_complete = None;
        if let Some(on_failure) = self.on_failure.take() {
            on_failure(failure);
        }
    }

    fn complete(&mut self) {
        self.on_item = None;
        self.on_failure = None;
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}
