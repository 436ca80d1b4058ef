//! The single-value primitive

use std::sync::Arc;

use rill_runtime::{Cancellation, Failure, SubscriptionCell};

use crate::emitter::{EventualEmitter, Handlers};

type Producer<T> = dyn Fn(EventualEmitter<T>) + Send + Sync;

/// Exactly one asynchronous outcome: a success value or a [`Failure`].
///
/// Construction and combinator application are free of side effects; the
/// producing computation runs when (and each time) `subscribe` is called.
/// Cloning an `Eventual` clones the recipe, not a result: two subscriptions
/// to a [`deferred`](Eventual::deferred) eventual invoke the factory twice
/// and may observe independent outcomes, while subscriptions to
/// [`item`](Eventual::item) replay the same value without recomputation.
pub struct Eventual<T> {
    producer: Arc<Producer<T>>,
}

impl<T> Clone for Eventual<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Arc::clone(&self.producer),
        }
    }
}

impl<T: Send + 'static> Eventual<T> {
    /// Build an eventual from an emitter callback, invoked fresh on every
    /// subscription. The callback may complete synchronously or hand the
    /// emitter to another execution context.
    pub fn from_emitter(producer: impl Fn(EventualEmitter<T>) + Send + Sync + 'static) -> Self {
        Self {
            producer: Arc::new(producer),
        }
    }

    /// Immediately successful. The value is replayed to every subscriber.
    pub fn item(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_emitter(move |emitter| emitter.complete(value.clone()))
    }

    /// Immediately failed.
    pub fn failed(failure: Failure) -> Self {
        Self::from_emitter(move |emitter| emitter.fail(failure.clone()))
    }

    /// Defer construction until subscription time: the factory runs once per
    /// subscriber and each subscriber gets its own inner eventual.
    pub fn deferred(factory: impl Fn() -> Eventual<T> + Send + Sync + 'static) -> Self {
        Self::from_emitter(move |emitter| {
            let inner = factory();
            let success = emitter.clone();
            let failure = emitter.clone();
            let upstream = inner.subscribe(
                move |value| success.complete(value),
                move |err| failure.fail(err),
            );
            emitter.cell().link_upstream(upstream.cell());
        })
    }

    /// Run the producing computation and observe the outcome. Exactly one of
    /// the two callbacks fires, at most once. The returned handle cancels
    /// this subscription only; other subscribers are unaffected.
    pub fn subscribe(
        &self,
        on_success: impl FnOnce(T) + Send + 'static,
        on_failure: impl FnOnce(Failure) + Send + 'static,
    ) -> Cancellation {
        let cell = SubscriptionCell::root();
        cell.activate();
        let emitter = EventualEmitter::new(
            Arc::clone(&cell),
            Handlers {
                on_success: Box::new(on_success),
                on_failure: Box::new(on_failure),
            },
        );
        (self.producer)(emitter);
        Cancellation::new(cell)
    }
}
