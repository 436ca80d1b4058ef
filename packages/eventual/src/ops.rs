//! Combinators over a single eventual value
//!
//! Every operator here is lazy: it builds a new recipe wrapping the upstream
//! one, and nothing executes until the result is subscribed. Failures pass
//! through untouched unless a `recover_*` operator converts them.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use rill_runtime::{Failure, Scheduler};

use crate::eventual::Eventual;
use crate::EventualEmitter;

impl<T: Send + 'static> Eventual<T> {
    /// Map the success value. A failure propagates unchanged.
    pub fn map<U: Send + 'static>(
        self,
        f: impl Fn(T) -> U + Send + Sync + 'static,
    ) -> Eventual<U> {
        let f = Arc::new(f);
        Eventual::from_emitter(move |emitter: EventualEmitter<U>| {
            let f = Arc::clone(&f);
            let success = emitter.clone();
            let failure = emitter.clone();
            let upstream = self.subscribe(
                move |value| success.complete(f(value)),
                move |err| failure.fail(err),
            );
            emitter.cell().link_upstream(upstream.cell());
        })
    }

    /// Map the success value with a fallible function; an `Err` becomes a
    /// [`Failure::Transform`].
    pub fn try_map<U, E>(
        self,
        f: impl Fn(T) -> Result<U, E> + Send + Sync + 'static,
    ) -> Eventual<U>
    where
        U: Send + 'static,
        E: Display,
    {
        let f = Arc::new(f);
        Eventual::from_emitter(move |emitter: EventualEmitter<U>| {
            let f = Arc::clone(&f);
            let settle = emitter.clone();
            let failure = emitter.clone();
            let upstream = self.subscribe(
                move |value| match f(value) {
                    Ok(mapped) => settle.complete(mapped),
                    Err(err) => settle.fail(Failure::transform(err.to_string())),
                },
                move |err| failure.fail(err),
            );
            emitter.cell().link_upstream(upstream.cell());
        })
    }

    /// Observe the success value without consuming it.
    pub fn invoke(self, f: impl Fn(&T) + Send + Sync + 'static) -> Eventual<T> {
        let f = Arc::new(f);
        self.map(move |value| {
            f(&value);
            value
        })
    }

    /// Convert any failure into the given success value.
    pub fn recover_with_item(self, fallback: T) -> Eventual<T>
    where
        T: Clone + Sync,
    {
        self.recover_with(move |_| fallback.clone())
    }

    /// Convert any failure into a success value derived from it.
    pub fn recover_with(self, f: impl Fn(Failure) -> T + Send + Sync + 'static) -> Eventual<T> {
        let f = Arc::new(f);
        Eventual::from_emitter(move |emitter: EventualEmitter<T>| {
            let f = Arc::clone(&f);
            let success = emitter.clone();
            let recovered = emitter.clone();
            let upstream = self.subscribe(
                move |value| success.complete(value),
                move |failure| recovered.complete(f(failure)),
            );
            emitter.cell().link_upstream(upstream.cell());
        })
    }

    /// Sequential composition: once this eventual succeeds, subscribe to the
    /// eventual produced by `f`. An upstream failure short-circuits without
    /// invoking `f`.
    pub fn and_then<U: Send + 'static>(
        self,
        f: impl Fn(T) -> Eventual<U> + Send + Sync + 'static,
    ) -> Eventual<U> {
        let f = Arc::new(f);
        Eventual::from_emitter(move |emitter: EventualEmitter<U>| {
            let f = Arc::clone(&f);
            let continue_with = emitter.clone();
            let failure = emitter.clone();
            let upstream = self.subscribe(
                move |value| {
                    let inner = f(value);
                    let success = continue_with.clone();
                    let inner_failure = continue_with.clone();
                    let inner_sub = inner.subscribe(
                        move |mapped| success.complete(mapped),
                        move |err| inner_failure.fail(err),
                    );
                    continue_with.cell().link_upstream(inner_sub.cell());
                },
                move |err| failure.fail(err),
            );
            emitter.cell().link_upstream(upstream.cell());
        })
    }

    /// Delay a success by a fixed duration on the given scheduler. Failures
    /// pass through undelayed.
    pub fn delay_by(self, delay: Duration, scheduler: Arc<dyn Scheduler>) -> Eventual<T> {
        Eventual::from_emitter(move |emitter: EventualEmitter<T>| {
            let scheduler = Arc::clone(&scheduler);
            let delayed = emitter.clone();
            let failure = emitter.clone();
            let upstream = self.subscribe(
                move |value| {
                    let settle = delayed.clone();
                    scheduler.schedule(delay, Box::new(move || settle.complete(value)));
                },
                move |err| failure.fail(err),
            );
            emitter.cell().link_upstream(upstream.cell());
        })
    }
}
