//! Per-item mapping and observation

use std::fmt::Display;
use std::sync::Arc;

use rill_runtime::Failure;

use crate::stream::{Downstream, Sink, Stream};

struct MapSink<U, F> {
    downstream: Downstream<U>,
    f: Arc<F>,
}

impl<T, U, F> Sink<T> for MapSink<U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
{
    fn item(&mut self, item: T) {
        self.downstream.dispatch_item((self.f)(item));
    }

    fn failure(&mut self, failure: Failure) {
        self.downstream.dispatch_failure(failure);
    }

    fn complete(&mut self) {
        self.downstream.dispatch_complete();
    }
}

struct TryMapSink<U, F> {
    downstream: Downstream<U>,
    f: Arc<F>,
}

impl<T, U, E, F> Sink<T> for TryMapSink<U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    E: Display,
    F: Fn(T) -> Result<U, E> + Send + Sync + 'static,
{
    fn item(&mut self, item: T) {
        match (self.f)(item) {
            Ok(mapped) => self.downstream.dispatch_item(mapped),
            // Terminating the shared cell also stops upstream production.
            Err(err) => self
                .downstream
                .dispatch_failure(Failure::transform(err.to_string())),
        }
    }

    fn failure(&mut self, failure: Failure) {
        self.downstream.dispatch_failure(failure);
    }

    fn complete(&mut self) {
        self.downstream.dispatch_complete();
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Map each item. Demand and cancellation pass straight through.
    pub fn map<U: Send + 'static>(
        self,
        f: impl Fn(T) -> U + Send + Sync + 'static,
    ) -> Stream<U> {
        let f = Arc::new(f);
        Stream::from_on_subscribe(move |downstream: Downstream<U>| {
            let sink = MapSink {
                downstream: downstream.clone(),
                f: Arc::clone(&f),
            };
            self.attach(Downstream::new(Arc::clone(downstream.cell()), sink));
        })
    }

    /// Map each item with a fallible function; the first `Err` fails the
    /// stream with [`Failure::Transform`] and stops upstream production.
    pub fn try_map<U, E>(
        self,
        f: impl Fn(T) -> Result<U, E> + Send + Sync + 'static,
    ) -> Stream<U>
    where
        U: Send + 'static,
        E: Display,
    {
        let f = Arc::new(f);
        Stream::from_on_subscribe(move |downstream: Downstream<U>| {
            let sink = TryMapSink {
                downstream: downstream.clone(),
                f: Arc::clone(&f),
            };
            self.attach(Downstream::new(Arc::clone(downstream.cell()), sink));
        })
    }

    /// Observe each item without consuming it.
    pub fn invoke(self, f: impl Fn(&T) + Send + Sync + 'static) -> Stream<T> {
        self.map(move |item| {
            f(&item);
            item
        })
    }
}
