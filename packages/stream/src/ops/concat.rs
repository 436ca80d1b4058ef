//! Sequential flattening: one inner stream at a time, in order

use std::sync::Arc;

use parking_lot::Mutex;
use rill_eventual::Eventual;
use rill_runtime::{Demand, Failure, SubscriptionCell};

use crate::ops::into_stream::IntoStream;
use crate::stream::{Downstream, Sink, Stream};

/// Shared bookkeeping for one `concat_map` subscription.
struct ConcatState {
    /// Cell of the currently drained inner stream, if one is active.
    inner: Option<Arc<SubscriptionCell>>,
    /// The upstream has completed; the flattened stream completes once the
    /// current inner (if any) does.
    outer_done: bool,
    /// First downstream request has arrived and the upstream pull started.
    started: bool,
}

struct OuterSink<T, U, F> {
    downstream: Downstream<U>,
    f: Arc<F>,
    state: Arc<Mutex<ConcatState>>,
    outer_cell: Arc<SubscriptionCell>,
    _marker: std::marker::PhantomData<fn(T)>,
}

impl<T, U, F> Sink<T> for OuterSink<T, U, F>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Stream<U> + Send + Sync + 'static,
{
    fn item(&mut self, item: T) {
        let inner = (self.f)(item);
        // Inner emissions account against the subscriber's demand directly.
        let inner_cell = SubscriptionCell::internal(Arc::clone(self.downstream.cell().demand()));
        self.downstream.cell().link_upstream(&inner_cell);
        self.state.lock().inner = Some(Arc::clone(&inner_cell));
        inner.attach(Downstream::new(
            Arc::clone(&inner_cell),
            InnerSink {
                downstream: self.downstream.clone(),
                state: Arc::clone(&self.state),
                outer_cell: Arc::clone(&self.outer_cell),
                inner_cell: Arc::clone(&inner_cell),
            },
        ));
        // Demand granted before this inner existed still applies to it.
        inner_cell.signal(self.downstream.cell().demand().outstanding());
    }

    fn failure(&mut self, failure: Failure) {
        let inner = self.state.lock().inner.take();
        if let Some(inner) = inner {
            inner.cancel();
        }
        self.downstream.dispatch_failure(failure);
    }

    fn complete(&mut self) {
        let idle = {
            let mut state = self.state.lock();
            state.outer_done = true;
            state.inner.is_none()
        };
        if idle {
            self.downstream.dispatch_complete();
        }
    }
}

struct InnerSink<U> {
    downstream: Downstream<U>,
    state: Arc<Mutex<ConcatState>>,
    outer_cell: Arc<SubscriptionCell>,
    inner_cell: Arc<SubscriptionCell>,
}

impl<U: Send + 'static> Sink<U> for InnerSink<U> {
    fn item(&mut self, item: U) {
        self.downstream.dispatch_item(item);
    }

    fn failure(&mut self, failure: Failure) {
        self.state.lock().inner = None;
        self.outer_cell.cancel();
        self.downstream.dispatch_failure(failure);
    }

    fn complete(&mut self) {
        let outer_done = {
            let mut state = self.state.lock();
            state.inner = None;
            state.outer_done
        };
        self.downstream.cell().unlink_upstream(&self.inner_cell);
        if outer_done {
            self.downstream.dispatch_complete();
        } else {
            self.outer_cell.request(1);
        }
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Map each item to a stream and concatenate the results in order: the
    /// next upstream item is pulled only after the current inner stream
    /// completes, so inner sequences never interleave.
    ///
    /// An inner failure cancels the upstream; an upstream failure cancels the
    /// active inner.
    pub fn concat_map<U, F>(self, f: F) -> Stream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Stream<U> + Send + Sync + 'static,
    {
        let upstream = self;
        let f = Arc::new(f);
        Stream::from_on_subscribe(move |downstream: Downstream<U>| {
            // The upstream is pulled one item at a time on its own demand
            // counter; only inner items consume the subscriber's demand.
            let outer_cell = SubscriptionCell::internal(Arc::new(Demand::new(0)));
            downstream.cell().link_upstream(&outer_cell);

            let state = Arc::new(Mutex::new(ConcatState {
                inner: None,
                outer_done: false,
                started: false,
            }));

            let hook_state = Arc::clone(&state);
            let hook_outer = Arc::clone(&outer_cell);
            downstream.cell().on_request(move |n| {
                enum Wake {
                    Inner(Arc<SubscriptionCell>),
                    Start,
                    Nothing,
                }
                let wake = {
                    let mut state = hook_state.lock();
                    if let Some(inner) = state.inner.as_ref() {
                        Wake::Inner(Arc::clone(inner))
                    } else if !state.started {
                        state.started = true;
                        Wake::Start
                    } else {
                        Wake::Nothing
                    }
                };
                match wake {
                    Wake::Inner(inner) => inner.signal(n),
                    Wake::Start => hook_outer.request(1),
                    Wake::Nothing => {}
                }
            });

            upstream.attach(Downstream::new(
                Arc::clone(&outer_cell),
                OuterSink {
                    downstream: downstream.clone(),
                    f: Arc::clone(&f),
                    state,
                    outer_cell: Arc::clone(&outer_cell),
                    _marker: std::marker::PhantomData,
                },
            ));
        })
    }

    /// Map each item to an [`Eventual`] and emit the results in order, one
    /// resolution at a time.
    pub fn concat_map_eventual<U, F>(self, f: F) -> Stream<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Eventual<U> + Send + Sync + 'static,
    {
        self.concat_map(move |item| f(item).into_stream())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_runtime::UNBOUNDED;
    use std::sync::Mutex as StdMutex;

    fn collect(stream: Stream<String>) -> (Vec<String>, bool) {
        let items = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&items);
        let completed = Arc::new(StdMutex::new(false));
        let done = Arc::clone(&completed);
        stream.subscribe(
            move |item| sink.lock().expect("poisoned").push(item),
            |failure| panic!("unexpected failure: {failure}"),
            move || *done.lock().expect("poisoned") = true,
            UNBOUNDED,
        );
        let items = items.lock().expect("poisoned").clone();
        let completed = *completed.lock().expect("poisoned");
        (items, completed)
    }

    #[test]
    fn inner_streams_never_interleave() {
        let flattened = Stream::from_items(vec!["a", "b"]).concat_map(|prefix| {
            Stream::from_items(match prefix {
                "a" => vec![format!("{prefix}1"), format!("{prefix}2")],
                _ => vec![format!("{prefix}1")],
            })
        });
        let (items, completed) = collect(flattened);
        assert_eq!(items, vec!["a1", "a2", "b1"]);
        assert!(completed);
    }

    #[test]
    fn next_outer_item_waits_for_inner_completion() {
        let pulled = Arc::new(StdMutex::new(Vec::new()));
        let record = Arc::clone(&pulled);
        let flattened = Stream::from_items(vec![1, 2, 3])
            .invoke(move |n| record.lock().expect("poisoned").push(*n))
            .concat_map(|n| Stream::from_items(vec![n * 10, n * 10 + 1]));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = flattened.subscribe(
            move |item| sink.lock().expect("poisoned").push(item),
            |failure| panic!("unexpected failure: {failure}"),
            || {},
            2,
        );
        // Two units of demand cover exactly the first inner stream; its
        // completion pulls the second upstream item, whose output then waits
        // for more demand.
        assert_eq!(*seen.lock().expect("poisoned"), vec![10, 11]);
        assert_eq!(*pulled.lock().expect("poisoned"), vec![1, 2]);
        subscription.request(UNBOUNDED);
        assert_eq!(*seen.lock().expect("poisoned"), vec![10, 11, 20, 21, 30, 31]);
    }

    #[test]
    fn inner_failure_cancels_upstream() {
        let failure = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&failure);
        Stream::from_items(vec![1, 2])
            .concat_map(|n| {
                if n == 1 {
                    Stream::from_emitter(|emitter| emitter.fail(Failure::producer("inner broke")))
                } else {
                    Stream::from_items(vec![n])
                }
            })
            .subscribe(
                |_: i32| panic!("no items expected"),
                move |f| *sink.lock().expect("poisoned") = Some(f),
                || panic!("must fail"),
                UNBOUNDED,
            );
        assert_eq!(
            *failure.lock().expect("poisoned"),
            Some(Failure::producer("inner broke"))
        );
    }

    #[test]
    fn eventual_results_arrive_in_order() {
        let flattened = Stream::from_items(vec![1, 2, 3])
            .concat_map_eventual(|n| Eventual::item(n * 2))
            .map(|n| n.to_string());
        let (items, completed) = collect(flattened);
        assert_eq!(items, vec!["2", "4", "6"]);
        assert!(completed);
    }

    #[test]
    fn empty_upstream_completes_immediately() {
        let flattened =
            Stream::from_items(Vec::<i32>::new()).concat_map(|n| Stream::from_items(vec![n]));
        let completed = Arc::new(StdMutex::new(false));
        let done = Arc::clone(&completed);
        flattened.subscribe(
            |_| panic!("no items"),
            |failure| panic!("unexpected failure: {failure}"),
            move || *done.lock().expect("poisoned") = true,
            UNBOUNDED,
        );
        assert!(*completed.lock().expect("poisoned"));
    }
}
