//! Failure recovery and observation

use std::sync::Arc;

use parking_lot::Mutex;
use rill_runtime::{Failure, SubscriptionCell};

use crate::stream::{Downstream, Sink, Stream};

struct RecoverSink<T> {
    downstream: Downstream<T>,
    fallback: T,
    parked: Arc<Mutex<Option<T>>>,
}

impl<T: Clone + Send + 'static> Sink<T> for RecoverSink<T> {
    fn item(&mut self, item: T) {
        self.downstream.dispatch_item(item);
    }

    fn failure(&mut self, _failure: Failure) {
        // The fallback is an emission like any other: it consumes demand.
        // With none outstanding it is parked until the subscriber requests.
        // The park lock is held across the demand check so a concurrent
        // request either sees the parked item or the consumed unit.
        let mut slot = self.parked.lock();
        if self.downstream.cell().demand().try_consume() {
            drop(slot);
            self.downstream.dispatch_item(self.fallback.clone());
            self.downstream.dispatch_complete();
        } else {
            *slot = Some(self.fallback.clone());
        }
    }

    fn complete(&mut self) {
        self.downstream.dispatch_complete();
    }
}

struct FailureTapSink<T, F> {
    downstream: Downstream<T>,
    f: Arc<F>,
}

impl<T, F> Sink<T> for FailureTapSink<T, F>
where
    T: Send + 'static,
    F: Fn(&Failure) + Send + Sync + 'static,
{
    fn item(&mut self, item: T) {
        self.downstream.dispatch_item(item);
    }

    fn failure(&mut self, failure: Failure) {
        (self.f)(&failure);
        self.downstream.dispatch_failure(failure);
    }

    fn complete(&mut self) {
        self.downstream.dispatch_complete();
    }
}

impl<T: Send + 'static> Stream<T> {
    /// On upstream failure, emit one fallback item and complete instead of
    /// propagating the failure.
    pub fn recover_with_item(self, fallback: T) -> Stream<T>
    where
        T: Clone + Sync,
    {
        let fallback = Arc::new(fallback);
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            // Boundary cell: the upstream failure must terminate upstream
            // only, leaving the downstream subscription live for the
            // fallback emission. Demand accounting stays shared.
            let upstream_cell =
                SubscriptionCell::internal(Arc::clone(downstream.cell().demand()));
            downstream.cell().link_upstream(&upstream_cell);

            let parked: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
            let hook_downstream = downstream.clone();
            let hook_parked = Arc::clone(&parked);
            let hook_upstream = Arc::clone(&upstream_cell);
            downstream.cell().on_request(move |n| {
                let fallback = {
                    let mut slot = hook_parked.lock();
                    if slot.is_some() && hook_downstream.cell().demand().try_consume() {
                        slot.take()
                    } else {
                        None
                    }
                };
                match fallback {
                    Some(item) => {
                        hook_downstream.dispatch_item(item);
                        hook_downstream.dispatch_complete();
                    }
                    None => hook_upstream.signal(n),
                }
            });

            let sink = RecoverSink {
                downstream: downstream.clone(),
                fallback: fallback.as_ref().clone(),
                parked,
            };
            self.attach(Downstream::new(upstream_cell, sink));
        })
    }

    /// Observe a failure without altering it.
    pub fn on_failure_invoke(self, f: impl Fn(&Failure) + Send + Sync + 'static) -> Stream<T> {
        let f = Arc::new(f);
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            let sink = FailureTapSink {
                downstream: downstream.clone(),
                f: Arc::clone(&f),
            };
            self.attach(Downstream::new(Arc::clone(downstream.cell()), sink));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_runtime::UNBOUNDED;
    use std::sync::Mutex as StdMutex;

    fn failing_after(items: Vec<i32>) -> Stream<i32> {
        Stream::from_emitter(move |emitter| {
            for item in &items {
                if emitter.emit(*item).is_err() {
                    return;
                }
            }
            emitter.fail(Failure::producer("upstream broke"));
        })
    }

    #[test]
    fn recover_with_item_appends_fallback_and_completes() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let completed = Arc::new(StdMutex::new(false));
        let done = Arc::clone(&completed);
        failing_after(vec![2, 4]).recover_with_item(0).subscribe(
            move |item| sink.lock().expect("poisoned").push(item),
            |_| panic!("failure must be recovered"),
            move || *done.lock().expect("poisoned") = true,
            UNBOUNDED,
        );
        assert_eq!(*seen.lock().expect("poisoned"), vec![2, 4, 0]);
        assert!(*completed.lock().expect("poisoned"));
    }

    #[test]
    fn recover_fallback_waits_for_demand() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let completed = Arc::new(StdMutex::new(false));
        let done = Arc::clone(&completed);
        let subscription = failing_after(vec![7]).recover_with_item(0).subscribe(
            move |item| sink.lock().expect("poisoned").push(item),
            |_| panic!("failure must be recovered"),
            move || *done.lock().expect("poisoned") = true,
            1,
        );
        // The single granted unit was spent on `7`; the fallback is parked.
        assert_eq!(*seen.lock().expect("poisoned"), vec![7]);
        assert!(!*completed.lock().expect("poisoned"));
        subscription.request(1);
        assert_eq!(*seen.lock().expect("poisoned"), vec![7, 0]);
        assert!(*completed.lock().expect("poisoned"));
    }

    #[test]
    fn untouched_failure_passes_through_tap() {
        let observed = Arc::new(StdMutex::new(None));
        let tap = Arc::clone(&observed);
        let delivered = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&delivered);
        failing_after(vec![1])
            .on_failure_invoke(move |failure| {
                *tap.lock().expect("poisoned") = Some(failure.clone())
            })
            .subscribe(
                |_| {},
                move |failure| *sink.lock().expect("poisoned") = Some(failure),
                || panic!("must fail"),
                UNBOUNDED,
            );
        assert_eq!(
            *observed.lock().expect("poisoned"),
            Some(Failure::producer("upstream broke"))
        );
        assert_eq!(
            *delivered.lock().expect("poisoned"),
            Some(Failure::producer("upstream broke"))
        );
    }

    #[test]
    fn completion_passes_straight_through() {
        let completed = Arc::new(StdMutex::new(false));
        let done = Arc::clone(&completed);
        Stream::from_items(vec![1, 2]).recover_with_item(9).subscribe(
            |_| {},
            |_| {},
            move || *done.lock().expect("poisoned") = true,
            UNBOUNDED,
        );
        assert!(*completed.lock().expect("poisoned"));
    }
}
