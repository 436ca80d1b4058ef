//! Lifting a single-outcome `Eventual` into the stream protocol

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rill_eventual::Eventual;

use crate::stream::{Downstream, Stream};

/// Conversion into a [`Stream`].
pub trait IntoStream {
    type Item;

    fn into_stream(self) -> Stream<Self::Item>;
}

impl<T: Send + 'static> IntoStream for Eventual<T> {
    type Item = T;

    /// A stream of exactly one item (the outcome) followed by completion, or
    /// of the failure alone. The source is not subscribed until the first
    /// non-zero demand arrives, and cancelling the stream subscription
    /// cancels the pending outcome.
    fn into_stream(self) -> Stream<T> {
        let eventual = self;
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            let eventual = eventual.clone();
            let started = Arc::new(AtomicBool::new(false));
            // Demand is consumed at delivery; a resolution racing the demand
            // grant is parked and handed out by a later request.
            let parked: Arc<Mutex<Option<T>>> = Arc::new(Mutex::new(None));
            let hook_parked = Arc::clone(&parked);
            let hook_downstream = downstream.clone();
            downstream.cell().on_request(move |n| {
                let resolved = {
                    let mut slot = hook_parked.lock();
                    if slot.is_some() && hook_downstream.cell().demand().try_consume() {
                        slot.take()
                    } else {
                        None
                    }
                };
                if let Some(item) = resolved {
                    hook_downstream.dispatch_item(item);
                    hook_downstream.dispatch_complete();
                    return;
                }
                if n == 0 || started.swap(true, Ordering::AcqRel) {
                    return;
                }
                let success_downstream = hook_downstream.clone();
                let success_parked = Arc::clone(&hook_parked);
                let failure_downstream = hook_downstream.clone();
                let cancellation = eventual.subscribe(
                    move |item| {
                        let mut slot = success_parked.lock();
                        if success_downstream.cell().demand().try_consume() {
                            drop(slot);
                            success_downstream.dispatch_item(item);
                            success_downstream.dispatch_complete();
                        } else {
                            *slot = Some(item);
                        }
                    },
                    move |failure| failure_downstream.dispatch_failure(failure),
                );
                hook_downstream.cell().link_upstream(cancellation.cell());
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_runtime::{Failure, UNBOUNDED};
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn outcome_then_completion() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let completed = Arc::new(StdMutex::new(false));
        let done = Arc::clone(&completed);
        Eventual::item(41).into_stream().subscribe(
            move |item| sink.lock().expect("poisoned").push(item),
            |failure| panic!("unexpected failure: {failure}"),
            move || *done.lock().expect("poisoned") = true,
            UNBOUNDED,
        );
        assert_eq!(*seen.lock().expect("poisoned"), vec![41]);
        assert!(*completed.lock().expect("poisoned"));
    }

    #[test]
    fn failure_carries_over() {
        let failure = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&failure);
        Eventual::<i32>::failed(Failure::producer("nope"))
            .into_stream()
            .subscribe(
                |_| panic!("no items"),
                move |f| *sink.lock().expect("poisoned") = Some(f),
                || panic!("must fail"),
                UNBOUNDED,
            );
        assert_eq!(
            *failure.lock().expect("poisoned"),
            Some(Failure::producer("nope"))
        );
    }

    #[test]
    fn source_not_subscribed_before_demand() {
        let subscriptions = Arc::new(AtomicU64::new(0));
        let counting = Arc::clone(&subscriptions);
        let stream = Eventual::deferred(move || {
            counting.fetch_add(1, Ordering::SeqCst);
            Eventual::item(1)
        })
        .into_stream();
        let subscription = stream.subscribe(|_| {}, |_| {}, || {}, 0);
        assert_eq!(subscriptions.load(Ordering::SeqCst), 0);
        subscription.request(1);
        assert_eq!(subscriptions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelling_the_stream_cancels_the_outcome() {
        let held = Arc::new(StdMutex::new(None));
        let slot = Arc::clone(&held);
        let pending = Eventual::<i32>::from_emitter(move |emitter| {
            *slot.lock().expect("poisoned") = Some(emitter);
        });
        let subscription = pending.into_stream().subscribe(
            |_| panic!("never resolves"),
            |_| panic!("never fails"),
            || panic!("never completes"),
            UNBOUNDED,
        );
        let emitter = held
            .lock()
            .expect("poisoned")
            .clone()
            .expect("producer ran on first demand");
        assert!(!emitter.is_cancelled());
        subscription.cancel();
        assert!(emitter.is_cancelled());
    }
}
