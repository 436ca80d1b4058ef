//! Time-shifted delivery

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rill_runtime::{Failure, Scheduler, SubscriptionCell};

use crate::stream::{Downstream, Sink, Stream};

enum Delayed<T> {
    Item(T),
    Failed(Failure),
    Completed,
}

struct DelaySink<T> {
    downstream: Downstream<T>,
    queue: Arc<Mutex<VecDeque<Delayed<T>>>>,
    scheduler: Arc<dyn Scheduler>,
    delay: Duration,
}

impl<T: Send + 'static> DelaySink<T> {
    fn enqueue(&mut self, event: Delayed<T>) {
        self.queue.lock().push_back(event);
        let queue = Arc::clone(&self.queue);
        let downstream = self.downstream.clone();
        self.scheduler.schedule(
            self.delay,
            Box::new(move || {
                // The queue lock must be released before delivering: a
                // subscriber requesting more demand from its callback drives
                // the upstream synchronously back into this queue.
                let event = queue.lock().pop_front();
                match event {
                    Some(Delayed::Item(item)) => downstream.dispatch_item(item),
                    Some(Delayed::Failed(failure)) => downstream.dispatch_failure(failure),
                    Some(Delayed::Completed) => downstream.dispatch_complete(),
                    None => {}
                }
            }),
        );
    }
}

impl<T: Send + 'static> Sink<T> for DelaySink<T> {
    fn item(&mut self, item: T) {
        self.enqueue(Delayed::Item(item));
    }

    fn failure(&mut self, failure: Failure) {
        self.enqueue(Delayed::Failed(failure));
    }

    fn complete(&mut self) {
        self.enqueue(Delayed::Completed);
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Shift every event of this stream `delay` into the future, preserving
    /// order. Terminal events queue behind pending items so a delayed item is
    /// never overtaken by its own completion.
    ///
    /// Demand is consumed when the upstream produces, not when the delayed
    /// event is finally delivered.
    pub fn delay_by(self, delay: Duration, scheduler: Arc<dyn Scheduler>) -> Stream<T> {
        let upstream = self;
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            // Boundary cell: the upstream terminal event must not close the
            // downstream subscription while delayed items are still queued.
            let upstream_cell =
                SubscriptionCell::internal(Arc::clone(downstream.cell().demand()));
            downstream.cell().link_upstream(&upstream_cell);

            let hook_upstream = Arc::clone(&upstream_cell);
            downstream.cell().on_request(move |n| hook_upstream.signal(n));

            let sink = DelaySink {
                downstream: downstream.clone(),
                queue: Arc::new(Mutex::new(VecDeque::new())),
                scheduler: Arc::clone(&scheduler),
                delay,
            };
            upstream.attach(Downstream::new(upstream_cell, sink));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_runtime::{ThreadScheduler, UNBOUNDED};
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn items_arrive_after_the_delay_in_order() {
        let (tx, rx) = mpsc::channel();
        let done_tx = tx.clone();
        let start = Instant::now();
        Stream::from_items(vec![1, 2, 3])
            .delay_by(Duration::from_millis(30), Arc::new(ThreadScheduler))
            .subscribe(
                move |item| {
                    let _ = tx.send(Some(item));
                },
                |_| panic!("must not fail"),
                move || {
                    let _ = done_tx.send(None);
                },
                UNBOUNDED,
            );
        let mut seen = Vec::new();
        loop {
            match rx
                .recv_timeout(Duration::from_secs(2))
                .expect("delayed event")
            {
                Some(item) => seen.push(item),
                None => break,
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn failure_queues_behind_pending_items() {
        let (tx, rx) = mpsc::channel();
        let fail_tx = tx.clone();
        Stream::from_emitter(|emitter| {
            let _ = emitter.emit(9);
            emitter.fail(Failure::producer("late"));
        })
        .delay_by(Duration::from_millis(10), Arc::new(ThreadScheduler))
        .subscribe(
            move |item| {
                let _ = tx.send(Ok(item));
            },
            move |failure| {
                let _ = fail_tx.send(Err(failure));
            },
            || panic!("must fail"),
            UNBOUNDED,
        );
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).expect("item"),
            Ok(9)
        );
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).expect("failure"),
            Err(Failure::producer("late"))
        );
    }

    #[test]
    fn requesting_from_inside_a_delayed_delivery_makes_progress() {
        let (tx, rx) = mpsc::channel();
        let done_tx = tx.clone();
        let shared: Arc<std::sync::Mutex<Option<rill_runtime::Subscription>>> =
            Arc::new(std::sync::Mutex::new(None));
        let inner = Arc::clone(&shared);
        let subscription = Stream::from_items(vec![1, 2])
            .delay_by(Duration::from_millis(10), Arc::new(ThreadScheduler))
            .subscribe(
                move |item| {
                    let _ = tx.send(Some(item));
                    if let Some(sub) = inner.lock().expect("poisoned").as_ref() {
                        sub.request(1);
                    }
                },
                |_| panic!("must not fail"),
                move || {
                    let _ = done_tx.send(None);
                },
                1,
            );
        *shared.lock().expect("poisoned") = Some(subscription);
        let mut seen = Vec::new();
        loop {
            match rx
                .recv_timeout(Duration::from_secs(2))
                .expect("delayed event")
            {
                Some(item) => seen.push(item),
                None => break,
            }
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn cancellation_drops_queued_items() {
        let (tx, rx) = mpsc::channel::<i32>();
        let subscription = Stream::from_items(vec![1, 2])
            .delay_by(Duration::from_millis(50), Arc::new(ThreadScheduler))
            .subscribe(
                move |item| {
                    let _ = tx.send(item);
                },
                |_| {},
                || {},
                UNBOUNDED,
            );
        subscription.cancel();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
