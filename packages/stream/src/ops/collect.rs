//! Accumulating a finite stream into an `Eventual`

use std::fmt::Display;
use std::sync::Arc;

use rill_eventual::{Eventual, EventualEmitter};
use rill_runtime::{Demand, Failure, SubscriptionCell, UNBOUNDED};

use crate::stream::{Downstream, Sink, Stream};

struct CollectSink<T> {
    items: Vec<T>,
    emitter: EventualEmitter<Vec<T>>,
}

impl<T: Send + 'static> Sink<T> for CollectSink<T> {
    fn item(&mut self, item: T) {
        self.items.push(item);
    }

    fn failure(&mut self, failure: Failure) {
        self.emitter.fail(failure);
    }

    fn complete(&mut self) {
        self.emitter.complete(std::mem::take(&mut self.items));
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Accumulate every item into a `Vec`, resolved on completion. The
    /// upstream is consumed with unbounded demand; a failure discards the
    /// partial accumulation and fails the outcome instead.
    ///
    /// Unbounded on an infinite stream never resolves.
    pub fn collect_to_list(self) -> Eventual<Vec<T>> {
        let upstream = self;
        Eventual::from_emitter(move |emitter: EventualEmitter<Vec<T>>| {
            let upstream_cell = SubscriptionCell::internal(Arc::new(Demand::new(0)));
            emitter.cell().link_upstream(&upstream_cell);
            upstream.attach(Downstream::new(
                Arc::clone(&upstream_cell),
                CollectSink {
                    items: Vec::new(),
                    emitter: emitter.clone(),
                },
            ));
            upstream_cell.request(UNBOUNDED);
        })
    }

    /// Accumulate the items' display forms joined by `separator`.
    pub fn collect_to_string(self, separator: &str) -> Eventual<String>
    where
        T: Display,
    {
        let separator = separator.to_string();
        self.map(|item| item.to_string())
            .collect_to_list()
            .map(move |parts| parts.join(&separator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn collects_in_production_order() {
        let result = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&result);
        Stream::range(1, 5).collect_to_list().subscribe(
            move |items| *sink.lock().expect("poisoned") = Some(items),
            |failure| panic!("unexpected failure: {failure}"),
        );
        assert_eq!(
            *result.lock().expect("poisoned"),
            Some(vec![1, 2, 3, 4])
        );
    }

    #[test]
    fn empty_stream_resolves_to_empty_list() {
        let result = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&result);
        Stream::from_items(Vec::<i32>::new())
            .collect_to_list()
            .subscribe(
                move |items| *sink.lock().expect("poisoned") = Some(items),
                |failure| panic!("unexpected failure: {failure}"),
            );
        assert_eq!(*result.lock().expect("poisoned"), Some(Vec::new()));
    }

    #[test]
    fn failure_discards_partial_accumulation() {
        let failure = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&failure);
        Stream::from_emitter(|emitter| {
            let _ = emitter.emit(1);
            emitter.fail(Failure::producer("mid-stream"));
        })
        .collect_to_list()
        .subscribe(
            |_: Vec<i32>| panic!("must not resolve"),
            move |f| *sink.lock().expect("poisoned") = Some(f),
        );
        assert_eq!(
            *failure.lock().expect("poisoned"),
            Some(Failure::producer("mid-stream"))
        );
    }

    #[test]
    fn joins_display_forms() {
        let result = Arc::new(StdMutex::new(None));
        let sink = Arc::clone(&result);
        Stream::from_items(vec!["alpha", "beta", "gamma"])
            .collect_to_string(" ")
            .subscribe(
                move |text| *sink.lock().expect("poisoned") = Some(text),
                |failure| panic!("unexpected failure: {failure}"),
            );
        assert_eq!(
            result.lock().expect("poisoned").as_deref(),
            Some("alpha beta gamma")
        );
    }

    #[test]
    fn cancelling_the_outcome_stops_consumption() {
        let stopped = Arc::new(StdMutex::new(false));
        let observed = Arc::clone(&stopped);
        let endless = Stream::from_emitter(move |emitter| {
            let observed = Arc::clone(&observed);
            std::thread::spawn(move || {
                let mut n = 0u64;
                loop {
                    if emitter.emit(n).is_err() {
                        *observed.lock().expect("poisoned") = true;
                        return;
                    }
                    n += 1;
                }
            });
        });
        let cancellation = endless
            .collect_to_list()
            .subscribe(|_| panic!("never resolves"), |_| panic!("never fails"));
        cancellation.cancel();
        for _ in 0..200 {
            if *stopped.lock().expect("poisoned") {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        panic!("producer did not observe cancellation");
    }
}
