//! Prefix selection

use std::sync::Arc;

use rill_runtime::Failure;

use crate::stream::{Downstream, Sink, Stream};

struct SelectSink<T> {
    downstream: Downstream<T>,
    remaining: u64,
}

impl<T: Send + 'static> Sink<T> for SelectSink<T> {
    fn item(&mut self, item: T) {
        if self.remaining == 0 {
            return;
        }
        self.remaining -= 1;
        self.downstream.dispatch_item(item);
        if self.remaining == 0 {
            // Completing the shared cell is what stops the source: its drain
            // loop checks liveness between emissions.
            self.downstream.dispatch_complete();
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
    /// Forward only the first `count` items, then complete and stop upstream
    /// production.
    pub fn select_first(self, count: u64) -> Stream<T> {
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            if count == 0 {
                downstream.dispatch_complete();
                return;
            }
            let sink = SelectSink {
                downstream: downstream.clone(),
                remaining: count,
            };
            self.attach(Downstream::new(Arc::clone(downstream.cell()), sink));
        })
    }
}
