//! Fail-fast combination of several eventuals

use std::sync::Arc;

use parking_lot::Mutex;
use rill_runtime::{Cancellation, Failure};

use crate::eventual::Eventual;
use crate::EventualEmitter;

struct JoinState<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

impl<T: Send + 'static> Eventual<T> {
    /// Succeed with every value, in input order, once all sources succeed.
    /// The first observed failure fails the aggregate and cancels the
    /// remaining in-flight subscriptions.
    ///
    /// Individual completions may settle in any order; only the aggregate
    /// outcome is ordered.
    pub fn join_all(sources: Vec<Eventual<T>>) -> Eventual<Vec<T>> {
        let sources = Arc::new(sources);
        Eventual::from_emitter(move |emitter: EventualEmitter<Vec<T>>| {
            let count = sources.len();
            if count == 0 {
                emitter.complete(Vec::new());
                return;
            }
            let state = Arc::new(Mutex::new(JoinState {
                slots: (0..count).map(|_| None).collect(),
                remaining: count,
            }));
            let siblings: Arc<Mutex<Vec<Cancellation>>> =
                Arc::new(Mutex::new(Vec::with_capacity(count)));

            for (index, source) in sources.iter().enumerate() {
                // A synchronous failure settles the emitter mid-loop; do not
                // start the remaining subscriptions in that case.
                if !emitter.cell().is_live() {
                    break;
                }
                let success = emitter.clone();
                let failure = emitter.clone();
                let state = Arc::clone(&state);
                let on_fail_siblings = Arc::clone(&siblings);
                let subscription = source.subscribe(
                    move |value| {
                        let finished = {
                            let mut join = state.lock();
                            join.slots[index] = Some(value);
                            join.remaining -= 1;
                            join.remaining == 0
                        };
                        if finished {
                            let slots = std::mem::take(&mut state.lock().slots);
                            success.complete(slots.into_iter().flatten().collect());
                        }
                    },
                    move |err| {
                        failure.fail(err);
                        for sibling in on_fail_siblings.lock().drain(..) {
                            sibling.cancel();
                        }
                    },
                );
                emitter.cell().link_upstream(subscription.cell());
                siblings.lock().push(subscription);
            }

            // Fail-fast for sources that settled the aggregate while later
            // siblings were still being wired up.
            if !emitter.cell().is_live() {
                for sibling in siblings.lock().drain(..) {
                    sibling.cancel();
                }
            }
        })
    }

    /// Settle with whichever source settles first, success or failure, and
    /// cancel the rest. An empty input can never settle and fails
    /// immediately.
    pub fn any(sources: Vec<Eventual<T>>) -> Eventual<T> {
        let sources = Arc::new(sources);
        Eventual::from_emitter(move |emitter: EventualEmitter<T>| {
            if sources.is_empty() {
                emitter.fail(Failure::producer("any() over an empty set of eventuals"));
                return;
            }
            let siblings: Arc<Mutex<Vec<Cancellation>>> =
                Arc::new(Mutex::new(Vec::with_capacity(sources.len())));

            for source in sources.iter() {
                if !emitter.cell().is_live() {
                    break;
                }
                let success = emitter.clone();
                let failure = emitter.clone();
                let winner_siblings = Arc::clone(&siblings);
                let loser_siblings = Arc::clone(&siblings);
                let subscription = source.subscribe(
                    move |value| {
                        success.complete(value);
                        for sibling in winner_siblings.lock().drain(..) {
                            sibling.cancel();
                        }
                    },
                    move |err| {
                        failure.fail(err);
                        for sibling in loser_siblings.lock().drain(..) {
                            sibling.cancel();
                        }
                    },
                );
                emitter.cell().link_upstream(subscription.cell());
                siblings.lock().push(subscription);
            }

            if !emitter.cell().is_live() {
                for sibling in siblings.lock().drain(..) {
                    sibling.cancel();
                }
            }
        })
    }
}
