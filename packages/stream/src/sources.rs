//! Stream sources: finite sequences, iterator factories, emitters

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::emitter::StreamEmitter;
use crate::stream::{Downstream, Stream};

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    /// Finite stream over the given items; each subscription replays the
    /// sequence from the start.
    pub fn from_items(items: impl Into<Vec<T>>) -> Self {
        let items: Arc<Vec<T>> = Arc::new(items.into());
        Self::from_iter(move || items.as_ref().clone().into_iter())
    }
}

impl Stream<i64> {
    /// Half-open integer range, one item per granted unit of demand.
    pub fn range(start: i64, end: i64) -> Self {
        Stream::from_iter(move || start..end)
    }
}

impl<T: Send + 'static> Stream<T> {
    /// Stream over a fresh iterator per subscription. Production is strictly
    /// demand-driven: the iterator is advanced once per granted unit, and
    /// never again after the subscription terminates.
    pub fn from_iter<I, F>(factory: F) -> Self
    where
        F: Fn() -> I + Send + Sync + 'static,
        I: Iterator<Item = T> + Send + 'static,
    {
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            let iter = Arc::new(Mutex::new(factory()));
            let emitting = Arc::new(AtomicBool::new(false));
            let cell = Arc::clone(downstream.cell());
            let hook_downstream = downstream.clone();
            let hook_iter = Arc::clone(&iter);
            let hook_emitting = Arc::clone(&emitting);
            cell.on_request(move |_| drain(&hook_downstream, &hook_iter, &hook_emitting));
            // An already-empty iterator completes at subscription time, before
            // any demand arrives.
            drain(&downstream, &iter, &emitting);
        })
    }

    /// Stream driven by a producer callback holding a [`StreamEmitter`].
    ///
    /// The callback runs once per subscription, when the first non-zero
    /// demand arrives, so a synchronous producer observes the subscriber's
    /// initial demand instead of violating backpressure on its first `emit`.
    /// The emitter may be moved to any other execution context; delivery to
    /// the subscriber stays serialized.
    pub fn from_emitter(producer: impl Fn(StreamEmitter<T>) + Send + Sync + 'static) -> Self {
        let producer = Arc::new(producer);
        Stream::from_on_subscribe(move |downstream: Downstream<T>| {
            let producer = Arc::clone(&producer);
            let started = Arc::new(AtomicBool::new(false));
            let cell = Arc::clone(downstream.cell());
            cell.on_request(move |n| {
                if n == 0 || started.swap(true, Ordering::AcqRel) {
                    return;
                }
                producer(StreamEmitter::new(downstream.clone()));
            });
        })
    }
}

/// Demand-driven drain loop for iterator sources.
///
/// The `emitting` flag makes the loop single-entrant: a `request(n)` issued
/// from inside a subscriber callback returns immediately and the running
/// loop picks the new demand up on its next pass. The re-check after
/// releasing the flag closes the race where demand arrives between the last
/// consume attempt and the release.
fn drain<T, I>(downstream: &Downstream<T>, iter: &Arc<Mutex<I>>, emitting: &Arc<AtomicBool>)
where
    T: Send + 'static,
    I: Iterator<Item = T> + Send + 'static,
{
    if emitting.swap(true, Ordering::AcqRel) {
        return;
    }
    loop {
        loop {
            if !downstream.cell().is_live() {
                emitting.store(false, Ordering::Release);
                return;
            }
            // A known-empty iterator completes before any demand is spent, so
            // a subscriber asking for exactly as many items as the source
            // holds still observes the completion.
            if exhausted(iter) {
                downstream.dispatch_complete();
                emitting.store(false, Ordering::Release);
                return;
            }
            if !downstream.cell().demand().try_consume() {
                break;
            }
            let next = iter.lock().next();
            match next {
                Some(item) => downstream.dispatch_item(item),
                None => {
                    downstream.dispatch_complete();
                    emitting.store(false, Ordering::Release);
                    return;
                }
            }
        }
        emitting.store(false, Ordering::Release);
        if !downstream.cell().is_live() || downstream.cell().demand().outstanding() == 0 {
            return;
        }
        if emitting.swap(true, Ordering::AcqRel) {
            return;
        }
    }
}

/// Exhaustion test that never advances the iterator, so no item is produced
/// ahead of demand. An upper size bound of zero is definitive; iterators
/// without a precise bound (`upper == None`) surface their end through
/// `next()` on the following granted unit instead.
fn exhausted<I: Iterator>(iter: &Arc<Mutex<I>>) -> bool {
    iter.lock().size_hint().1 == Some(0)
}
