//! Bridges between `Eventual` and the tokio/`Future` world
//!
//! The bridge follows the oneshot-channel discipline used across the rest of
//! the workspace: producer side sends at most once, a dropped sender is
//! surfaced as cancellation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use rill_runtime::Failure;
use tokio::sync::oneshot;

use crate::eventual::Eventual;

impl<T: Send + 'static> Eventual<T> {
    /// Build an eventual from a future factory. The factory runs fresh on
    /// each subscription and the future is driven on the ambient tokio
    /// runtime; its `Err` arm becomes the eventual's failure.
    pub fn from_future<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        Eventual::from_emitter(move |emitter| {
            let future = factory();
            tokio::spawn(async move {
                match future.await {
                    Ok(value) => emitter.complete(value),
                    Err(failure) => emitter.fail(failure),
                }
            });
        })
    }

    /// Subscribe and expose the outcome as a `Future`. Dropping the returned
    /// future cancels the underlying subscription.
    pub fn into_future(self) -> EventualFuture<T> {
        let (tx, rx) = oneshot::channel::<Result<T, Failure>>();
        let sender = Arc::new(Mutex::new(Some(tx)));
        let on_success = Arc::clone(&sender);
        let on_failure = Arc::clone(&sender);
        let cancellation = self.subscribe(
            move |value| {
                if let Some(tx) = on_success.lock().take() {
                    let _ = tx.send(Ok(value));
                }
            },
            move |failure| {
                if let Some(tx) = on_failure.lock().take() {
                    let _ = tx.send(Err(failure));
                }
            },
        );
        EventualFuture {
            receiver: rx,
            cancellation: Some(cancellation),
        }
    }
}

/// Future over a subscribed [`Eventual`]; resolves to the terminal outcome.
pub struct EventualFuture<T> {
    receiver: oneshot::Receiver<Result<T, Failure>>,
    cancellation: Option<rill_runtime::Cancellation>,
}

impl<T> Future for EventualFuture<T> {
    type Output = Result<T, Failure>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                self.cancellation = None;
                Poll::Ready(outcome)
            }
            // Sender dropped without settling: the producer abandoned the
            // subscription.
            Poll::Ready(Err(_)) => {
                self.cancellation = None;
                Poll::Ready(Err(Failure::Cancelled))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for EventualFuture<T> {
    fn drop(&mut self) {
        if let Some(cancellation) = self.cancellation.take() {
            cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn into_future_resolves_success() {
        let value = Eventual::item(63).into_future().await;
        assert_eq!(value, Ok(63));
    }

    #[tokio::test]
    async fn into_future_resolves_failure() {
        let value = Eventual::<i32>::failed(Failure::producer("down"))
            .into_future()
            .await;
        assert_eq!(value, Err(Failure::producer("down")));
    }

    #[tokio::test]
    async fn from_future_runs_factory_per_subscription() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let counter = Arc::new(AtomicU64::new(0));
        let counted = Arc::clone(&counter);
        let eventual = Eventual::from_future(move || {
            let counted = Arc::clone(&counted);
            async move { Ok(counted.fetch_add(1, Ordering::SeqCst)) }
        });
        assert_eq!(eventual.clone().into_future().await, Ok(0));
        assert_eq!(eventual.into_future().await, Ok(1));
    }
}
