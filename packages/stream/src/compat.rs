//! Bridge into the `futures` ecosystem, backed by tokio channels

use std::pin::Pin;
use std::task::{Context, Poll};

use rill_runtime::{Failure, Subscription, UNBOUNDED};
use tokio::sync::mpsc;

use crate::stream::Stream;

/// A [`Stream`] subscription exposed as a `futures::Stream` of
/// `Result<T, Failure>`.
///
/// Items cross an unbounded channel, so the producer side runs with
/// unbounded demand; backpressure ends at this boundary. A failure surfaces
/// as the final `Err` element; dropping the adapter cancels the
/// subscription.
pub struct ChannelStream<T> {
    receiver: mpsc::UnboundedReceiver<Result<T, Failure>>,
    subscription: Subscription,
}

impl<T: Send + 'static> Stream<T> {
    /// Subscribe and expose the events as an async `futures::Stream`.
    pub fn into_channel(self) -> ChannelStream<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let item_sender = sender.clone();
        let failure_sender = sender;
        // The senders live inside the subscriber callbacks; the terminal
        // event drops them, which closes the channel.
        let subscription = self.subscribe(
            move |item| {
                let _ = item_sender.send(Ok(item));
            },
            move |failure| {
                let _ = failure_sender.send(Err(failure));
            },
            || {},
            UNBOUNDED,
        );
        ChannelStream {
            receiver,
            subscription,
        }
    }
}

impl<T> futures::Stream for ChannelStream<T> {
    type Item = Result<T, Failure>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

impl<T> Drop for ChannelStream<T> {
    fn drop(&mut self) {
        self.subscription.cancel();
    }
}
