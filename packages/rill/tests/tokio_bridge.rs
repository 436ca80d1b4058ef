//! Interop with the tokio/futures ecosystem

#![cfg(feature = "tokio")]

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use rill::prelude::*;
use rill::TokioScheduler;

#[tokio::test]
async fn eventual_awaits_like_a_future() {
    let value = Eventual::item(5).map(|n| n + 1).into_future().await;
    assert_eq!(value, Ok(6));
}

#[tokio::test]
async fn future_backed_eventual_resolves_per_subscription() {
    let eventual = Eventual::from_future(|| async { Ok::<_, Failure>(21) }).map(|n| n * 2);
    assert_eq!(eventual.clone().into_future().await, Ok(42));
    assert_eq!(eventual.into_future().await, Ok(42));
}

#[tokio::test]
async fn failure_surfaces_through_the_future() {
    let eventual =
        Eventual::<i32>::from_future(|| async { Err(Failure::producer("async broke")) });
    assert_eq!(
        eventual.into_future().await,
        Err(Failure::producer("async broke"))
    );
}

#[tokio::test]
async fn channel_stream_drains_a_composed_pipeline() {
    let events: Vec<_> = Stream::range(0, 5)
        .map(|n| n * n)
        .select_first(3)
        .into_channel()
        .collect()
        .await;
    assert_eq!(events, vec![Ok(0), Ok(1), Ok(4)]);
}

#[tokio::test]
async fn delay_runs_on_the_tokio_scheduler() {
    let scheduler = Arc::new(TokioScheduler);
    let mut events = Stream::from_items(vec![1, 2])
        .delay_by(Duration::from_millis(20), scheduler)
        .into_channel();
    let start = std::time::Instant::now();
    assert_eq!(events.next().await, Some(Ok(1)));
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert_eq!(events.next().await, Some(Ok(2)));
    assert_eq!(events.next().await, None);
}

#[tokio::test]
async fn and_then_chains_async_outcomes() {
    let chained = Eventual::from_future(|| async { Ok::<_, Failure>("base".to_string()) })
        .and_then(|base| Eventual::from_future(move || {
            let base = base.clone();
            async move { Ok(format!("{base}+next")) }
        }));
    assert_eq!(chained.into_future().await, Ok("base+next".to_string()));
}
