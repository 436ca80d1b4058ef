//! Lazy, demand-driven composition of eventual values and backpressured
//! streams
//!
//! `rill` re-exports the public surface of the workspace crates:
//!
//! - [`Eventual`]: a lazy single-outcome computation, re-run per subscriber.
//! - [`Stream`]: an ordered, backpressured sequence of items with exactly one
//!   terminal event.
//! - [`StagedPipeline`]: a staged text-generation chain built on the two.
//!
//! Both primitives are recipes: composing them has no side effects, and
//! production starts only when a subscription exists (and, for streams, has
//! granted demand).
//!
//! ```
//! use rill::prelude::*;
//!
//! let doubled = Stream::range(1, 4).map(|n| n * 2);
//! doubled.collect_to_list().subscribe(
//!     |items| assert_eq!(items, vec![2, 4, 6]),
//!     |failure| panic!("unexpected failure: {failure}"),
//! );
//! ```

pub use rill_eventual::{Eventual, EventualEmitter};
pub use rill_pipeline::{FnStage, StagedPipeline, TextChunk, TextStage};
pub use rill_runtime::{
    Cancellation, Demand, Failure, Scheduler, Subscription, SubscriptionState, ThreadScheduler,
    UNBOUNDED,
};
pub use rill_stream::{IntoStream, Stream, StreamEmitter};

#[cfg(feature = "tokio")]
pub use rill_eventual::EventualFuture;
#[cfg(feature = "tokio")]
pub use rill_runtime::TokioScheduler;
#[cfg(feature = "tokio")]
pub use rill_stream::ChannelStream;

/// The names most call sites want in scope.
pub mod prelude {
    pub use crate::{
        Eventual, Failure, IntoStream, Stream, StreamEmitter, Subscription, UNBOUNDED,
    };
}
