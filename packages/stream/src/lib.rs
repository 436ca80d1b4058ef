//! `Stream<T>`: an ordered, backpressured sequence of asynchronously
//! produced items, terminated by exactly one completion or failure
//!
//! Streams are lazy recipes, like [`rill_eventual::Eventual`]: operators
//! compose without side effects and production starts only when a
//! subscription exists and has granted demand. Items are delivered in
//! production order, serialized per subscription; demand is accounted at the
//! source and never exceeded.

pub mod emitter;
pub mod ops;
pub mod sources;
pub mod stream;

#[cfg(feature = "tokio")]
pub mod compat;

pub use emitter::StreamEmitter;
pub use ops::into_stream::IntoStream;
pub use stream::Stream;

#[cfg(feature = "tokio")]
pub use compat::ChannelStream;

// The substrate types callers interact with directly.
pub use rill_runtime::{Failure, Subscription, UNBOUNDED};
