//! `Eventual<T>`: exactly one asynchronous result or failure, delivered once
//! per subscription
//!
//! An `Eventual` is lazy: nothing runs until `subscribe` is called, and each
//! subscription re-executes the producing computation. Combinators compose at
//! composition time and trigger no side effects of their own.

pub mod combine;
pub mod emitter;
pub mod eventual;
pub mod ops;

#[cfg(feature = "tokio")]
pub mod future;

#[cfg(feature = "tokio")]
pub use future::EventualFuture;

pub use emitter::EventualEmitter;
pub use eventual::Eventual;

// The substrate types callers interact with directly.
pub use rill_runtime::{Cancellation, Failure};
