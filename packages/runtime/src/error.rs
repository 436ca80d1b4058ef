//! Failure taxonomy shared by both primitives

use thiserror::Error;

/// Terminal failure of an `Eventual` or `Stream` subscription.
///
/// Any unrecovered failure terminates the primitive it occurs in and
/// propagates to the immediate downstream operator; the `recover_*` operators
/// are the only mechanism that converts a failure back into success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// Raised by producer logic (an emitter, a deferred factory, a stage).
    #[error("producer failed: {0}")]
    Producer(String),

    /// An operator's mapping function rejected an item.
    #[error("transform failed: {0}")]
    Transform(String),

    /// An emitter pushed an item with zero outstanding demand. The policy
    /// here is fail-fast: the subscription is terminated rather than the
    /// item buffered.
    #[error("emitted beyond granted demand")]
    BackpressureViolation,

    /// The subscriber is gone. This is a notice handed back to producers
    /// through emitter methods; it is never delivered to a live subscriber
    /// as an error.
    #[error("subscription cancelled")]
    Cancelled,
}

impl Failure {
    /// Producer failure from anything displayable.
    pub fn producer(message: impl Into<String>) -> Self {
        Failure::Producer(message.into())
    }

    /// Transform failure from anything displayable.
    pub fn transform(message: impl Into<String>) -> Self {
        Failure::Transform(message.into())
    }
}
