//! Subscription, demand and scheduling substrate for the rill composition core
//!
//! Everything in this crate is runtime plumbing shared by `rill_eventual` and
//! `rill_stream`: the demand counter that drives backpressure, the
//! per-subscription cell with its lifecycle state machine, the handles a
//! subscriber keeps (`Subscription`, `Cancellation`), the `Scheduler`
//! abstraction used by timed operators, and the `Failure` taxonomy.

pub mod cell;
pub mod demand;
pub mod error;
pub mod handle;
pub mod scheduler;

pub use cell::{SubscriptionCell, SubscriptionState};
pub use demand::{Demand, UNBOUNDED};
pub use error::Failure;
pub use handle::{Cancellation, Subscription};
pub use scheduler::{Scheduler, ThreadScheduler};

#[cfg(feature = "tokio-scheduler")]
pub use scheduler::TokioScheduler;
