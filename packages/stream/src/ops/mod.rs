//! Operator layer over `Stream<T>`
//!
//! Operators are pure at composition time: each wraps the upstream recipe
//! and no side effect occurs until a downstream subscription exists.
//! Pass-through operators (`map`, `invoke`, `select_first`,
//! `on_failure_invoke`) share the downstream subscription cell, so demand
//! and cancellation need no translation; boundary operators (`recover_*`,
//! `delay_by`, `concat_map`, the collectors) create their own upstream cell
//! and link it for cancellation while sharing the demand counter where the
//! accounting is one-to-one.

pub mod collect;
pub mod concat;
pub mod delay;
pub mod into_stream;
pub mod recover;
pub mod select;
pub mod transform;
