//! Outstanding-demand accounting for backpressured subscriptions

use std::sync::atomic::{AtomicU64, Ordering};

/// Sentinel for unbounded demand. Once a counter reaches this value it never
/// decreases again.
pub const UNBOUNDED: u64 = u64::MAX;

/// Lock-free counter of items a subscriber has authorized but not yet
/// received.
///
/// Grants are additive and saturate at [`UNBOUNDED`]; consumption is a CAS
/// decrement that never succeeds past zero. A single `Demand` may be shared
/// by several subscription cells when an operator passes demand through
/// unchanged (e.g. sequential flattening accounts downstream demand exactly
/// once across inner subscriptions).
#[derive(Debug)]
pub struct Demand(AtomicU64);

impl Demand {
    pub fn new(initial: u64) -> Self {
        Self(AtomicU64::new(initial))
    }

    /// Add `n` units of demand, saturating at [`UNBOUNDED`]. Returns the new
    /// outstanding total.
    pub fn grant(&self, n: u64) -> u64 {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return UNBOUNDED;
            }
            let next = current.saturating_add(n);
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    /// Consume one unit of demand. Returns `false` when nothing is
    /// outstanding; an unbounded counter always consumes.
    pub fn try_consume(&self) -> bool {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            if current == UNBOUNDED {
                return true;
            }
            if current == 0 {
                return false;
            }
            match self.0.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    /// Currently outstanding demand.
    pub fn outstanding(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for Demand {
    fn default() -> Self {
        Self::new(0)
    }
}
