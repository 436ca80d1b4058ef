//! Per-subscription record: lifecycle state machine, demand, upstream links
//!
//! A `SubscriptionCell` is the live binding between one producer chain and
//! one subscriber. Operators that pass demand through unchanged share the
//! downstream cell outright; operators that change demand semantics create
//! their own cell and link it upstream so cancellation still propagates.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::demand::Demand;

/// Lifecycle of one subscription.
///
/// `Unsubscribed → Active → {Completed | Failed | Cancelled}`. The three
/// terminal states are absorbing: no transition, no event delivery after
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SubscriptionState {
    Unsubscribed = 0,
    Active = 1,
    Completed = 2,
    Failed = 3,
    Cancelled = 4,
}

impl SubscriptionState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SubscriptionState::Unsubscribed,
            1 => SubscriptionState::Active,
            2 => SubscriptionState::Completed,
            3 => SubscriptionState::Failed,
            _ => SubscriptionState::Cancelled,
        }
    }

    /// True for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubscriptionState::Completed | SubscriptionState::Failed | SubscriptionState::Cancelled
        )
    }
}

type RequestHook = Arc<dyn Fn(u64) + Send + Sync>;

/// Shared record for one subscription.
///
/// The upstream link list is strictly unidirectional (downstream holds
/// upstream, never the reverse), so teardown is clearing a list rather than
/// breaking reference cycles. Links carry cancellation only; demand flows
/// through the shared [`Demand`] counter and the request hook.
pub struct SubscriptionCell {
    demand: Arc<Demand>,
    state: AtomicU8,
    hook: Mutex<Option<RequestHook>>,
    upstream: Mutex<Vec<Arc<SubscriptionCell>>>,
}

impl SubscriptionCell {
    /// Root cell for a new subscriber, not yet active.
    pub fn root() -> Arc<Self> {
        Arc::new(Self {
            demand: Arc::new(Demand::new(0)),
            state: AtomicU8::new(SubscriptionState::Unsubscribed as u8),
            hook: Mutex::new(None),
            upstream: Mutex::new(Vec::new()),
        })
    }

    /// Operator-internal cell born active, accounting against `demand`.
    ///
    /// Pass the downstream cell's demand to share accounting, or a fresh
    /// counter when the operator translates demand itself.
    pub fn internal(demand: Arc<Demand>) -> Arc<Self> {
        Arc::new(Self {
            demand,
            state: AtomicU8::new(SubscriptionState::Active as u8),
            hook: Mutex::new(None),
            upstream: Mutex::new(Vec::new()),
        })
    }

    pub fn demand(&self) -> &Arc<Demand> {
        &self.demand
    }

    pub fn state(&self) -> SubscriptionState {
        SubscriptionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Unsubscribed -> Active`. Returns whether this call made the
    /// transition.
    pub fn activate(&self) -> bool {
        self.state
            .compare_exchange(
                SubscriptionState::Unsubscribed as u8,
                SubscriptionState::Active as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Still delivering events.
    pub fn is_live(&self) -> bool {
        self.state() == SubscriptionState::Active
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == SubscriptionState::Cancelled
    }

    /// Move into `Completed` or `Failed`. Returns `true` only for the call
    /// that won the transition; losers (late emitters, racing completions)
    /// must not deliver anything.
    pub fn terminate(&self, terminal: SubscriptionState) -> bool {
        debug_assert!(matches!(
            terminal,
            SubscriptionState::Completed | SubscriptionState::Failed
        ));
        let won = self
            .state
            .compare_exchange(
                SubscriptionState::Active as u8,
                terminal as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if won {
            self.teardown();
        }
        won
    }

    /// Install the producer-side request hook. Exactly one producer owns a
    /// cell; the hook is invoked (outside any cell lock) whenever demand is
    /// granted or signalled.
    pub fn on_request(&self, hook: impl Fn(u64) + Send + Sync + 'static) {
        *self.hook.lock() = Some(Arc::new(hook));
    }

    /// Grant `n` more units of demand and wake the producer. Additive and
    /// monotonic; ignored once terminal.
    pub fn request(&self, n: u64) {
        if self.state().is_terminal() {
            return;
        }
        self.demand.grant(n);
        self.signal(n);
    }

    /// Wake the producer without granting demand (used by boundary operators
    /// forwarding a request whose demand was already counted downstream).
    pub fn signal(&self, n: u64) {
        let hook = self.hook.lock().clone();
        if let Some(hook) = hook {
            hook(n);
        }
    }

    /// Cooperative cancellation: flips this cell terminal, then cancels every
    /// linked upstream cell. Idempotent; a delivery already executing on
    /// another thread may still finish, but no new delivery starts once the
    /// flag is visible.
    pub fn cancel(&self) {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if SubscriptionState::from_u8(current).is_terminal() {
                return;
            }
            match self.state.compare_exchange_weak(
                current,
                SubscriptionState::Cancelled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
        let upstream = std::mem::take(&mut *self.upstream.lock());
        *self.hook.lock() = None;
        for cell in upstream {
            cell.cancel();
        }
    }

    /// Register `up` so that cancelling `self` reaches it. If `self` is
    /// already finished the link is resolved immediately instead of stored.
    pub fn link_upstream(self: &Arc<Self>, up: &Arc<SubscriptionCell>) {
        match self.state() {
            SubscriptionState::Cancelled => up.cancel(),
            state if state.is_terminal() => {}
            _ => self.upstream.lock().push(Arc::clone(up)),
        }
    }

    /// Drop a previously registered link (an inner subscription that ran to
    /// completion and no longer needs cancellation).
    pub fn unlink_upstream(&self, up: &Arc<SubscriptionCell>) {
        self.upstream
            .lock()
            .retain(|cell| !Arc::ptr_eq(cell, up));
    }

    fn teardown(&self) {
        *self.hook.lock() = None;
        self.upstream.lock().clear();
    }
}

impl std::fmt::Debug for SubscriptionCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionCell")
            .field("state", &self.state())
            .field("outstanding", &self.demand.outstanding())
            .finish()
    }
}
