//! Injected scheduling for timed operators
//!
//! Timed operators never reach for process-wide state; whoever composes a
//! `delay_by` hands in the scheduler explicitly.

use std::time::Duration;

/// Deferred one-shot execution. The only contract is that `task` runs at
/// least `delay` after the call, on some execution context other than the
/// caller's current stack frame.
pub trait Scheduler: Send + Sync + 'static {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>);
}

/// Scheduler backed by plain OS threads. Always available; fine for tests
/// and for programs that do not run an async runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) {
        std::thread::spawn(move || {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            task();
        });
    }
}

/// Scheduler backed by the ambient tokio runtime.
///
/// Must be used from within a tokio runtime context; `tokio::spawn` panics
/// otherwise, same as the rest of the tokio ecosystem.
#[cfg(feature = "tokio-scheduler")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "tokio-scheduler")]
impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) {
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn thread_scheduler_runs_task() {
        let (tx, rx) = mpsc::channel();
        ThreadScheduler.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                let _ = tx.send(42);
            }),
        );
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)), Ok(42));
    }

    #[cfg(feature = "tokio-scheduler")]
    #[tokio::test]
    async fn tokio_scheduler_runs_task() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        TokioScheduler.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                let _ = tx.send(7);
            }),
        );
        assert_eq!(rx.recv().await, Some(7));
    }
}
