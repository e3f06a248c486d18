//! Cancellable scheduled tasks
//!
//! Timers deliver plain events into the owner's event channel instead of
//! running callbacks, so the owner handles them on its own loop like any
//! other input. A [`TaskHandle`] aborts its task when cancelled or dropped.
//! An event that was already queued before cancellation can still arrive, so
//! owners stamp events with a ticket and ignore stale ones.

use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};

/// Spawns timer tasks that post events to one channel
pub struct Scheduler<E> {
    tx: mpsc::UnboundedSender<E>,
}

impl<E> Clone for Scheduler<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<E: Send + 'static> Scheduler<E> {
    /// Create a scheduler posting into `tx`
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<E>) -> Self {
        Self { tx }
    }

    /// Deliver `event` once after `delay`
    pub fn once(&self, delay: Duration, event: E) -> TaskHandle {
        let tx = self.tx.clone();
        let deadline = Instant::now() + delay;
        TaskHandle::new(tokio::spawn(async move {
            sleep_until(deadline).await;
            let _ = tx.send(event);
        }))
    }

    /// Run `task` and deliver its output as the event
    pub fn spawn<F>(&self, task: F) -> TaskHandle
    where
        F: Future<Output = E> + Send + 'static,
    {
        let tx = self.tx.clone();
        TaskHandle::new(tokio::spawn(async move {
            let event = task.await;
            let _ = tx.send(event);
        }))
    }

    /// Deliver `make()` every `period`, first delivery after one period
    pub fn repeating<F>(&self, period: Duration, make: F) -> TaskHandle
    where
        F: Fn() -> E + Send + 'static,
    {
        let tx = self.tx.clone();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        TaskHandle::new(tokio::spawn(async move {
            loop {
                ticker.tick().await;
                if tx.send(make()).is_err() {
                    break;
                }
            }
        }))
    }
}

/// Owner's handle on a scheduled task
#[derive(Debug)]
pub struct TaskHandle {
    handle: JoinHandle<()>,
}

impl TaskHandle {
    fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Whether the task can still deliver an event
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Abort the task
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let _handle = scheduler.once(Duration::from_millis(300), "replay");

        tokio::time::advance(Duration::from_millis(299)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(rx.recv().await, Some("replay"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_task_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let handle = scheduler.once(Duration::from_millis(100), 1u32);
        handle.cancel();

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_spawn_delivers_output() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let _handle = scheduler.spawn(async { 40 + 2 });

        assert_eq!(rx.recv().await, Some(42));
    }

    #[tokio::test]
    async fn test_dropped_spawn_never_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let handle = scheduler.spawn(std::future::pending::<u32>());
        assert!(handle.is_pending());

        drop(handle);
        drop(scheduler);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_until_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let handle = scheduler.repeating(Duration::from_secs(25), || "ping");

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(25)).await;
            assert_eq!(rx.recv().await, Some("ping"));
        }

        drop(handle);
        tokio::time::advance(Duration::from_secs(100)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
    }
}
