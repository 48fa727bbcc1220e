//! Cancellable one-shot timers delivered through the app channel

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::console::events::AppEvent;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique timer generation
pub fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Spawns sleeps that post `AppEvent::Timer(generation)` when they elapse
#[derive(Debug, Clone)]
pub struct Scheduler {
    tx: UnboundedSender<AppEvent>,
}

impl Scheduler {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn schedule(&self, delay: Duration) -> PendingTimer {
        let generation = next_generation();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(AppEvent::Timer(generation)).is_err() {
                debug!("Timer {} fired after the event loop closed", generation);
            }
        });
        PendingTimer { generation, handle }
    }
}

/// Handle to a scheduled timer. Dropping it aborts the sleep.
#[derive(Debug)]
pub struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl PendingTimer {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let timer = scheduler.schedule(Duration::from_millis(200));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(100)).await;
        match rx.recv().await {
            Some(AppEvent::Timer(generation)) => assert!(timer.is(generation)),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(tx);
        let timer = scheduler.schedule(Duration::from_millis(200));
        drop(timer);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_generations_are_unique() {
        let a = next_generation();
        let b = next_generation();
        assert_ne!(a, b);
    }
}
