//! Fire-once delivery timers.
//!
//! Timers live in memory only: a pending delivery does not survive a
//! process restart and is not retried on failure. Cancellation is only
//! possible by id before the timer fires.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default, Clone)]
pub struct ScheduledDeliveries {
    inner: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl ScheduledDeliveries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a timer that runs `deliver` after `delay` unless the id
    /// is cancelled first.
    pub fn schedule<F>(&self, id: Uuid, delay: Duration, deliver: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        self.inner.lock().unwrap().insert(id, token.clone());

        let registry = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(%id, "scheduled delivery cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    deliver.await;
                }
            }
            registry.lock().unwrap().remove(&id);
        });
    }

    /// Returns false when the timer already fired or the id is unknown.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.inner.lock().unwrap().remove(&id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let deliveries = ScheduledDeliveries::new();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        deliveries.schedule(Uuid::new_v4(), Duration::from_secs(60), async move {
            flag.store(true, Ordering::SeqCst);
        });
        assert_eq!(deliveries.pending(), 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(deliveries.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire_suppresses_delivery() {
        let deliveries = ScheduledDeliveries::new();
        let fired = Arc::new(AtomicBool::new(false));

        let id = Uuid::new_v4();
        let flag = Arc::clone(&fired);
        deliveries.schedule(id, Duration::from_secs(60), async move {
            flag.store(true, Ordering::SeqCst);
        });

        assert!(deliveries.cancel(id));
        tokio::time::sleep(Duration::from_secs(120)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_unknown_id_is_false() {
        let deliveries = ScheduledDeliveries::new();
        assert!(!deliveries.cancel(Uuid::new_v4()));
    }
}
