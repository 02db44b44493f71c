//! Single-slot request gate for a remote service with a global rate limit
//!
//! Only one permit exists. A caller holds it for the whole remote call, and
//! the next permit is not handed out until `interval` has passed since the
//! previous one was granted.

use std::future::Future;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(3000);

pub struct RequestGate {
    interval: Duration,
    last_granted: Mutex<Option<Instant>>,
}

/// Exclusive right to issue one request; released on drop
pub struct GatePermit<'a> {
    _slot: MutexGuard<'a, Option<Instant>>,
}

impl RequestGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_granted: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait for the slot to be free and for the interval to elapse
    pub async fn acquire(&self) -> GatePermit<'_> {
        let mut slot = self.last_granted.lock().await;
        if let Some(previous) = *slot {
            let ready_at = previous + self.interval;
            let now = Instant::now();
            if ready_at > now {
                debug!("Request gate waiting {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *slot = Some(Instant::now());
        GatePermit { _slot: slot }
    }

    /// Run `call` while holding the permit
    pub async fn send<F, Fut, T>(&self, call: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _permit = self.acquire().await;
        call().await
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::timeout;

    fn assert_near(actual: Duration, expected: Duration) {
        let slack = Duration::from_millis(5);
        assert!(
            actual >= expected && actual <= expected + slack,
            "elapsed {actual:?}, expected {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn first_acquire_is_immediate() {
        let gate = RequestGate::default();
        let start = Instant::now();
        let _permit = gate.acquire().await;
        assert_near(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn spaces_consecutive_acquisitions() {
        let gate = RequestGate::new(Duration::from_millis(3000));
        let start = Instant::now();
        let mut granted = Vec::new();
        for _ in 0..3 {
            drop(gate.acquire().await);
            granted.push(start.elapsed());
        }
        assert_near(granted[0], Duration::ZERO);
        assert_near(granted[1], Duration::from_millis(3000));
        assert_near(granted[2], Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn time_spent_in_call_counts_towards_interval() {
        let gate = RequestGate::new(Duration::from_millis(3000));
        gate.send(|| tokio::time::sleep(Duration::from_millis(2000))).await;

        let start = Instant::now();
        drop(gate.acquire().await);
        assert_near(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn no_second_permit_while_one_is_held() {
        let gate = RequestGate::new(Duration::ZERO);
        let permit = gate.acquire().await;
        assert!(timeout(Duration::from_secs(60), gate.acquire()).await.is_err());
        drop(permit);
        assert!(timeout(Duration::from_secs(60), gate.acquire()).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialised() {
        let gate = Arc::new(RequestGate::new(Duration::from_millis(500)));
        let in_flight = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let start = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    gate.send(|| async {
                        let now = in_flight.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        assert_eq!(now, 0);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        in_flight.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
                    })
                    .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        // Grants at 0, 500, 1000, 1500; the last call runs for 100ms
        assert!(start.elapsed() >= Duration::from_millis(1600));
        assert!(start.elapsed() < Duration::from_millis(1700));
    }
}
