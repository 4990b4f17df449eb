//! Liveness watchdog.
//!
//! A dead peer does not always produce a read error: a NAT timeout or a
//! wedged server can leave the socket open and silent forever. The watchdog
//! runs as an independent periodic task, compares time-since-last-inbound
//! against the configured interval, and requests a stop when the line has
//! gone quiet for too long. The read loop then unblocks and the session
//! ends like any other disconnect.

use std::sync::Weak;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// How often the watchdog wakes up to check, independent of the configured
/// interval. Matches the original bot's 30-second timer.
pub const DEFAULT_TICK: Duration = Duration::from_secs(30);

/// The side of the connection the watchdog observes: the liveness timestamp
/// (read-only) and the stop request. Held as a `Weak` back-reference so the
/// watchdog never keeps a connection alive.
pub(crate) trait WatchdogTarget: Send + Sync {
    /// Instant of the most recent inbound byte.
    fn last_activity(&self) -> Instant;

    /// Ask the connection to shut the session down.
    fn request_stop(&self);
}

/// Periodic liveness monitor. `arm` and `disarm` are both idempotent.
pub struct Watchdog {
    tick: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Watchdog {
    /// Watchdog with the default check cadence.
    pub fn new() -> Self {
        Self::with_tick(DEFAULT_TICK)
    }

    /// Watchdog with a custom check cadence. Tests use a short tick so a
    /// stale connection is detected without waiting half a minute.
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            tick,
            handle: Mutex::new(None),
        }
    }

    /// Start the periodic check. A no-op when already armed.
    ///
    /// Once elapsed-since-liveness exceeds `interval`, the target's stop is
    /// requested exactly once and the task ends. The task also ends when
    /// the target is dropped.
    pub(crate) fn arm(&self, target: Weak<dyn WatchdogTarget>, interval: Duration) {
        let mut guard = self.handle.lock();
        if guard.is_some() {
            return;
        }
        let tick = self.tick;
        debug!(?interval, ?tick, "watchdog armed");
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                let _ = ticker.tick().await;
                let Some(target) = target.upgrade() else {
                    break;
                };
                let elapsed = target.last_activity().elapsed();
                if elapsed > interval {
                    warn!(?elapsed, ?interval, "watchdog interval elapsed, stopping connection");
                    target.request_stop();
                    break;
                }
            }
        }));
    }

    /// Stop the periodic check. A no-op when not armed.
    pub fn disarm(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            debug!("watchdog disarmed");
        }
    }

    /// Whether an arm is in effect.
    pub fn is_armed(&self) -> bool {
        self.handle.lock().is_some()
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::RwLock;

    struct FakeTarget {
        last: RwLock<Instant>,
        // Shared with the test so the count survives dropping the target.
        stops: Arc<AtomicUsize>,
    }

    impl FakeTarget {
        fn new() -> (Arc<Self>, Arc<AtomicUsize>) {
            let stops = Arc::new(AtomicUsize::new(0));
            let target = Arc::new(Self {
                last: RwLock::new(Instant::now()),
                stops: Arc::clone(&stops),
            });
            (target, stops)
        }

        fn touch(&self) {
            *self.last.write() = Instant::now();
        }
    }

    impl WatchdogTarget for FakeTarget {
        fn last_activity(&self) -> Instant {
            *self.last.read()
        }

        fn request_stop(&self) {
            let _ = self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn weak(target: &Arc<FakeTarget>) -> Weak<dyn WatchdogTarget> {
        let weak = Arc::downgrade(target);
        weak
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_silence() {
        let (target, stops) = FakeTarget::new();
        let dog = Watchdog::with_tick(Duration::from_secs(1));
        dog.arm(weak(&target), Duration::from_secs(5));

        // Silence well past the interval, across many ticks.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn activity_defers_firing() {
        let (target, stops) = FakeTarget::new();
        let dog = Watchdog::with_tick(Duration::from_secs(1));
        dog.arm(weak(&target), Duration::from_secs(5));

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_secs(2)).await;
            target.touch();
        }
        assert_eq!(stops.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn arm_twice_is_noop() {
        let (target, stops) = FakeTarget::new();
        let dog = Watchdog::with_tick(Duration::from_secs(1));
        dog.arm(weak(&target), Duration::from_secs(5));
        dog.arm(weak(&target), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(30)).await;
        // A second armed task would have fired a second stop.
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_prevents_firing() {
        let (target, stops) = FakeTarget::new();
        let dog = Watchdog::with_tick(Duration::from_secs(1));
        dog.arm(weak(&target), Duration::from_secs(5));
        dog.disarm();
        assert!(!dog.is_armed());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stops.load(Ordering::SeqCst), 0);
        drop(target);
    }

    #[tokio::test]
    async fn disarm_when_not_armed_is_noop() {
        let dog = Watchdog::new();
        dog.disarm();
        assert!(!dog.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_target_ends_task_without_stop() {
        let (target, stops) = FakeTarget::new();
        let dog = Watchdog::with_tick(Duration::from_secs(1));
        dog.arm(weak(&target), Duration::from_secs(5));

        drop(target);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }
}
