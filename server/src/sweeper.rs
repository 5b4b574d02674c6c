//! Periodic decay task expiring old clicks and idle combos

use crate::registry::PlayerRegistry;
use cps_shared::now_millis;
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Millisecond clock the sweep reads its `now` from
pub type Clock = fn() -> u64;

/// Runs [`PlayerRegistry::sweep`] on a fixed period, independent of event traffic
pub struct Sweeper {
    registry: Arc<PlayerRegistry>,
    period: Duration,
    clock: Clock,
}

impl Sweeper {
    pub fn new(registry: Arc<PlayerRegistry>, period: Duration) -> Self {
        Self::with_clock(registry, period, now_millis)
    }

    pub fn with_clock(registry: Arc<PlayerRegistry>, period: Duration, clock: Clock) -> Self {
        Self {
            registry,
            period,
            clock,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawns the sweep loop on the current tokio runtime
    ///
    /// The loop runs until the returned handle is aborted. Late ticks are
    /// skipped rather than bunched up, since one sweep catches up fully.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let report = self.registry.sweep((self.clock)());
                if !report.is_quiet() {
                    debug!(
                        "Sweep over {} players: {} clicks expired, {} combos reset",
                        report.scanned, report.expired, report.idle_resets
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::time::sleep;
    use uuid::Uuid;

    static FAKE_NOW: AtomicU64 = AtomicU64::new(0);

    fn fake_clock() -> u64 {
        FAKE_NOW.load(Ordering::SeqCst)
    }

    #[test]
    fn test_default_clock_is_wall_clock() {
        let sweeper = Sweeper::new(Arc::new(PlayerRegistry::new()), Duration::from_millis(500));
        assert_eq!(sweeper.period(), Duration::from_millis(500));
        assert!((sweeper.clock)() > 0);
    }

    #[tokio::test]
    async fn test_spawned_sweeper_resets_idle_combo() {
        let registry = Arc::new(PlayerRegistry::new());
        let player = Uuid::new_v4();
        registry.join(player);
        for _ in 0..5 {
            registry.hit_landed(&player);
        }

        FAKE_NOW.store(1_000, Ordering::SeqCst);
        registry.record_click(&player, 1_000);

        let handle =
            Sweeper::with_clock(Arc::clone(&registry), Duration::from_millis(5), fake_clock)
                .spawn();

        sleep(Duration::from_millis(30)).await;
        assert_eq!(registry.combo(&player), 5);
        assert_eq!(registry.cps(&player, 1_000), 1);

        FAKE_NOW.store(3_100, Ordering::SeqCst);
        sleep(Duration::from_millis(30)).await;
        assert_eq!(registry.combo(&player), 0);
        assert!(registry.clicks(&player).is_empty());

        handle.abort();
        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
