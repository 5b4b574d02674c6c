//! Per-player tracking state: click window plus combo counter.

use crate::combo::{idle_since, ComboCounter};
use crate::window::ClickWindow;

/// What a single sweep did to one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Clicks removed for being older than the rate window.
    pub expired: usize,
    /// Whether the idle timeout fired and dropped the combo.
    pub idle_reset: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub clicks: ClickWindow,
    pub combo: ComboCounter,
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            clicks: ClickWindow::new(),
            combo: ComboCounter::new(),
        }
    }

    pub fn record_click(&mut self, now: u64) -> u64 {
        self.clicks.record(now)
    }

    pub fn cps(&self, now: u64) -> u32 {
        self.clicks.count_recent(now)
    }

    pub fn combo(&self) -> u32 {
        self.combo.get()
    }

    pub fn hit_landed(&mut self) -> u32 {
        self.combo.hit_landed()
    }

    pub fn hit_received(&mut self) {
        self.combo.hit_received();
    }

    /// One decay pass: expire old clicks, then apply the idle timeout.
    ///
    /// The idle check measures from the newest click present when the pass
    /// started, so expiring that click in the same pass cannot hide the
    /// idleness. A window that is already empty is left alone.
    ///
    /// With any sweep period up to one second, some pass lands between one
    /// and two seconds after the last click and expires it without reaching
    /// the idle threshold. Later passes then see an empty window, so a
    /// tracker sweeping on schedule never fires the idle reset: a stale
    /// combo survives until the player is hit. The reset only fires when a
    /// pass first sees the newest click more than two seconds after it
    /// was recorded.
    pub fn sweep(&mut self, now: u64) -> SweepOutcome {
        let newest = match self.clicks.last() {
            Some(t) => t,
            None => return SweepOutcome::default(),
        };

        let expired = self.clicks.trim_expired(now);
        let idle_reset = idle_since(Some(newest), now);
        if idle_reset {
            self.combo.reset();
            self.clicks.clear();
        }

        SweepOutcome {
            expired,
            idle_reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_combo(combo: u32, clicks: &[u64]) -> PlayerState {
        let mut state = PlayerState::new();
        for _ in 0..combo {
            state.hit_landed();
        }
        for &t in clicks {
            state.record_click(t);
        }
        state
    }

    #[test]
    fn test_fresh_state() {
        let state = PlayerState::new();
        assert_eq!(state.combo(), 0);
        assert_eq!(state.cps(1_000), 0);
        assert!(state.clicks.is_empty());
    }

    #[test]
    fn test_sweep_resets_idle_combo() {
        let mut state = state_with_combo(5, &[0]);

        let outcome = state.sweep(2_100);

        assert!(outcome.idle_reset);
        assert_eq!(state.combo(), 0);
        assert!(state.clicks.is_empty());
    }

    #[test]
    fn test_sweep_does_not_reset_early() {
        let mut state = state_with_combo(5, &[0]);

        let outcome = state.sweep(1_900);

        assert!(!outcome.idle_reset);
        assert_eq!(outcome.expired, 1);
        assert_eq!(state.combo(), 5);
    }

    #[test]
    fn test_sweep_leaves_fresh_window_unchanged() {
        let mut state = state_with_combo(5, &[1_000, 1_400]);

        let outcome = state.sweep(1_900);

        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(state.combo(), 5);
        assert_eq!(state.clicks.iter().collect::<Vec<_>>(), vec![1_000, 1_400]);
    }

    #[test]
    fn test_sweep_skips_empty_window() {
        // stale combo without clicks is only cleared by being hit
        let mut state = state_with_combo(3, &[]);

        let outcome = state.sweep(60_000);

        assert_eq!(outcome, SweepOutcome::default());
        assert_eq!(state.combo(), 3);
    }

    #[test]
    fn test_sweep_after_trim_emptied_window_keeps_combo() {
        let mut state = state_with_combo(4, &[0]);

        state.sweep(1_500);
        assert!(state.clicks.is_empty());

        let outcome = state.sweep(2_100);
        assert!(!outcome.idle_reset);
        assert_eq!(state.combo(), 4);
    }

    #[test]
    fn test_sweep_reset_reads_newest_click() {
        let mut state = state_with_combo(2, &[1_000, 1_500]);

        assert!(!state.sweep(3_400).idle_reset);
        assert_eq!(state.combo(), 2);

        let mut state = state_with_combo(2, &[1_000, 1_500]);
        let outcome = state.sweep(3_600);
        assert!(outcome.idle_reset);
        assert_eq!(outcome.expired, 2);
        assert_eq!(state.combo(), 0);
        assert!(state.clicks.is_empty());
    }

    #[test]
    fn test_scheduled_sweeps_never_reach_idle_reset() {
        for period in [50u64, 500, 1_000] {
            let mut state = state_with_combo(5, &[0]);
            let mut fired = false;

            let mut now = period;
            while now <= 20_000 {
                fired |= state.sweep(now).idle_reset;
                now += period;
            }

            assert!(!fired, "period {}", period);
            assert_eq!(state.combo(), 5);
            assert!(state.clicks.is_empty());
        }
    }

    #[test]
    fn test_hit_received_ignores_click_recency() {
        let mut state = state_with_combo(6, &[9_990, 10_000]);

        state.hit_received();

        assert_eq!(state.combo(), 0);
        assert_eq!(state.cps(10_000), 2);
    }
}
