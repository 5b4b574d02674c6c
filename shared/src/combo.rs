use crate::COMBO_RESET_MS;

/// Consecutive-hit counter for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboCounter {
    count: u32,
}

impl ComboCounter {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// The player hit another player.
    pub fn hit_landed(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    /// The player was hit by another player. Applies regardless of click recency.
    pub fn hit_received(&mut self) {
        self.count = 0;
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn get(&self) -> u32 {
        self.count
    }
}

/// True when `last_click` is more than `COMBO_RESET_MS` behind `now`.
///
/// `None` means there is no click to measure idleness from, which never
/// counts as idle.
pub fn idle_since(last_click: Option<u64>, now: u64) -> bool {
    last_click.is_some_and(|last| now.saturating_sub(last) > COMBO_RESET_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::ClickWindow;

    #[test]
    fn test_combo_starts_at_zero() {
        assert_eq!(ComboCounter::new().get(), 0);
        assert_eq!(ComboCounter::default(), ComboCounter::new());
    }

    #[test]
    fn test_hit_landed_increments_by_one() {
        let mut combo = ComboCounter::new();
        assert_eq!(combo.hit_landed(), 1);
        assert_eq!(combo.hit_landed(), 2);
        assert_eq!(combo.get(), 2);
    }

    #[test]
    fn test_hit_received_resets() {
        let mut combo = ComboCounter::new();
        for _ in 0..7 {
            combo.hit_landed();
        }

        combo.hit_received();
        assert_eq!(combo.get(), 0);
    }

    #[test]
    fn test_idle_threshold_is_exclusive() {
        assert!(!idle_since(Some(0), COMBO_RESET_MS));
        assert!(idle_since(Some(0), COMBO_RESET_MS + 1));
        assert!(!idle_since(Some(5_000), 1_000));
    }

    #[test]
    fn test_empty_window_is_never_idle() {
        let window = ClickWindow::new();
        assert!(!idle_since(window.last(), u64::MAX));
    }

    #[test]
    fn test_window_idle_reads_newest_click() {
        let mut window = ClickWindow::new();
        window.record(0);
        window.record(1_000);

        assert!(!idle_since(window.last(), 2_900));
        assert!(idle_since(window.last(), 3_100));
    }
}
