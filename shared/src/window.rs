//! Sliding window of click timestamps for one player.
//!
//! The window has two independent bounds. A count cap applied when a click
//! is appended keeps memory and query cost fixed no matter how fast a player
//! clicks, and a time-based expiry is applied by the periodic sweep so idle
//! players do not keep stale entries resident.

use crate::{CPS_WINDOW_MS, MAX_CLICKS};
use std::collections::VecDeque;

/// Oldest-first sequence of click timestamps in milliseconds.
///
/// Timestamps are non-decreasing from front to back, which lets every query
/// scan from one end and stop early.
#[derive(Debug, Clone, Default)]
pub struct ClickWindow {
    clicks: VecDeque<u64>,
}

impl ClickWindow {
    pub fn new() -> Self {
        Self {
            clicks: VecDeque::with_capacity(MAX_CLICKS),
        }
    }

    /// Appends a click and enforces the `MAX_CLICKS` cap.
    ///
    /// A timestamp older than the newest entry is raised to it so the window
    /// stays sorted. Returns the timestamp actually stored.
    pub fn record(&mut self, now: u64) -> u64 {
        let at = self.last().map_or(now, |last| last.max(now));
        self.clicks.push_back(at);
        self.cap_at(MAX_CLICKS);
        at
    }

    /// Drops the oldest entries until at most `max` remain.
    /// Returns how many were evicted.
    pub fn cap_at(&mut self, max: usize) -> usize {
        let excess = self.clicks.len().saturating_sub(max);
        self.clicks.drain(..excess);
        excess
    }

    /// Removes every entry strictly older than `cutoff`.
    /// Returns how many were removed.
    pub fn expire_older_than(&mut self, cutoff: u64) -> usize {
        let stale = self.clicks.iter().take_while(|&&t| t < cutoff).count();
        self.clicks.drain(..stale);
        stale
    }

    /// Removes clicks that fell out of the trailing one-second window.
    pub fn trim_expired(&mut self, now: u64) -> usize {
        self.expire_older_than(now.saturating_sub(CPS_WINDOW_MS))
    }

    /// Number of clicks with a timestamp at or after `cutoff`.
    pub fn count_since(&self, cutoff: u64) -> usize {
        self.clicks.iter().rev().take_while(|&&t| t >= cutoff).count()
    }

    /// Clicks per second: entries within the last `CPS_WINDOW_MS`, inclusive.
    pub fn count_recent(&self, now: u64) -> u32 {
        self.count_since(now.saturating_sub(CPS_WINDOW_MS)) as u32
    }

    /// Most recent click, if any.
    pub fn last(&self) -> Option<u64> {
        self.clicks.back().copied()
    }

    pub fn clear(&mut self) {
        self.clicks.clear();
    }

    pub fn len(&self) -> usize {
        self.clicks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clicks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.clicks.iter().copied()
    }
}
