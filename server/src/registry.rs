//! Concurrent per-player state registry
//!
//! This module owns the tracked state of every joined player:
//! - Player lifecycle (join, quit)
//! - Click recording and clicks-per-second queries
//! - Combo transitions driven by player-vs-player damage
//! - The decay sweep over every tracked player
//!
//! State lives in a sharded map, so updates for unrelated players do not
//! contend on one lock, and every change to a single player happens under
//! that player's entry lock. Calls naming a player that never joined, or
//! already quit, are no-ops that report zero.

use cps_shared::{PlayerId, PlayerState, SweepOutcome};
use dashmap::DashMap;
use log::{debug, info};

/// Point-in-time view of a player's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerStats {
    pub cps: u32,
    pub combo: u32,
}

/// Totals for one sweep across all tracked players
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Players present in the key snapshot taken at sweep start
    pub scanned: usize,
    /// Clicks removed for age
    pub expired: usize,
    /// Players whose combo was dropped by the idle timeout
    pub idle_resets: usize,
}

impl SweepReport {
    pub fn is_quiet(&self) -> bool {
        self.expired == 0 && self.idle_resets == 0
    }
}

/// Tracks click windows and combos for every joined player
///
/// The registry is shared behind an `Arc` between the host event handler
/// and the sweeper task. No method blocks on anything but the short-lived
/// entry lock of the player it touches.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    /// Tracked players indexed by their stable identity
    players: DashMap<PlayerId, PlayerState>,
}

impl PlayerRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
        }
    }

    /// Starts tracking a player
    ///
    /// Returns true if the player was not tracked yet. Joining twice keeps
    /// the existing state untouched.
    pub fn join(&self, player: PlayerId) -> bool {
        let mut inserted = false;
        self.players.entry(player).or_insert_with(|| {
            inserted = true;
            PlayerState::new()
        });

        if inserted {
            info!("Player {} joined", player);
        }
        inserted
    }

    /// Stops tracking a player and discards all of their state
    ///
    /// Returns true if the player was tracked. A sweep that is already
    /// running simply skips the player once the entry is gone.
    pub fn quit(&self, player: &PlayerId) -> bool {
        if self.players.remove(player).is_some() {
            info!("Player {} left", player);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players.contains_key(player)
    }

    /// Records an attack swing at `now` (milliseconds)
    ///
    /// Returns false if the player is not tracked; the click is dropped.
    pub fn record_click(&self, player: &PlayerId, now: u64) -> bool {
        match self.players.get_mut(player) {
            Some(mut state) => {
                state.record_click(now);
                true
            }
            None => {
                debug!("Dropping click for untracked player {}", player);
                false
            }
        }
    }

    /// Clicks within the trailing second, 0 for untracked players
    pub fn cps(&self, player: &PlayerId, now: u64) -> u32 {
        self.players
            .get(player)
            .map(|state| state.cps(now))
            .unwrap_or(0)
    }

    /// Current combo, 0 for untracked players
    pub fn combo(&self, player: &PlayerId) -> u32 {
        self.players
            .get(player)
            .map(|state| state.combo())
            .unwrap_or(0)
    }

    /// Reads both counters under a single entry lock
    pub fn stats(&self, player: &PlayerId, now: u64) -> PlayerStats {
        self.players
            .get(player)
            .map(|state| PlayerStats {
                cps: state.cps(now),
                combo: state.combo(),
            })
            .unwrap_or_default()
    }

    /// Adds one to the player's combo, returning the new value
    pub fn hit_landed(&self, player: &PlayerId) -> Option<u32> {
        self.players
            .get_mut(player)
            .map(|mut state| state.hit_landed())
    }

    /// Drops the player's combo to zero
    pub fn hit_received(&self, player: &PlayerId) -> bool {
        match self.players.get_mut(player) {
            Some(mut state) => {
                state.hit_received();
                true
            }
            None => false,
        }
    }

    /// Applies a player-vs-player hit: the attacker's combo grows by one and
    /// the victim's combo is reset
    ///
    /// The two entries are locked one after the other, never together, so
    /// two opposite hits landing at once cannot deadlock on the shards.
    pub fn apply_hit(&self, attacker: &PlayerId, victim: &PlayerId) {
        self.hit_landed(attacker);
        self.hit_received(victim);
    }

    /// Runs the decay pass for a single player
    pub fn sweep_player(&self, player: &PlayerId, now: u64) -> Option<SweepOutcome> {
        self.players
            .get_mut(player)
            .map(|mut state| state.sweep(now))
    }

    /// Runs the decay pass over a snapshot of every tracked player
    ///
    /// Players joining during the pass are picked up next time, and players
    /// quitting during it are skipped.
    pub fn sweep(&self, now: u64) -> SweepReport {
        let snapshot = self.player_ids();
        let mut report = SweepReport {
            scanned: snapshot.len(),
            ..SweepReport::default()
        };

        for player in &snapshot {
            if let Some(outcome) = self.sweep_player(player, now) {
                report.expired += outcome.expired;
                if outcome.idle_reset {
                    debug!("Combo of player {} expired after idling", player);
                    report.idle_resets += 1;
                }
            }
        }

        report
    }

    /// Copy of a player's click timestamps, oldest first
    pub fn clicks(&self, player: &PlayerId) -> Vec<u64> {
        self.players
            .get(player)
            .map(|state| state.clicks.iter().collect())
            .unwrap_or_default()
    }

    /// Identities of all tracked players
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|entry| *entry.key()).collect()
    }

    /// Returns the number of tracked players
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns true if no players are tracked
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
