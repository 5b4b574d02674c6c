//! Host event dispatch
//!
//! Turns notifications from the game host into registry calls and decides
//! what, if anything, goes back to the host. Attack swings are answered with
//! a freshly rendered status tip for the swinging player.

use crate::registry::PlayerRegistry;
use cps_shared::{Packet, PlayerId, TipFormatter, TRANSACTION_USE_ITEM_ON_ENTITY};
use log::debug;
use std::sync::Arc;

/// Damage dealt by one entity to another, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    pub attacker: Option<PlayerId>,
    pub victim: Option<PlayerId>,
    pub attacker_is_player: bool,
    pub victim_is_player: bool,
}

impl DamageEvent {
    /// Attacker and victim, only when both sides are players
    pub fn player_pair(&self) -> Option<(PlayerId, PlayerId)> {
        if !(self.attacker_is_player && self.victim_is_player) {
            return None;
        }
        Some((self.attacker?, self.victim?))
    }
}

/// Notifications the tracker reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    PlayerJoined(PlayerId),
    PlayerQuit(PlayerId),
    ClickOccurred { player: PlayerId, timestamp: u64 },
    DamageByEntity(DamageEvent),
    StatsRequested(PlayerId),
}

impl HostEvent {
    /// Maps a bridge packet to an event, stamping clicks with `now`
    ///
    /// Only "use item on entity" transactions count as clicks. Packets that
    /// carry no event (handshake, tracker replies, other transactions)
    /// yield `None`.
    pub fn from_packet(packet: Packet, now: u64) -> Option<Self> {
        match packet {
            Packet::PlayerJoined { player } => Some(HostEvent::PlayerJoined(player)),
            Packet::PlayerQuit { player } => Some(HostEvent::PlayerQuit(player)),
            Packet::InventoryTransaction {
                player,
                transaction_type,
            } => {
                if transaction_type == TRANSACTION_USE_ITEM_ON_ENTITY {
                    Some(HostEvent::ClickOccurred {
                        player,
                        timestamp: now,
                    })
                } else {
                    None
                }
            }
            Packet::DamageByEntity {
                attacker,
                victim,
                attacker_is_player,
                victim_is_player,
            } => Some(HostEvent::DamageByEntity(DamageEvent {
                attacker,
                victim,
                attacker_is_player,
                victim_is_player,
            })),
            Packet::QueryStats { player } => Some(HostEvent::StatsRequested(player)),
            _ => None,
        }
    }
}

/// Applies host events to the shared registry
pub struct EventHandler {
    registry: Arc<PlayerRegistry>,
    formatter: TipFormatter,
}

impl EventHandler {
    pub fn new(registry: Arc<PlayerRegistry>, formatter: TipFormatter) -> Self {
        Self {
            registry,
            formatter,
        }
    }

    pub fn registry(&self) -> &Arc<PlayerRegistry> {
        &self.registry
    }

    /// Applies one event and returns the reply for the host, if any
    pub fn handle(&self, event: HostEvent, now: u64) -> Option<Packet> {
        match event {
            HostEvent::PlayerJoined(player) => {
                self.registry.join(player);
                None
            }
            HostEvent::PlayerQuit(player) => {
                self.registry.quit(&player);
                None
            }
            HostEvent::ClickOccurred { player, timestamp } => {
                if !self.registry.record_click(&player, timestamp) {
                    return None;
                }
                let stats = self.registry.stats(&player, now);
                Some(Packet::Tip {
                    player,
                    text: self.formatter.format(stats.cps, stats.combo),
                })
            }
            HostEvent::DamageByEntity(damage) => {
                match damage.player_pair() {
                    Some((attacker, victim)) => self.registry.apply_hit(&attacker, &victim),
                    None => debug!("Ignoring damage not dealt between two players"),
                }
                None
            }
            HostEvent::StatsRequested(player) => {
                let stats = self.registry.stats(&player, now);
                Some(Packet::Stats {
                    player,
                    cps: stats.cps,
                    combo: stats.combo,
                })
            }
        }
    }
}
