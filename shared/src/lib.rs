//! Types shared between the tracker server and the host bridge.
//!
//! Holds the wire protocol, the tuning constants and the per-player core:
//! the click window, the combo counter and the status tip formatter. Nothing
//! in here does I/O, so the server can drive it from any thread and the
//! tests can feed it synthetic timestamps.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod combo;
pub mod display;
pub mod state;
pub mod window;

pub use combo::ComboCounter;
pub use display::{GlyphTable, TipFormatter, DEFAULT_TEMPLATE};
pub use state::{PlayerState, SweepOutcome};
pub use window::ClickWindow;

/// Maximum number of click timestamps kept per player.
pub const MAX_CLICKS: usize = 100;
/// Width of the trailing window used for clicks-per-second, in milliseconds.
pub const CPS_WINDOW_MS: u64 = 1000;
/// Idle time after which a combo is dropped, in milliseconds.
pub const COMBO_RESET_MS: u64 = 2000;
/// Default period of the decay sweep (ten server ticks).
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 500;

/// Inventory transaction subtype meaning "use item on entity", i.e. an attack swing.
pub const TRANSACTION_USE_ITEM_ON_ENTITY: u32 = 3;
/// Version spoken by both ends of the host bridge.
pub const PROTOCOL_VERSION: u32 = 1;

/// Stable player identity as reported by the game host.
pub type PlayerId = Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Packet {
    // host -> tracker
    Hello {
        protocol_version: u32,
    },
    PlayerJoined {
        player: PlayerId,
    },
    PlayerQuit {
        player: PlayerId,
    },
    InventoryTransaction {
        player: PlayerId,
        transaction_type: u32,
    },
    DamageByEntity {
        attacker: Option<PlayerId>,
        victim: Option<PlayerId>,
        attacker_is_player: bool,
        victim_is_player: bool,
    },
    QueryStats {
        player: PlayerId,
    },
    /// The host is shutting down; its players leave with it
    Goodbye,

    // tracker -> host
    Welcome {
        host_id: u32,
    },
    Rejected {
        reason: String,
    },
    Tip {
        player: PlayerId,
        text: String,
    },
    Stats {
        player: PlayerId,
        cps: u32,
        combo: u32,
    },
}

/// Current wall clock in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    millis.min(u64::MAX as u128) as u64
}
