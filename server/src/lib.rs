//! # CPS Tracker Server Library
//!
//! This library provides the tracker that counts, per connected player, the
//! attack swings of the last second ("clicks per second") and the number of
//! consecutive hits landed on other players ("combo"). A game host feeds it
//! join, quit, swing and damage notifications; the tracker answers every
//! swing with a short status tip to show to the player.
//!
//! ## Core Responsibilities
//!
//! ### Per-Player Counters
//! Each joined player owns a bounded window of click timestamps and a combo
//! counter. Swings append to the window, hits on other players grow the
//! combo, and being hit drops it to zero.
//!
//! ### Time-Based Decay
//! A background sweep runs on a fixed period, removing clicks older than the
//! one second rate window and dropping the combo of players that stopped
//! swinging for more than two seconds.
//!
//! ### Graceful Degradation
//! Events and queries for players the tracker does not know are no-ops that
//! report zero. Nothing in the counting path can fail.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Concurrent map from player identity to tracked state:
//! - Join and quit lifecycle
//! - Click recording and rate queries
//! - Combo transitions for player-vs-player hits
//! - The sweep over a snapshot of all players
//!
//! ### Sweeper Module (`sweeper`)
//! The periodic tokio task driving the registry sweep.
//!
//! ### Events Module (`events`)
//! Maps host notifications to registry calls and builds replies.
//!
//! ### Config Module (`config`)
//! TOML configuration for the sweep period, bridge capacity and tip text.
//!
//! ### Network Module (`network`)
//! UDP bridge speaking the shared `Packet` protocol with game hosts.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use cps_server::config::TrackerConfig;
//! use cps_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = TrackerConfig::load_from("cps-tracker.toml");
//!     let mut server = Server::new("127.0.0.1:19132", &config).await?;
//!
//!     // Runs until a Shutdown message arrives on `server.control()`
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! The registry can also be used in-process without the network layer:
//!
//! ```rust
//! use cps_server::registry::PlayerRegistry;
//! use uuid::Uuid;
//!
//! let registry = PlayerRegistry::new();
//! let player = Uuid::new_v4();
//! registry.join(player);
//! registry.record_click(&player, 1_000);
//! registry.record_click(&player, 1_400);
//! assert_eq!(registry.cps(&player, 1_500), 2);
//! ```

pub mod config;
pub mod events;
pub mod network;
pub mod registry;
pub mod sweeper;

/// Error type used by the network plumbing and binaries
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
