//! # Simulated Game Host
//!
//! Stands in for the game server integration that feeds the CPS tracker.
//! It plays a handful of players that swing at each other at a configurable
//! rate and prints the status tips the tracker sends back, which makes it
//! useful for watching the counters and their decay without a real game.
//!
//! ## Traffic Model
//!
//! Every 50ms tick each player swings a number of times drawn around the
//! configured clicks-per-second rate. Each swing is sent as an attack
//! inventory transaction, and with the configured probability it also lands
//! as damage on a random other player, which grows the attacker's combo and
//! resets the victim's.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use cps_client::network::{HostSimulator, SimulationSettings};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = SimulationSettings {
//!         players: 4,
//!         cps: 8.0,
//!         hit_chance: 0.4,
//!         duration: Duration::from_secs(30),
//!     };
//!
//!     let mut host = HostSimulator::new("127.0.0.1:19133", settings).await?;
//!     host.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod network;
