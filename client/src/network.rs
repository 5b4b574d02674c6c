use bincode::{deserialize, serialize};
use cps_shared::{Packet, PlayerId, PROTOCOL_VERSION, TRANSACTION_USE_ITEM_ON_ENTITY};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep, timeout, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Interval between simulated input batches
const TICK: Duration = Duration::from_millis(50);
/// How long to wait for the tracker to answer the handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Knobs for the simulated traffic
#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub players: usize,
    /// Average swings per second for every player
    pub cps: f64,
    /// Chance that a swing lands on another player
    pub hit_chance: f64,
    pub duration: Duration,
}

impl SimulationSettings {
    /// Rejects rates and chances the traffic generator cannot use
    pub fn validate(&self) -> Result<(), String> {
        if !self.cps.is_finite() || self.cps < 0.0 {
            return Err(format!("cps must be a non-negative number, got {}", self.cps));
        }
        if !(0.0..=1.0).contains(&self.hit_chance) {
            return Err(format!(
                "hit chance must be between 0 and 1, got {}",
                self.hit_chance
            ));
        }
        Ok(())
    }
}

/// Number of swings in one tick for an average of `expected` per tick
///
/// The whole part always fires; the fractional part fires when `roll`
/// (uniform in 0..1) falls below it.
pub fn clicks_for_tick(expected: f64, roll: f64) -> u32 {
    let expected = expected.max(0.0);
    let whole = expected.floor();
    let extra = if roll < expected - whole { 1 } else { 0 };
    whole as u32 + extra
}

/// Index of the player hit by `attacker`, never the attacker itself
pub fn pick_victim(player_count: usize, attacker: usize, roll: usize) -> Option<usize> {
    if player_count < 2 {
        return None;
    }
    let offset = 1 + roll % (player_count - 1);
    Some((attacker + offset) % player_count)
}

/// Simulated game host feeding the tracker over UDP
pub struct HostSimulator {
    socket: UdpSocket,
    server_addr: SocketAddr,
    host_id: Option<u32>,
    players: Vec<PlayerId>,
    settings: SimulationSettings,
    rng: StdRng,
}

impl HostSimulator {
    pub async fn new(
        server_addr: &str,
        settings: SimulationSettings,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        settings.validate()?;
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;
        let players = (0..settings.players).map(|_| Uuid::new_v4()).collect();

        Ok(HostSimulator {
            socket,
            server_addr,
            host_id: None,
            players,
            settings,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn host_id(&self) -> Option<u32> {
        self.host_id
    }

    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    /// Performs the handshake, failing if the tracker rejects or never answers
    pub async fn connect(&mut self) -> Result<u32, Box<dyn std::error::Error>> {
        info!("Connecting to tracker at {}...", self.server_addr);
        self.send_packet(&Packet::Hello {
            protocol_version: PROTOCOL_VERSION,
        })
        .await?;

        let mut buffer = [0u8; 2048];
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (len, _) = timeout(remaining, self.socket.recv_from(&mut buffer)).await??;

            match deserialize::<Packet>(&buffer[0..len]) {
                Ok(Packet::Welcome { host_id }) => {
                    info!("Connected! Host ID: {}", host_id);
                    self.host_id = Some(host_id);
                    return Ok(host_id);
                }
                Ok(Packet::Rejected { reason }) => {
                    return Err(format!("Rejected by tracker: {}", reason).into());
                }
                Ok(other) => warn!("Unexpected packet during handshake: {:?}", other),
                Err(e) => warn!("Failed to deserialize packet: {}", e),
            }
        }
    }

    fn handle_packet(&self, packet: Packet) {
        match packet {
            Packet::Tip { player, text } => match self.players.iter().position(|p| *p == player) {
                Some(index) => info!("player {:>2} | {}", index, text),
                None => warn!("Tip for unknown player {}", player),
            },
            Packet::Stats { player, cps, combo } => {
                info!("Stats for {}: {} cps, combo {}", player, cps, combo);
            }
            Packet::Rejected { reason } => warn!("Tracker rejected us: {}", reason),
            Packet::Welcome { .. } => {}
            _ => warn!("Unexpected packet type"),
        }
    }

    /// Sends one tick worth of swings and hits
    async fn send_tick(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let expected = self.settings.cps * TICK.as_secs_f64();
        let count = self.players.len();

        for attacker in 0..count {
            let swings = clicks_for_tick(expected, self.rng.gen());
            for _ in 0..swings {
                let player = self.players[attacker];
                self.send_packet(&Packet::InventoryTransaction {
                    player,
                    transaction_type: TRANSACTION_USE_ITEM_ON_ENTITY,
                })
                .await?;

                if !self.rng.gen_bool(self.settings.hit_chance) {
                    continue;
                }
                if let Some(victim) = pick_victim(count, attacker, self.rng.gen()) {
                    self.send_packet(&Packet::DamageByEntity {
                        attacker: Some(player),
                        victim: Some(self.players[victim]),
                        attacker_is_player: true,
                        victim_is_player: true,
                    })
                    .await?;
                }
            }
        }

        Ok(())
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.host_id.is_none() {
            self.connect().await?;
        }

        for player in self.players.clone() {
            self.send_packet(&Packet::PlayerJoined { player }).await?;
        }

        let mut input_interval = interval(TICK);
        input_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut stats_interval = interval(Duration::from_secs(1));
        let finished = sleep(self.settings.duration);
        tokio::pin!(finished);

        let mut buffer = [0u8; 2048];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => match deserialize::<Packet>(&buffer[0..len]) {
                            Ok(packet) => self.handle_packet(packet),
                            Err(e) => warn!("Failed to deserialize packet: {}", e),
                        },
                        Err(e) => warn!("Error receiving packet: {}", e),
                    }
                },

                _ = input_interval.tick() => {
                    self.send_tick().await?;
                },

                _ = stats_interval.tick() => {
                    // also keeps the tracker from timing us out
                    let packet = match self.players.first() {
                        Some(&player) => Packet::QueryStats { player },
                        None => Packet::Hello { protocol_version: PROTOCOL_VERSION },
                    };
                    self.send_packet(&packet).await?;
                },

                _ = &mut finished => break,
            }
        }

        for player in self.players.clone() {
            self.send_packet(&Packet::PlayerQuit { player }).await?;
        }
        self.send_packet(&Packet::Goodbye).await?;
        info!("Simulation finished");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clicks_for_tick_whole_and_fraction() {
        assert_eq!(clicks_for_tick(0.6, 0.5), 1);
        assert_eq!(clicks_for_tick(0.6, 0.7), 0);
        assert_eq!(clicks_for_tick(2.25, 0.1), 3);
        assert_eq!(clicks_for_tick(2.25, 0.9), 2);
        assert_eq!(clicks_for_tick(-1.0, 0.0), 0);
    }

    #[test]
    fn test_pick_victim_never_self() {
        assert_eq!(pick_victim(1, 0, 5), None);
        for attacker in 0..4 {
            for roll in 0..20 {
                let victim = pick_victim(4, attacker, roll).unwrap();
                assert_ne!(victim, attacker);
                assert!(victim < 4);
            }
        }
    }

    #[test]
    fn test_settings_reject_unusable_values() {
        let settings = SimulationSettings {
            players: 2,
            cps: 8.0,
            hit_chance: 0.4,
            duration: Duration::from_secs(1),
        };
        assert!(settings.validate().is_ok());

        for hit_chance in [f64::NAN, -0.1, 1.5, f64::INFINITY] {
            let bad = SimulationSettings {
                hit_chance,
                ..settings.clone()
            };
            assert!(bad.validate().is_err(), "hit chance {}", hit_chance);
        }
        for cps in [f64::NAN, -1.0, f64::INFINITY] {
            let bad = SimulationSettings {
                cps,
                ..settings.clone()
            };
            assert!(bad.validate().is_err(), "cps {}", cps);
        }
    }

    #[tokio::test]
    async fn test_new_rejects_nan_hit_chance() {
        let settings = SimulationSettings {
            players: 1,
            cps: 1.0,
            hit_chance: f64::NAN,
            duration: Duration::from_millis(10),
        };

        let err = HostSimulator::new("127.0.0.1:19133", settings)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("hit chance"));
    }

    #[tokio::test]
    async fn test_connect_accepts_welcome() {
        let tracker = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let tracker_addr = tracker.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            if let Ok((len, addr)) = tracker.recv_from(&mut buf).await {
                if let Ok(Packet::Hello { .. }) = deserialize::<Packet>(&buf[..len]) {
                    let reply = serialize(&Packet::Welcome { host_id: 3 }).unwrap();
                    let _ = tracker.send_to(&reply, addr).await;
                }
            }
        });

        let settings = SimulationSettings {
            players: 2,
            cps: 10.0,
            hit_chance: 0.5,
            duration: Duration::from_millis(10),
        };
        let mut host = HostSimulator::new(&tracker_addr.to_string(), settings)
            .await
            .unwrap();

        assert_eq!(host.connect().await.unwrap(), 3);
        assert_eq!(host.host_id(), Some(3));
        assert_eq!(host.players().len(), 2);
    }

    #[tokio::test]
    async fn test_connect_reports_rejection() {
        let tracker = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let tracker_addr = tracker.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 2048];
            if let Ok((_, addr)) = tracker.recv_from(&mut buf).await {
                let reply = serialize(&Packet::Rejected {
                    reason: "Tracker full".to_string(),
                })
                .unwrap();
                let _ = tracker.send_to(&reply, addr).await;
            }
        });

        let settings = SimulationSettings {
            players: 1,
            cps: 1.0,
            hit_chance: 0.0,
            duration: Duration::from_millis(10),
        };
        let mut host = HostSimulator::new(&tracker_addr.to_string(), settings)
            .await
            .unwrap();

        let err = host.connect().await.unwrap_err();
        assert!(err.to_string().contains("Tracker full"));
    }
}
