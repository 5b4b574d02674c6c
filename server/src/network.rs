//! Server network layer bridging game hosts to the tracker over UDP

use crate::config::TrackerConfig;
use crate::events::{EventHandler, HostEvent};
use crate::registry::PlayerRegistry;
use crate::sweeper::Sweeper;
use crate::BoxError;
use bincode::{deserialize, serialize};
use cps_shared::{now_millis, Packet, PlayerId, PROTOCOL_VERSION};
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    CheckHostTimeouts,
    Shutdown,
}

/// Messages queued for the network sender task
#[derive(Debug)]
pub enum OutboundMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// A registered host bridge and the players it has joined
#[derive(Debug)]
struct Host {
    id: u32,
    last_seen: u64,
    players: HashSet<PlayerId>,
}

/// Tracker server: receives host events, answers with tips and stats, and
/// keeps the decay sweep running alongside
pub struct Server {
    socket: Arc<UdpSocket>,
    events: EventHandler,
    sweep_period: Duration,

    // Registered host bridges by address
    hosts: HashMap<SocketAddr, Host>,
    next_host_id: u32,
    max_hosts: usize,
    host_timeout: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    out_rx: Option<mpsc::UnboundedReceiver<OutboundMessage>>,
}

impl Server {
    pub async fn new(addr: &str, config: &TrackerConfig) -> Result<Self, BoxError> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Tracker listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let registry = Arc::new(PlayerRegistry::new());

        Ok(Server {
            socket,
            events: EventHandler::new(registry, config.tip_formatter()),
            sweep_period: config.sweep_interval(),
            hosts: HashMap::new(),
            next_host_id: 1,
            max_hosts: config.max_hosts,
            host_timeout: config.host_timeout(),
            server_tx,
            server_rx,
            out_tx,
            out_rx: Some(out_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn registry(&self) -> Arc<PlayerRegistry> {
        Arc::clone(self.events.registry())
    }

    /// Sender that can stop [`Server::run`] with [`ServerMessage::Shutdown`]
    pub fn control(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) -> JoinHandle<()> {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Spawns task that drains the outgoing packet queue
    fn spawn_network_sender(&mut self) -> Option<JoinHandle<()>> {
        let socket = Arc::clone(&self.socket);
        let mut out_rx = self.out_rx.take()?;

        Some(tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                match message {
                    OutboundMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                }
            }
        }))
    }

    /// Spawns task that periodically asks the main loop to drop silent hosts
    fn spawn_timeout_checker(&self) -> JoinHandle<()> {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                if let Err(e) = server_tx.send(ServerMessage::CheckHostTimeouts) {
                    error!("Failed to send timeout check: {}", e);
                    break;
                }
            }
        })
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), BoxError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self
            .out_tx
            .send(OutboundMessage::SendPacket { packet, addr })
        {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Registers a host bridge, or tells it why it cannot connect
    fn handle_hello(&mut self, protocol_version: u32, addr: SocketAddr, now: u64) -> Packet {
        if protocol_version != PROTOCOL_VERSION {
            warn!(
                "Host at {} speaks protocol {}, expected {}",
                addr, protocol_version, PROTOCOL_VERSION
            );
            return Packet::Rejected {
                reason: "Protocol version mismatch".to_string(),
            };
        }

        if let Some(host) = self.hosts.get_mut(&addr) {
            host.last_seen = now;
            return Packet::Welcome { host_id: host.id };
        }

        if self.hosts.len() >= self.max_hosts {
            return Packet::Rejected {
                reason: "Tracker full".to_string(),
            };
        }

        let host_id = self.next_host_id;
        self.next_host_id += 1;
        self.hosts.insert(
            addr,
            Host {
                id: host_id,
                last_seen: now,
                players: HashSet::new(),
            },
        );
        info!("Host {} connected from {}", host_id, addr);

        Packet::Welcome { host_id }
    }

    /// Unregisters a host and quits every player it joined
    fn remove_host(&mut self, addr: SocketAddr, reason: &str) -> Option<u32> {
        let host = self.hosts.remove(&addr)?;
        let registry = self.events.registry();
        for player in &host.players {
            registry.quit(player);
        }

        info!(
            "Host {} at {} {}, released {} players",
            host.id,
            addr,
            reason,
            host.players.len()
        );
        Some(host.id)
    }

    /// Drops hosts that have been silent for longer than the host timeout
    fn expire_hosts(&mut self, now: u64) -> Vec<u32> {
        let timeout_ms = self.host_timeout.as_millis() as u64;
        let silent: Vec<SocketAddr> = self
            .hosts
            .iter()
            .filter(|(_, host)| now.saturating_sub(host.last_seen) > timeout_ms)
            .map(|(addr, _)| *addr)
            .collect();

        silent
            .into_iter()
            .filter_map(|addr| self.remove_host(addr, "timed out"))
            .collect()
    }

    /// Processes one incoming packet and queues the reply, if any
    fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Hello { protocol_version } => {
                let reply = self.handle_hello(protocol_version, addr, now_millis());
                self.send_packet(reply, addr);
            }

            Packet::Goodbye => {
                if self.remove_host(addr, "disconnected").is_none() {
                    warn!("Goodbye from unregistered host at {}", addr);
                }
            }

            Packet::Welcome { .. }
            | Packet::Rejected { .. }
            | Packet::Tip { .. }
            | Packet::Stats { .. } => {
                warn!("Unexpected packet type from {}", addr);
            }

            packet => {
                let now = now_millis();
                let host = match self.hosts.get_mut(&addr) {
                    Some(host) => host,
                    None => {
                        warn!("Dropping event from unregistered host at {}", addr);
                        return;
                    }
                };
                host.last_seen = now;

                let event = match HostEvent::from_packet(packet, now) {
                    Some(event) => event,
                    None => return,
                };
                match &event {
                    HostEvent::PlayerJoined(player) => {
                        host.players.insert(*player);
                    }
                    HostEvent::PlayerQuit(player) => {
                        host.players.remove(player);
                    }
                    _ => {}
                }

                if let Some(reply) = self.events.handle(event, now) {
                    self.send_packet(reply, addr);
                }
            }
        }
    }

    /// Main server loop: network tasks and the sweeper run alongside it
    pub async fn run(&mut self) -> Result<(), BoxError> {
        let receiver = self.spawn_network_receiver();
        let sender = self.spawn_network_sender();
        let timeout_checker = self.spawn_timeout_checker();
        let sweeper = Sweeper::new(self.registry(), self.sweep_period).spawn();

        info!(
            "Tracker started, sweeping every {}ms",
            self.sweep_period.as_millis()
        );

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::PacketReceived { packet, addr } => {
                    self.handle_packet(packet, addr);
                }
                ServerMessage::CheckHostTimeouts => {
                    self.expire_hosts(now_millis());
                }
                ServerMessage::Shutdown => {
                    info!("Tracker shutting down");
                    break;
                }
            }
        }

        sweeper.abort();
        timeout_checker.abort();
        receiver.abort();
        if let Some(sender) = sender {
            sender.abort();
        }

        Ok(())
    }
}
