use clap::Parser;
use cps_client::network::{HostSimulator, SimulationSettings};
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Tracker address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:19133")]
    server: String,

    /// Number of simulated players
    #[arg(short = 'p', long, default_value = "4")]
    players: usize,

    /// Average clicks per second per player
    #[arg(short = 'c', long, default_value = "8.0")]
    cps: f64,

    /// Chance that a click hits another player
    #[arg(long, default_value = "0.4")]
    hit_chance: f64,

    /// How long to run before every player quits
    #[arg(short = 'd', long, default_value = "30")]
    duration_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting simulated host...");
    info!(
        "{} players at ~{} cps for {}s",
        args.players, args.cps, args.duration_secs
    );

    let settings = SimulationSettings {
        players: args.players,
        cps: args.cps,
        hit_chance: args.hit_chance,
        duration: Duration::from_secs(args.duration_secs),
    };

    let mut host = HostSimulator::new(&args.server, settings).await?;
    host.run().await?;

    Ok(())
}
