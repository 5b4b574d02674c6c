use clap::Parser;
use cps_server::config::TrackerConfig;
use cps_server::network::{Server, ServerMessage};
use cps_server::BoxError;
use log::{error, info};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// UDP port host bridges connect to
    #[arg(short, long, default_value = "19133")]
    port: u16,

    /// Path of the TOML config file
    #[arg(short, long, default_value = "cps-tracker.toml")]
    config: PathBuf,

    /// Override the sweep period from the config file
    #[arg(short, long)]
    sweep_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let mut config = TrackerConfig::load_from(&args.config);
    if let Some(sweep_interval_ms) = args.sweep_interval_ms {
        config.sweep_interval_ms = sweep_interval_ms;
        config.validate();
    }

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, &config).await?;
    let control = server.control();

    let server_handle = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = server_handle => {
            match result {
                Ok(Err(e)) => error!("Tracker stopped with error: {}", e),
                Err(e) => error!("Tracker task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            let _ = control.send(ServerMessage::Shutdown);
        }
    }

    Ok(())
}
