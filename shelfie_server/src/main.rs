use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use shelfie_server::{default_goals, load_goals, Server, ServerConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Address to listen on for clients speaking newline-delimited JSON
    #[arg(short, long, default_value = "127.0.0.1:4270")]
    address: String,

    /// Path to a JSON file with the pool of common goals
    #[arg(short, long)]
    goals: Option<PathBuf>,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds between two heartbeats to an idle client
    #[arg(long, default_value_t = 2000)]
    heartbeat_ms: u64,

    /// Milliseconds of silence after which a client counts as crashed
    #[arg(long, default_value_t = 10000)]
    timeout_ms: u64,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    // Get a random seed
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed);

    let goals = match &args.goals {
        Some(path) => load_goals(path)?,
        None => default_goals(),
    };
    info!(num_goals = goals.len(), "Loaded common goals");

    let config = ServerConfig {
        heartbeat_interval: Duration::from_millis(args.heartbeat_ms),
        liveness_timeout: Duration::from_millis(args.timeout_ms),
        goals,
        seed,
    };
    anyhow::ensure!(
        config.heartbeat_interval < config.liveness_timeout,
        "The heartbeat interval must be shorter than the timeout"
    );

    let (server, shutdown) = Server::new(config);
    let listener = TcpListener::bind(&args.address).await?;
    let serving = tokio::spawn(server.serve(listener));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    shutdown.send(true)?;
    serving.await??;

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().event_format(format))
        .with(filter)
        .init();
}
