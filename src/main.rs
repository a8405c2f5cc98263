use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobcast::agent;
use jobcast::config::{AgentConfig, CoordinatorConfig, DEFAULT_PORT};
use jobcast::coordinator::Coordinator;
use jobcast::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "jobcast")]
#[command(about = "A simple job distribution system", version)]
struct Args {
    /// Run as the coordinator
    #[arg(short = 's', long, conflicts_with = "client")]
    server: bool,

    /// Run as a worker agent, connecting to the given url
    #[arg(short = 'c', long, value_name = "URL")]
    client: Option<String>,

    /// Port the coordinator binds
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Serve jobs from the given text file (coordinator only)
    #[arg(short = 't', long, value_name = "FILE")]
    txtfile: Option<PathBuf>,

    /// Launch remote workers listed in the given file (coordinator only)
    #[arg(short = 'w', long, value_name = "FILE")]
    workerfile: Option<PathBuf>,

    /// Enable debug output
    #[arg(short = 'd', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if args.server {
        let config = CoordinatorConfig {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], args.port)),
            batch_file: args.txtfile,
            worker_file: args.workerfile,
        };
        let shutdown = install_shutdown_handler();
        let (coordinator, _handle) = Coordinator::bind(config, shutdown).await?;
        coordinator.run().await?;
    } else if let Some(url) = args.client {
        agent::run(AgentConfig { url }).await?;
    } else {
        eprintln!("Run with --server or --client <url>");
        std::process::exit(2);
    }

    Ok(())
}
