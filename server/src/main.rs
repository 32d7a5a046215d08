use clap::Parser;
use log::{error, info};
use server::network::{Server, ServerConfig};
use server::port_allocator::PortAllocator;
use server::registry::Registry;
use std::sync::Arc;
use std::time::Duration;

/// UDP state-synchronization server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to bind the server socket to
    #[clap(default_value = "127.0.0.1:9000")]
    addr: String,
    /// Lowest port handed out to registering clients
    #[clap(long, default_value = "9001")]
    min_port: u16,
    /// Highest port handed out to registering clients
    #[clap(long, default_value = "9255")]
    max_port: u16,
    /// Seconds of silence before a client is reclaimed
    #[clap(long, default_value = "60")]
    idle_timeout: u64,
    /// Seconds between idle sweeps
    #[clap(long, default_value = "30")]
    sweep_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let registry = Arc::new(Registry::new(PortAllocator::new(
        args.min_port,
        args.max_port,
    )));
    let config = ServerConfig {
        idle_timeout: Duration::from_secs(args.idle_timeout),
        sweep_interval: Duration::from_secs(args.sweep_interval),
        ..ServerConfig::default()
    };

    let server = Server::bind(&args.addr, registry, config).await?;

    // Shutdown simply closes the socket; in-flight handlers are not drained.
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("server loop failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal, closing socket");
        }
    }

    Ok(())
}
