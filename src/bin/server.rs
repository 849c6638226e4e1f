use std::time::Duration;

use clap::Parser;
use log::{error, info};

use checkers_engine::server::{Server, ServerConfig};

/// Checkers matchmaking server.
///
/// Pairs connecting clients two at a time and drives each match to
/// completion over the length-prefixed JSON protocol.
#[derive(Parser, Debug)]
struct Args {
    /// TCP port to listen on.
    #[arg(short, long, default_value_t = 2004)]
    port: u16,

    /// Per-socket timeout in seconds: how long a client has to respond
    /// before the server synthesises a random move on their behalf.
    #[arg(short, long, default_value_t = 1.5)]
    timeout: f64,

    /// Board size (N x N). Must be even and at least 4.
    #[arg(short, long, default_value_t = 8)]
    board_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let server = Server::bind(ServerConfig {
        port: args.port,
        per_socket_timeout: Duration::from_secs_f64(args.timeout),
        board_size: args.board_size,
    })?;

    let shutdown = server.shutdown_flag();
    ctrlc::set_handler(move || {
        info!("received interrupt, shutting down");
        shutdown.store(true, std::sync::atomic::Ordering::SeqCst);
    })
    .map_err(|e| {
        error!("failed to install signal handler: {e}");
        e
    })?;

    server.run();
    server.shutdown();
    Ok(())
}
