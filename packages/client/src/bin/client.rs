//! Console client for a Tandem room.
//!
//! Joins a room, keeps a simulated player in sync with the other participants
//! and lets you act on it from a prompt (`play`, `pause`, `seek 30`, `buffer`,
//! ...). A duplicate participant id is rejected by the server and ends the
//! client; other disconnections are retried.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-client -- --room movie-night
//! cargo run --bin tandem-client -- -r movie-night -p alice -u http://127.0.0.1:8080
//! ```

use clap::Parser;

use tandem_client::config::ClientConfig;
use tandem_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tandem-client")]
#[command(about = "Synchronized playback client for a Tandem room", long_about = None)]
struct Args {
    /// Room to join
    #[arg(short = 'r', long, env = "TANDEM_ROOM")]
    room: String,

    /// Participant ID (must be unique in the room; random if omitted)
    #[arg(short = 'p', long, env = "TANDEM_PARTICIPANT_ID")]
    participant_id: Option<String>,

    /// Relay server base URL
    #[arg(
        short = 'u',
        long,
        env = "TANDEM_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    url: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let participant_id = args
        .participant_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let config = match ClientConfig::new(args.url, args.room, participant_id) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = tandem_client::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
