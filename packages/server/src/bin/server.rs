//! Room relay server for synchronized playback.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tandem-server
//! cargo run --bin tandem-server -- --host 0.0.0.0 --port 3000 --media-list media.json
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;

use tandem_server::{
    infrastructure::{
        media::StaticMediaCatalog, message_pusher::WebSocketMessagePusher,
        repository::InMemoryRoomRepository,
    },
    ui::Server,
    usecase::{
        GetMediaListUseCase, GetReferenceTimeUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
        JoinRoomUseCase, LeaveRoomUseCase, RelayMessageUseCase,
    },
};
use tandem_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "tandem-server")]
#[command(about = "Room relay server for synchronized video playback", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TANDEM_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TANDEM_PORT", default_value = "8080")]
    port: u16,

    /// JSON file with the media list served to every room
    #[arg(short = 'm', long, env = "TANDEM_MEDIA_LIST")]
    media_list: Option<PathBuf>,

    /// Seconds without any frame after which a connection is dropped
    #[arg(long, env = "TANDEM_IDLE_TIMEOUT", default_value_t = 3.0)]
    idle_timeout: f64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let idle_timeout = match Duration::try_from_secs_f64(args.idle_timeout) {
        Ok(timeout) if !timeout.is_zero() => timeout,
        _ => {
            tracing::error!("--idle-timeout must be a positive number of seconds");
            std::process::exit(1);
        }
    };

    // Initialize dependencies in order:
    // 1. Repository
    // 2. MessagePusher
    // 3. MediaCatalog
    // 4. UseCases
    // 5. Server

    // 1. Create Repository (in-memory membership table)
    let repository = Arc::new(InMemoryRoomRepository::new());

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Load the media list
    let catalog = match &args.media_list {
        Some(path) => match StaticMediaCatalog::from_json_file(path) {
            Ok(catalog) => {
                tracing::info!("Loaded {} media item(s) from {}", catalog.len(), path.display());
                catalog
            }
            Err(e) => {
                tracing::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("No media list given; rooms will have an empty media list");
            StaticMediaCatalog::empty()
        }
    };

    // 4. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(
        repository.clone(),
        message_pusher.clone(),
    ));
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(repository.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository.clone()));
    let get_media_list_usecase = Arc::new(GetMediaListUseCase::new(Arc::new(catalog)));
    let get_reference_time_usecase = Arc::new(GetReferenceTimeUseCase::new(Arc::new(SystemClock)));

    // 5. Create and run the server
    let server = Server::new(
        join_room_usecase,
        leave_room_usecase,
        relay_message_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        get_media_list_usecase,
        get_reference_time_usecase,
    )
    .with_idle_timeout(idle_timeout);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
