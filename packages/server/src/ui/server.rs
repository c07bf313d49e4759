//! Server execution logic.

use std::{sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::usecase::{
    GetMediaListUseCase, GetReferenceTimeUseCase, GetRoomDetailUseCase, GetRoomsUseCase,
    JoinRoomUseCase, LeaveRoomUseCase, RelayMessageUseCase,
};

use super::{
    handler::{
        get_media_list, get_reference_time, get_room_detail, get_rooms, health_check,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Three client heartbeat intervals
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3);

/// Room relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     join_room_usecase,
///     leave_room_usecase,
///     relay_message_usecase,
///     get_rooms_usecase,
///     get_room_detail_usecase,
///     get_media_list_usecase,
///     get_reference_time_usecase,
/// )
/// .with_idle_timeout(Duration::from_secs(3));
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        relay_message_usecase: Arc<RelayMessageUseCase>,
        get_rooms_usecase: Arc<GetRoomsUseCase>,
        get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
        get_media_list_usecase: Arc<GetMediaListUseCase>,
        get_reference_time_usecase: Arc<GetReferenceTimeUseCase>,
    ) -> Self {
        Self {
            state: AppState {
                join_room_usecase,
                leave_room_usecase,
                relay_message_usecase,
                get_rooms_usecase,
                get_room_detail_usecase,
                get_media_list_usecase,
                get_reference_time_usecase,
                idle_timeout: DEFAULT_IDLE_TIMEOUT,
            },
        }
    }

    /// Close connections that send nothing for `idle_timeout`
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.state.idle_timeout = idle_timeout;
        self
    }

    /// Build the router without binding a socket
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/api/v1/rooms/{room_id}/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/v1/rooms/{room_id}/media", get(get_media_list))
            .route("/api/v1/clock", get(get_reference_time))
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self.state.clone()))
    }

    /// Run the relay server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Relay server listening on {}", local_addr);
        tracing::info!("Rooms: ws://{}/api/v1/rooms/{{room_id}}/ws", local_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
