//! Sync engine actor.
//!
//! One tokio task owns the synchronizer, the silenced player and the
//! reconciler. Timers, probe results, element events, transport events and
//! control commands are multiplexed by a single `select!` loop; each handler
//! runs to completion before the next branch is polled, so a snapshot is never
//! settled and mutated by two handlers at once.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};

use tandem_shared::{
    protocol::WireMessage,
    time::{Clock, SystemClock},
};

use crate::{
    clock::{HttpReferenceTimeSource, LogicalClock, ProbeSample, ReferenceTimeSource, probe},
    config::ClientConfig,
    domain::{is_own_stale_session, should_attempt_reconnect},
    error::{ClientError, ClockSyncError},
    media::{MediaItem, lookup},
    peers::PeerStatus,
    player::{MediaElement, MediaEvent, PlayerStatus, SilencedPlayer, UserIntent},
    reconcile::{Correction, PlayerReconciler},
    session::{Connection, TransportEvent},
    synchronizer::{ClientSynchronizer, TargetState},
};

/// Control messages from the UI
#[derive(Debug)]
pub enum EngineCommand {
    SetMediaIndex(u32),
    Status(oneshot::Sender<StatusReport>),
    Shutdown,
}

/// Notifications for the UI
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ClockSynced {
        offset: f64,
    },
    Connected,
    Disconnected {
        reason: String,
        /// `None` when no reconnect will follow
        retry_in: Option<Duration>,
    },
    RoomConnected {
        participant_id: String,
        participants: Vec<String>,
    },
    PeerJoined(String),
    PeerLeft(String),
    WaitingChanged(bool),
    MediaChanged {
        index: u32,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub participant_id: String,
    pub connected: bool,
    pub synced: bool,
    pub offset: f64,
    pub target: TargetState,
    pub player: PlayerStatus,
    pub media_index: Option<u32>,
    pub waiting: bool,
    pub buffering: bool,
    pub peers: Vec<(String, PeerStatus)>,
}

/// Handle to a running engine
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    task: JoinHandle<Result<(), ClientError>>,
}

impl EngineHandle {
    pub fn set_media_index(&self, index: u32) -> Result<(), ClientError> {
        self.send(EngineCommand::SetMediaIndex(index))
    }

    pub async fn status(&self) -> Result<StatusReport, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::Status(tx))?;
        rx.await
            .map_err(|_| ClientError::ConnectionError("Engine stopped".to_string()))
    }

    /// Wait until the engine stops on its own (fatal error)
    pub async fn wait(&mut self) -> Result<(), ClientError> {
        join_result(&mut self.task).await
    }

    /// Stop the engine and wait for its teardown
    pub async fn shutdown(mut self) -> Result<(), ClientError> {
        if self.task.is_finished() {
            return join_result(&mut self.task).await;
        }
        // A send error means the engine already returned
        let _ = self.commands.send(EngineCommand::Shutdown);
        join_result(&mut self.task).await
    }

    fn send(&self, command: EngineCommand) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .map_err(|_| ClientError::ConnectionError("Engine stopped".to_string()))
    }
}

async fn join_result(task: &mut JoinHandle<Result<(), ClientError>>) -> Result<(), ClientError> {
    match task.await {
        Ok(result) => result,
        Err(e) => Err(ClientError::ConnectionError(format!(
            "Engine task failed: {}",
            e
        ))),
    }
}

pub struct SyncEngine<E: MediaElement> {
    config: ClientConfig,
    local_clock: Arc<dyn Clock>,
    reference: Arc<dyn ReferenceTimeSource>,
    synchronizer: ClientSynchronizer,
    player: SilencedPlayer<E>,
    reconciler: PlayerReconciler,
    media: Vec<MediaItem>,
    /// Last media index reported as missing from the list
    unavailable_media: Option<u32>,
    connection: Option<Connection>,
    connected: bool,
    /// Set by the first successful connection
    has_connected: bool,
    generation: u64,
    reconnect_attempt: u32,
    reconnect_task: Option<JoinHandle<()>>,
    probe_task: Option<JoinHandle<()>>,
    probe_tx: mpsc::UnboundedSender<Result<ProbeSample, ClockSyncError>>,
    probe_rx: mpsc::UnboundedReceiver<Result<ProbeSample, ClockSyncError>>,
    transport_tx: mpsc::UnboundedSender<TransportEvent>,
    transport_rx: mpsc::UnboundedReceiver<TransportEvent>,
    element_events: mpsc::UnboundedReceiver<MediaEvent>,
    notifications: mpsc::UnboundedSender<EngineEvent>,
    notifications_rx: Option<mpsc::UnboundedReceiver<EngineEvent>>,
}

impl<E: MediaElement> SyncEngine<E> {
    /// An engine on the system clock, probing the server's clock endpoint
    pub fn new(
        config: ClientConfig,
        element: E,
        element_events: mpsc::UnboundedReceiver<MediaEvent>,
    ) -> Self {
        let local_clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let reference: Arc<dyn ReferenceTimeSource> = Arc::new(HttpReferenceTimeSource::new(
            reqwest::Client::new(),
            config.clock_url(),
        ));
        let (probe_tx, probe_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (notifications, notifications_rx) = mpsc::unbounded_channel();

        Self {
            synchronizer: ClientSynchronizer::new(
                config.participant_id.clone(),
                LogicalClock::new(local_clock.clone()),
            ),
            player: SilencedPlayer::new(element, config.pending_command_ttl),
            reconciler: PlayerReconciler::new(config.tolerance),
            config,
            local_clock,
            reference,
            media: Vec::new(),
            unavailable_media: None,
            connection: None,
            connected: false,
            has_connected: false,
            generation: 0,
            reconnect_attempt: 0,
            reconnect_task: None,
            probe_task: None,
            probe_tx,
            probe_rx,
            transport_tx,
            transport_rx,
            element_events,
            notifications,
            notifications_rx: Some(notifications_rx),
        }
    }

    pub fn with_media(mut self, media: Vec<MediaItem>) -> Self {
        self.media = media;
        self
    }

    pub fn with_reference(mut self, reference: Arc<dyn ReferenceTimeSource>) -> Self {
        self.reference = reference;
        self
    }

    /// Start the engine task
    pub fn spawn(mut self) -> (EngineHandle, mpsc::UnboundedReceiver<EngineEvent>) {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let notifications_rx = match self.notifications_rx.take() {
            Some(rx) => rx,
            None => mpsc::unbounded_channel().1,
        };
        let task = tokio::spawn(self.run(commands_rx));
        (EngineHandle { commands, task }, notifications_rx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    ) -> Result<(), ClientError> {
        let mut clock_tick = interval(self.config.clock_sync_interval);
        let mut heartbeat_tick = interval(self.config.heartbeat_interval);
        let mut reconcile_tick = interval(self.config.reconcile_interval);
        for tick in [&mut clock_tick, &mut heartbeat_tick, &mut reconcile_tick] {
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        tracing::info!(
            "Sync engine started for '{}' in room '{}'",
            self.config.participant_id,
            self.config.room_id
        );
        self.connect();

        let result = loop {
            tokio::select! {
                _ = clock_tick.tick() => self.start_probe(),
                Some(result) = self.probe_rx.recv() => self.on_probe(result),
                _ = heartbeat_tick.tick() => self.send_heartbeat(),
                _ = reconcile_tick.tick() => self.reconcile(),
                Some(event) = self.element_events.recv() => self.on_element_event(event),
                Some(event) = self.transport_rx.recv() => {
                    if let Err(e) = self.on_transport(event) {
                        break Err(e);
                    }
                }
                command = commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break Ok(()),
                    Some(command) => self.on_command(command),
                },
            }
        };

        self.teardown();
        result
    }

    fn connect(&mut self) {
        self.generation += 1;
        self.connected = false;
        self.connection = Some(Connection::open(
            self.config.ws_url(),
            self.config.participant_id.clone(),
            self.generation,
            self.transport_tx.clone(),
        ));
    }

    fn start_probe(&mut self) {
        if self
            .probe_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            tracing::debug!("Clock probe still in flight; skipping tick");
            return;
        }
        let local = self.local_clock.clone();
        let reference = self.reference.clone();
        let tx = self.probe_tx.clone();
        self.probe_task = Some(tokio::spawn(async move {
            let result = probe(local.as_ref(), reference.as_ref()).await;
            let _ = tx.send(result);
        }));
    }

    fn on_probe(&mut self, result: Result<ProbeSample, ClockSyncError>) {
        match result {
            Ok(sample) => {
                let outcome = self.synchronizer.clock_mut().record_probe(sample);
                if outcome.first_sync {
                    tracing::info!("Clock synced (offset {:.4}s)", outcome.offset);
                    self.notify(EngineEvent::ClockSynced {
                        offset: outcome.offset,
                    });
                }
            }
            Err(e) => tracing::warn!("Clock probe failed, keeping previous offset: {}", e),
        }
    }

    fn send_heartbeat(&self) {
        if self.connected {
            self.publish(WireMessage::Heartbeat);
        }
    }

    fn reconcile(&mut self) {
        if !self.synchronizer.is_ready() {
            return;
        }
        let target = self.synchronizer.target_state();
        let status = self.player.status();
        let local_index = self.effective_media_index(target.media_index);

        for correction in self.reconciler.plan(&status, local_index, &target) {
            match correction {
                Correction::SwapSource { index } => self.swap_source(index),
                Correction::StartWaiting => {
                    tracing::info!("Waiting for a buffering peer");
                    self.notify(EngineEvent::WaitingChanged(true));
                }
                Correction::StopWaiting => {
                    tracing::info!("No peer is buffering any more");
                    self.notify(EngineEvent::WaitingChanged(false));
                }
                Correction::Pause => self.player.silent_pause(),
                Correction::Play => self.player.silent_play(),
                Correction::Seek(time) => {
                    tracing::debug!(
                        "Seeking from {:.3}s to {:.3}s",
                        status.current_time,
                        time
                    );
                    self.player.silent_seek(time);
                }
            }
        }
    }

    /// The loaded index, or the target itself when the target has no source
    fn effective_media_index(&mut self, target_index: u32) -> Option<u32> {
        let loaded = self.player.media_index();
        if loaded == Some(target_index) || lookup(&self.media, target_index).is_some() {
            return loaded;
        }
        if self.unavailable_media != Some(target_index) {
            tracing::warn!(
                "Media index {} is not in the media list; keeping the current source",
                target_index
            );
            self.unavailable_media = Some(target_index);
        }
        Some(target_index)
    }

    fn swap_source(&mut self, index: u32) {
        let Some(item) = lookup(&self.media, index).cloned() else {
            return;
        };
        tracing::info!("Loading media {} '{}' ({})", index, item.name, item.source);
        self.player.swap_source(index, &item.source);
        self.unavailable_media = None;
        self.notify(EngineEvent::MediaChanged {
            index,
            name: item.name,
        });
    }

    fn on_element_event(&mut self, event: MediaEvent) {
        let Some(intent) = self.player.observe(event) else {
            return;
        };
        tracing::debug!("User intent: {:?}", intent);
        let message = match intent {
            UserIntent::Play => self.synchronizer.play(),
            UserIntent::Pause => self.synchronizer.pause(),
            UserIntent::Seek(time) => self.synchronizer.seek(time),
            UserIntent::StartBuffering => self.synchronizer.start_buffering(),
            UserIntent::StopBuffering => self.synchronizer.stop_buffering(),
        };
        if let Some(message) = message {
            self.publish(message);
        }
    }

    fn on_transport(&mut self, event: TransportEvent) -> Result<(), ClientError> {
        if event.generation() != self.generation {
            tracing::debug!(
                "Ignoring event from stale connection #{}",
                event.generation()
            );
            return Ok(());
        }

        match event {
            TransportEvent::Connected { .. } => {
                self.connected = true;
                self.has_connected = true;
                self.reconnect_attempt = 0;
                self.notify(EngineEvent::Connected);
                Ok(())
            }
            TransportEvent::Message { message, .. } => {
                self.on_message(message);
                Ok(())
            }
            TransportEvent::Closed { reason, .. } => {
                self.schedule_reconnect(ClientError::ConnectionError(reason))
            }
            TransportEvent::ConnectFailed { error, .. } => {
                if is_own_stale_session(&error, self.has_connected) {
                    tracing::warn!(
                        "The relay still holds the previous session of '{}'; retrying",
                        self.config.participant_id
                    );
                    return self.schedule_reconnect(ClientError::ConnectionError(format!(
                        "{} (previous session not yet released)",
                        error
                    )));
                }
                self.schedule_reconnect(error)
            }
            TransportEvent::RetryDue { .. } => {
                self.reconnect_task = None;
                tracing::info!(
                    "Reconnecting as '{}' (attempt {})",
                    self.config.participant_id,
                    self.reconnect_attempt
                );
                self.connect();
                Ok(())
            }
        }
    }

    fn on_message(&mut self, message: WireMessage) {
        match &message {
            WireMessage::RoomConnected(connected) => {
                self.notify(EngineEvent::RoomConnected {
                    participant_id: connected.participant_id.clone(),
                    participants: connected.participants.clone(),
                });
            }
            WireMessage::Join(event) if event.participant_id != self.config.participant_id => {
                self.notify(EngineEvent::PeerJoined(event.participant_id.clone()));
            }
            WireMessage::Leave(event) => {
                self.notify(EngineEvent::PeerLeft(event.participant_id.clone()));
            }
            _ => {}
        }

        if let Some(reply) = self.synchronizer.handle_message(&message) {
            self.publish(reply);
        }
    }

    fn schedule_reconnect(&mut self, error: ClientError) -> Result<(), ClientError> {
        self.connected = false;
        self.connection = None;
        let reason = error.to_string();

        if !should_attempt_reconnect(
            &error,
            self.reconnect_attempt,
            self.config.max_reconnect_attempts,
        ) {
            tracing::error!("Giving up on the connection: {}", reason);
            self.notify(EngineEvent::Disconnected {
                reason,
                retry_in: None,
            });
            return Err(error);
        }

        self.reconnect_attempt += 1;
        let backoff = self.config.reconnect_backoff;
        tracing::warn!(
            "Disconnected ({}); reconnecting in {:?} (attempt {})",
            reason,
            backoff,
            self.reconnect_attempt
        );
        self.notify(EngineEvent::Disconnected {
            reason,
            retry_in: Some(backoff),
        });

        let tx = self.transport_tx.clone();
        let generation = self.generation;
        self.reconnect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(backoff).await;
            let _ = tx.send(TransportEvent::RetryDue { generation });
        }));
        Ok(())
    }

    fn on_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::SetMediaIndex(index) => {
                if let Some(message) = self.synchronizer.set_media_index(index) {
                    self.publish(message);
                }
            }
            EngineCommand::Status(reply) => {
                let _ = reply.send(self.status_report());
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn status_report(&self) -> StatusReport {
        StatusReport {
            participant_id: self.config.participant_id.clone(),
            connected: self.connected,
            synced: self.synchronizer.is_ready(),
            offset: self.synchronizer.clock().offset(),
            target: self.synchronizer.target_state(),
            player: self.player.status(),
            media_index: self.player.media_index(),
            waiting: self.reconciler.is_waiting(),
            buffering: self.synchronizer.is_buffering(),
            peers: self.synchronizer.peers().entries(),
        }
    }

    /// Send to the room; dropped while disconnected (the snapshot is
    /// re-asserted after the next `room-connected`)
    fn publish(&self, message: WireMessage) {
        match &self.connection {
            Some(connection) if self.connected => {
                if !connection.send(&message) {
                    tracing::debug!("Session ended; dropped {} message", message.kind());
                }
            }
            _ => tracing::debug!("Not connected; dropped {} message", message.kind()),
        }
    }

    fn notify(&self, event: EngineEvent) {
        // The UI may have stopped listening
        let _ = self.notifications.send(event);
    }

    fn teardown(&mut self) {
        if let Some(task) = self.probe_task.take() {
            task.abort();
        }
        if let Some(task) = self.reconnect_task.take() {
            task.abort();
        }
        self.connection = None;
        self.connected = false;
        tracing::info!("Sync engine for '{}' stopped", self.config.participant_id);
    }
}
