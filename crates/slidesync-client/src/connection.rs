//! Background WebSocket connection loop with auto-reconnect.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use slidesync_common::{ClientMessage, Role, ServerMessage, Slide};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::{interval_at, sleep, timeout, Instant};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::backoff::BackoffPolicy;
use crate::page_router::PageControlRouter;
use crate::reconcile::{MergeOutcome, ReconciliationStore};
use crate::supervisor::{Action, ConnectionState, Supervisor, SupervisorEvent};
use crate::types::{ClientEvent, ClientSettings};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Queue between the public handle and the live socket.
const OUTBOUND_CAPACITY: usize = 64;

/// State shared between a client handle and its connection task.
pub(crate) struct Link {
    /// Present only while connected. Handles send through it; when it is
    /// `None` they fail fast instead of queueing.
    pub(crate) outbound: RwLock<Option<mpsc::Sender<ClientMessage>>>,
    /// Slides a display re-sends after every join.
    pub(crate) seed: RwLock<Option<Vec<Slide>>>,
    pub(crate) state: watch::Sender<ConnectionState>,
}

impl Link {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            outbound: RwLock::new(None),
            seed: RwLock::new(None),
            state,
        }
    }
}

enum SessionEnd {
    Lost,
    Stopped,
}

pub(crate) struct ConnectionTask<B> {
    pub(crate) settings: ClientSettings,
    pub(crate) supervisor: Supervisor<B>,
    pub(crate) link: Arc<Link>,
    pub(crate) store: ReconciliationStore,
    pub(crate) router: Option<PageControlRouter>,
    pub(crate) event_tx: mpsc::Sender<ClientEvent>,
    pub(crate) stop: watch::Receiver<bool>,
}

impl<B: BackoffPolicy> ConnectionTask<B> {
    /// Drive the supervisor until the handle asks to stop.
    pub(crate) async fn run(mut self) {
        let mut next = self.supervisor.handle(SupervisorEvent::Start);

        while let Some(action) = next.take() {
            next = match action {
                Action::Connect { generation } => {
                    self.link.state.send_replace(ConnectionState::Connecting);
                    info!(url = %self.settings.url, generation, "Connecting to sync server");

                    let attempt = tokio::select! {
                        result = timeout(
                            self.settings.connect_timeout,
                            connect_async(self.settings.url.as_str()),
                        ) => result,
                        _ = self.stop.changed() => break,
                    };

                    match attempt {
                        Ok(Ok((ws, _))) => {
                            if let Some(Action::Join(role)) = self
                                .supervisor
                                .handle(SupervisorEvent::Connected { generation })
                            {
                                if let SessionEnd::Stopped = self.session(ws, role, generation).await {
                                    break;
                                }
                            }
                        }
                        Ok(Err(e)) => {
                            warn!(error = %e, generation, "Failed to connect to sync server");
                            self.emit(ClientEvent::Error(format!("Connection failed: {e}")));
                        }
                        Err(_elapsed) => {
                            warn!(
                                timeout = ?self.settings.connect_timeout,
                                generation,
                                "Connect attempt timed out"
                            );
                            self.emit(ClientEvent::Error(format!(
                                "Connection timed out after {:?}",
                                self.settings.connect_timeout
                            )));
                        }
                    }
                    self.supervisor
                        .handle(SupervisorEvent::Dropped { generation })
                }
                Action::RetryAfter { generation, delay } => {
                    self.link.state.send_replace(ConnectionState::Disconnected);
                    info!(delay_ms = delay.as_millis() as u64, "Reconnecting in {:?}", delay);
                    tokio::select! {
                        _ = sleep(delay) => {}
                        _ = self.stop.changed() => break,
                    }
                    self.supervisor
                        .handle(SupervisorEvent::TimerElapsed { generation })
                }
                // Only ever returned for `Connected`, handled above.
                Action::Join(_) => None,
            };
        }

        self.link.state.send_replace(ConnectionState::Disconnected);
        debug!(role = %self.supervisor.role(), "Connection task stopped");
    }

    /// One live connection: announce the role, then pump frames until the
    /// socket drops or the handle stops the client.
    async fn session(&mut self, ws: WsStream, role: Role, generation: u64) -> SessionEnd {
        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::channel::<ClientMessage>(OUTBOUND_CAPACITY);

        // The seed lock is held until the outbound slot is filled, so a
        // concurrent `seed` either lands in this opening or sees the slot.
        {
            let seed = self.link.seed.read().await;
            let mut opening = vec![ClientMessage::JoinRoom(role)];
            if role == Role::Display {
                if let Some(slides) = seed.as_ref() {
                    opening.push(ClientMessage::SetSlides(slides.clone()));
                }
            }
            for message in &opening {
                match message.encode() {
                    Ok(text) => {
                        if sink.send(WsMessage::Text(text.into())).await.is_err() {
                            return SessionEnd::Lost;
                        }
                    }
                    Err(e) => warn!(error = %e, event = message.event_name(), "Failed to encode"),
                }
            }
            *self.link.outbound.write().await = Some(tx);
        }

        self.link.state.send_replace(ConnectionState::Connected);
        info!(role = %role, generation, "Connected to sync server");
        self.emit(ClientEvent::Connected { generation });

        let period = self.settings.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);

        let end = loop {
            tokio::select! {
                _ = self.stop.changed() => {
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break SessionEnd::Stopped;
                }

                // Handle → server
                Some(message) = rx.recv() => {
                    let text = match message.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            warn!(error = %e, event = message.event_name(), "Failed to encode");
                            continue;
                        }
                    };
                    if sink.send(WsMessage::Text(text.into())).await.is_err() {
                        break SessionEnd::Lost;
                    }
                }

                _ = heartbeat.tick() => {
                    if sink.send(WsMessage::Ping(Default::default())).await.is_err() {
                        break SessionEnd::Lost;
                    }
                }

                // Server → local store
                frame = stream.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => self.handle_frame(&text),
                    Some(Ok(WsMessage::Close(_))) | None => {
                        info!("Sync server closed connection");
                        break SessionEnd::Lost;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket error");
                        break SessionEnd::Lost;
                    }
                    Some(Ok(_)) => {}
                },
            }
        };

        *self.link.outbound.write().await = None;
        self.link.state.send_replace(ConnectionState::Disconnected);
        info!(role = %role, generation, "Disconnected from sync server");
        self.emit(ClientEvent::Disconnected);
        end
    }

    fn handle_frame(&self, text: &str) {
        match ServerMessage::decode(text) {
            Ok(ServerMessage::StateUpdate(incoming)) => {
                if self.store.apply(incoming) == MergeOutcome::KeptLocalSlides {
                    debug!("Snapshot had no slides; kept local slides");
                }
                let state = self.store.state();
                debug!(
                    index = state.current_slide_index,
                    playing = state.is_playing,
                    slides = state.slides.len(),
                    "State updated"
                );
                self.emit(ClientEvent::StateChanged(state));
            }
            Ok(ServerMessage::PageControl(frame)) => {
                if let Some(router) = &self.router {
                    if !router.dispatch(frame.command()) {
                        debug!(page = %frame.target_page_id(), "No handler for page");
                    }
                }
                self.emit(ClientEvent::PageControl(frame));
            }
            Err(e) => debug!(error = %e, "Ignoring malformed frame"),
        }
    }

    /// Events are advisory; a full or dropped receiver never stalls the
    /// connection.
    fn emit(&self, event: ClientEvent) {
        if let Err(mpsc::error::TrySendError::Full(event)) = self.event_tx.try_send(event) {
            debug!(?event, "Event queue full, dropping event");
        }
    }
}
