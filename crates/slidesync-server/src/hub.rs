//! The hub: a single task that owns the canonical state and the membership
//! registry. Every request from every connection funnels through its inbox,
//! so mutations and their broadcasts happen in arrival order and never
//! interleave.

use slidesync_common::{ClientMessage, ConnectionId, PresentationState, Role, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::dispatch;
use crate::error::ServerError;
use crate::registry::{JoinOutcome, MembershipRegistry};
use crate::relay;
use crate::store::{Mutation, PresentationStore, Rejection};

/// Inbox capacity. Connection tasks wait when it is full.
const INBOX_CAPACITY: usize = 1024;

enum HubCommand {
    Attach {
        connection: ConnectionId,
        tx: mpsc::Sender<ServerMessage>,
    },
    Message {
        connection: ConnectionId,
        message: ClientMessage,
    },
    Detach {
        connection: ConnectionId,
    },
    Snapshot {
        reply: oneshot::Sender<PresentationState>,
    },
    RoomSize {
        role: Role,
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// Cheap, cloneable handle used by connection tasks to reach the hub.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Register a new transport connection and the queue that feeds it.
    pub async fn attach(
        &self,
        connection: ConnectionId,
        tx: mpsc::Sender<ServerMessage>,
    ) -> Result<(), ServerError> {
        self.send(HubCommand::Attach { connection, tx }).await
    }

    /// Hand a decoded client message to the hub.
    pub async fn submit(
        &self,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), ServerError> {
        self.send(HubCommand::Message {
            connection,
            message,
        })
        .await
    }

    /// Report that a transport connection has closed.
    pub async fn detach(&self, connection: ConnectionId) {
        let _ = self.send(HubCommand::Detach { connection }).await;
    }

    /// Current canonical state, as of every request queued before this call.
    pub async fn snapshot(&self) -> Result<PresentationState, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| ServerError::HubStopped)
    }

    /// Number of connections joined to `role`, as of every request queued
    /// before this call.
    pub async fn room_size(&self, role: Role) -> Result<usize, ServerError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::RoomSize { role, reply }).await?;
        rx.await.map_err(|_| ServerError::HubStopped)
    }

    /// Stop the hub. Dropping its registry closes every outbound queue,
    /// which ends the connection tasks.
    pub async fn shutdown(&self) {
        let _ = self.send(HubCommand::Shutdown).await;
    }

    async fn send(&self, command: HubCommand) -> Result<(), ServerError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ServerError::HubStopped)
    }
}

pub struct Hub {
    rx: mpsc::Receiver<HubCommand>,
    registry: MembershipRegistry,
    store: PresentationStore,
}

impl Hub {
    pub fn new(store: PresentationStore) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        let hub = Self {
            rx,
            registry: MembershipRegistry::new(),
            store,
        };
        (hub, HubHandle { tx })
    }

    /// Create the hub and run it on the current runtime.
    pub fn spawn(store: PresentationStore) -> (HubHandle, tokio::task::JoinHandle<()>) {
        let (hub, handle) = Self::new(store);
        let task = tokio::spawn(hub.run());
        (handle, task)
    }

    /// Process requests until shut down or every handle is dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                HubCommand::Attach { connection, tx } => {
                    self.registry.attach(connection, tx);
                    debug!(conn = %connection, total = self.registry.connection_count(), "Connection attached");
                }
                HubCommand::Message {
                    connection,
                    message,
                } => self.handle_message(connection, message),
                HubCommand::Detach { connection } => self.detach(connection),
                HubCommand::Snapshot { reply } => {
                    let _ = reply.send(self.store.state().clone());
                }
                HubCommand::RoomSize { role, reply } => {
                    let _ = reply.send(self.registry.room_size(role));
                }
                HubCommand::Shutdown => {
                    info!(
                        connections = self.registry.connection_count(),
                        "Hub shutting down"
                    );
                    break;
                }
            }
        }
    }

    fn handle_message(&mut self, connection: ConnectionId, message: ClientMessage) {
        let event = message.event_name();
        if let ClientMessage::JoinRoom(role) = message {
            self.join(connection, role);
            return;
        }

        let result = match message.required_role() {
            Some(required) => self.authorize(connection, required, event),
            None => Ok(()),
        }
        .and_then(|()| self.perform(connection, message));

        if let Err(rejection) = result {
            debug!(conn = %connection, event, reason = %rejection, "Request rejected");
        }
    }

    /// Act on a message whose sender has already been authorized.
    fn perform(
        &mut self,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), Rejection> {
        match message {
            ClientMessage::PageControl(frame) => {
                let target = frame.target_page_id();
                let delivered = relay::forward_page_control(&self.registry, frame);
                debug!(conn = %connection, target = %target, displays = delivered, "Page control relayed");
                Ok(())
            }
            other => match Mutation::from_message(other) {
                Some(mutation) => self.mutate(connection, mutation),
                None => Ok(()),
            },
        }
    }

    fn join(&mut self, connection: ConnectionId, role: Role) {
        match self.registry.join(connection, role) {
            JoinOutcome::Joined => {
                info!(
                    conn = %connection,
                    role = %role,
                    room_size = self.registry.room_size(role),
                    "Client joined"
                );
                dispatch::push_snapshot(&self.registry, connection, self.store.state());
            }
            JoinOutcome::AlreadyJoined => {
                debug!(conn = %connection, role = %role, "Duplicate join ignored");
            }
            JoinOutcome::RoleConflict { current } => {
                warn!(conn = %connection, requested = %role, current = %current, "Role change refused");
            }
            JoinOutcome::UnknownConnection => {
                warn!(conn = %connection, "Join from unknown connection");
            }
        }
    }

    fn mutate(&mut self, connection: ConnectionId, mutation: Mutation) -> Result<(), Rejection> {
        let action = mutation.name();
        let state = self.store.apply(mutation)?;
        let delivered = dispatch::broadcast_snapshot(&self.registry, state);
        info!(
            conn = %connection,
            action,
            index = state.current_slide_index,
            playing = state.is_playing,
            slides = state.slides.len(),
            delivered,
            "State updated"
        );
        Ok(())
    }

    fn authorize(
        &self,
        connection: ConnectionId,
        required: Role,
        action: &'static str,
    ) -> Result<(), Rejection> {
        match self.registry.role_of(connection) {
            None => Err(Rejection::NotJoined),
            Some(actual) if actual != required => Err(Rejection::RoleMismatch {
                action,
                required,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    fn detach(&mut self, connection: ConnectionId) {
        match self.registry.detach(connection) {
            Some(session) => info!(
                conn = %connection,
                role = %session.role,
                connected_for = ?session.joined_at.elapsed(),
                "Client left"
            ),
            None => debug!(conn = %connection, "Unjoined connection closed"),
        }
    }
}
