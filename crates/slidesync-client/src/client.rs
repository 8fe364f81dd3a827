//! Public handles for the two client roles.
//!
//! Both wrap a [`SyncClient`], which owns the background connection task.
//! Every send fails fast with [`ClientError::NotConnected`] while the
//! transport is down; nothing is queued for later.

use std::sync::Arc;

use slidesync_common::{
    ClientMessage, PageCommand, PageControlCommand, PageControlFrame, Role, Slide, SlideId,
};
use slidesync_config::ClientConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::backoff::{BackoffPolicy, ExponentialBackoff};
use crate::connection::{ConnectionTask, Link};
use crate::error::ClientError;
use crate::page_router::PageControlRouter;
use crate::reconcile::ReconciliationStore;
use crate::supervisor::{ConnectionState, Supervisor};
use crate::types::{ClientEvent, ClientSettings};

const EVENT_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// SyncClient
// ---------------------------------------------------------------------------

/// Role-agnostic handle to a supervised connection.
pub struct SyncClient {
    role: Role,
    link: Arc<Link>,
    store: ReconciliationStore,
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncClient {
    /// Start the background connection. Returns `(client, event_receiver)`.
    pub fn spawn<B: BackoffPolicy>(
        role: Role,
        settings: ClientSettings,
        backoff: B,
        router: Option<PageControlRouter>,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        let (stop, stop_rx) = watch::channel(false);
        let link = Arc::new(Link::new());
        let store = ReconciliationStore::new();

        let task = tokio::spawn(
            ConnectionTask {
                settings,
                supervisor: Supervisor::new(role, backoff),
                link: Arc::clone(&link),
                store: store.clone(),
                router,
                event_tx,
                stop: stop_rx,
            }
            .run(),
        );

        let client = Self {
            role,
            link,
            store,
            stop,
            task: Some(task),
        };
        (client, event_rx)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Local view of the presentation state.
    pub fn store(&self) -> &ReconciliationStore {
        &self.store
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.link.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.link.state.borrow() == ConnectionState::Connected
    }

    /// Send one message on the live connection.
    pub async fn send(&self, message: ClientMessage) -> Result<(), ClientError> {
        if *self.stop.borrow() {
            return Err(ClientError::Closed);
        }
        let tx = self
            .link
            .outbound
            .read()
            .await
            .clone()
            .ok_or(ClientError::NotConnected)?;
        tx.send(message)
            .await
            .map_err(|_| ClientError::NotConnected)
    }

    /// Close the connection and stop reconnecting.
    pub async fn close(&mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Connection task ended abnormally");
            }
        }
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// ControllerClient
// ---------------------------------------------------------------------------

/// Drives navigation and playback, and sends page-control commands.
pub struct ControllerClient {
    inner: SyncClient,
}

impl ControllerClient {
    /// Connect using the `[client]` config section.
    pub fn connect(config: &ClientConfig) -> (Self, mpsc::Receiver<ClientEvent>) {
        Self::connect_with(
            ClientSettings::from_config(config),
            ExponentialBackoff::from_config(config),
        )
    }

    pub fn connect_with<B: BackoffPolicy>(
        settings: ClientSettings,
        backoff: B,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (inner, events) = SyncClient::spawn(Role::Controller, settings, backoff, None);
        (Self { inner }, events)
    }

    /// Jump to the slide at `index`. The server ignores out-of-range
    /// indices.
    pub async fn change_slide(&self, index: usize) -> Result<(), ClientError> {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.inner.send(ClientMessage::ChangeSlide(index)).await
    }

    pub async fn next_slide(&self) -> Result<(), ClientError> {
        self.inner.send(ClientMessage::NextSlide).await
    }

    pub async fn prev_slide(&self) -> Result<(), ClientError> {
        self.inner.send(ClientMessage::PrevSlide).await
    }

    pub async fn set_playing(&self, playing: bool) -> Result<(), ClientError> {
        self.inner.send(ClientMessage::TogglePlay(playing)).await
    }

    /// Flip the play state as currently seen by this client.
    pub async fn toggle_play(&self) -> Result<(), ClientError> {
        let playing = self.inner.store().state().is_playing;
        self.set_playing(!playing).await
    }

    /// Send a command to whichever displays render page `page`.
    pub async fn page_control(
        &self,
        page: impl Into<SlideId>,
        command: impl Into<PageCommand>,
    ) -> Result<(), ClientError> {
        let frame = PageControlFrame::new(PageControlCommand {
            target_page_id: page.into(),
            command: command.into(),
        })?;
        self.inner.send(ClientMessage::PageControl(frame)).await
    }

    pub fn store(&self) -> &ReconciliationStore {
        self.inner.store()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub async fn close(&mut self) {
        self.inner.close().await;
    }
}

// ---------------------------------------------------------------------------
// DisplayClient
// ---------------------------------------------------------------------------

/// Owns the slide content and renders pages; receives page-control
/// commands through its [`PageControlRouter`].
pub struct DisplayClient {
    inner: SyncClient,
}

impl DisplayClient {
    /// Connect using the `[client]` config section.
    pub fn connect(
        config: &ClientConfig,
        router: PageControlRouter,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        Self::connect_with(
            ClientSettings::from_config(config),
            ExponentialBackoff::from_config(config),
            router,
        )
    }

    pub fn connect_with<B: BackoffPolicy>(
        settings: ClientSettings,
        backoff: B,
        router: PageControlRouter,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (inner, events) = SyncClient::spawn(Role::Display, settings, backoff, Some(router));
        (Self { inner }, events)
    }

    /// Keep `slides` as this display's content. They go into the local
    /// store now and are sent to the server after every join, including
    /// the current connection if there is one.
    pub async fn seed(&self, slides: Vec<Slide>) {
        self.inner.store().seed_slides(slides.clone());

        let tx = {
            let mut seed = self.inner.link.seed.write().await;
            *seed = Some(slides.clone());
            self.inner.link.outbound.read().await.clone()
        };
        if let Some(tx) = tx {
            if tx.send(ClientMessage::SetSlides(slides)).await.is_err() {
                tracing::debug!("Connection dropped while seeding; slides go out on rejoin");
            }
        }
    }

    /// Replace the server's slide list once, on the live connection.
    pub async fn set_slides(&self, slides: Vec<Slide>) -> Result<(), ClientError> {
        self.inner.send(ClientMessage::SetSlides(slides)).await
    }

    pub fn store(&self) -> &ReconciliationStore {
        self.inner.store()
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub async fn close(&mut self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::backoff::FixedBackoff;
    use slidesync_common::PageCommandKind;

    /// Nothing listens on port 1, so every attempt fails fast.
    fn unreachable() -> ClientSettings {
        let mut settings = ClientSettings::new("ws://127.0.0.1:1");
        settings.connect_timeout = Duration::from_millis(200);
        settings
    }

    fn backoff() -> FixedBackoff {
        FixedBackoff(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn controller_actions_fail_fast_when_disconnected() {
        let (controller, _events) = ControllerClient::connect_with(unreachable(), backoff());
        assert!(!controller.is_connected());
        assert!(matches!(
            controller.next_slide().await,
            Err(ClientError::NotConnected)
        ));
        assert!(matches!(
            controller.page_control(3u32, PageCommandKind::ResetAll).await,
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn failed_attempts_are_reported_and_retried() {
        let (_controller, mut events) = ControllerClient::connect_with(unreachable(), backoff());
        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(event, ClientEvent::Error(_)));
        }
    }

    #[tokio::test]
    async fn stalled_handshake_times_out_and_is_retried() {
        // Accepts the TCP connection but never answers the upgrade request.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let held = tokio::spawn(async move {
            let mut sockets = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                sockets.push(socket);
            }
        });

        let mut settings = ClientSettings::new(format!("ws://127.0.0.1:{port}"));
        settings.connect_timeout = Duration::from_millis(200);
        let (controller, mut events) = ControllerClient::connect_with(settings, backoff());
        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
            match event {
                ClientEvent::Error(message) => {
                    assert!(message.starts_with("Connection timed out"), "{message}");
                }
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(!controller.is_connected());
        held.abort();
    }

    #[tokio::test]
    async fn display_seed_lands_in_local_store_while_offline() {
        let router = PageControlRouter::builder().build();
        let (display, _events) = DisplayClient::connect_with(unreachable(), backoff(), router);
        display
            .seed(vec![Slide::new(1, slidesync_common::SlideKind::Image, "/a.png")])
            .await;
        assert_eq!(display.store().state().slides.len(), 1);
        assert!(matches!(
            display.set_slides(Vec::new()).await,
            Err(ClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn closed_client_refuses_sends() {
        let (mut controller, _events) = ControllerClient::connect_with(unreachable(), backoff());
        controller.close().await;
        assert!(matches!(
            controller.prev_slide().await,
            Err(ClientError::Closed)
        ));
        assert_eq!(
            *controller.connection_state().borrow(),
            ConnectionState::Disconnected
        );
    }
}
