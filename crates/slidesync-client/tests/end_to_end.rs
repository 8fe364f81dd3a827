//! Real server, real sockets: controller and display clients against a
//! `slidesync-server` bound to an ephemeral loopback port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use slidesync_client::{
    ClientEvent, ClientSettings, ControllerClient, DisplayClient, ExponentialBackoff,
    PageCommandKind, PageControlRouter, ReconciliationStore, Slide, SlideKind,
};
use slidesync_common::PresentationState;
use slidesync_config::SlideSyncConfig;
use slidesync_server::{HubHandle, Server, ServerError};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const WAIT: Duration = Duration::from_secs(10);

struct RunningServer {
    port: u16,
    hub: HubHandle,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    async fn start(port: u16) -> Self {
        let mut config = SlideSyncConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = port;

        let server = Server::bind(&config).await.unwrap();
        let port = server.local_addr().unwrap().port();
        let hub = server.hub();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server.serve_with_shutdown(async {
            let _ = stopped.await;
        }));
        Self {
            port,
            hub,
            stop,
            task,
        }
    }

    fn url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    async fn shutdown(self) {
        let _ = self.stop.send(());
        self.task.await.unwrap().unwrap();
    }
}

fn settings(url: &str) -> ClientSettings {
    let mut settings = ClientSettings::new(url);
    settings.connect_timeout = Duration::from_secs(2);
    settings
}

fn fast_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(Duration::from_millis(20), Duration::from_millis(200))
}

fn deck(ids: &[u32]) -> Vec<Slide> {
    ids.iter()
        .map(|&id| Slide::new(id, SlideKind::Image, format!("/assets/images/page-{id}.png")))
        .collect()
}

/// Wait until the local store satisfies `pred`.
async fn wait_for_state<F>(store: &ReconciliationStore, pred: F) -> PresentationState
where
    F: FnMut(&PresentationState) -> bool,
{
    let mut rx = store.subscribe();
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .map(|state| state.clone())
        .unwrap()
}

/// Skip events until one matches.
async fn next_event<F>(events: &mut mpsc::Receiver<ClientEvent>, mut pred: F) -> ClientEvent
where
    F: FnMut(&ClientEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn joined(events: &mut mpsc::Receiver<ClientEvent>) {
    next_event(events, |e| matches!(e, ClientEvent::StateChanged(_))).await;
}

type Log = Arc<Mutex<Vec<PageCommandKind>>>;

fn recording_router(page: u32) -> (PageControlRouter, Log) {
    let log: Log = Arc::default();
    let sink = Arc::clone(&log);
    let router = PageControlRouter::builder()
        .on(page, move |cmd| sink.lock().unwrap().push(cmd))
        .build();
    (router, log)
}

#[tokio::test]
async fn seeded_display_shares_slides_with_controller() {
    let server = RunningServer::start(0).await;

    let (display, _display_events) = DisplayClient::connect_with(
        settings(&server.url()),
        fast_backoff(),
        PageControlRouter::default(),
    );
    display.seed(deck(&[1, 2])).await;

    let (controller, _controller_events) =
        ControllerClient::connect_with(settings(&server.url()), fast_backoff());
    let state = wait_for_state(controller.store(), |s| s.slides.len() == 2).await;
    assert_eq!(state.current_slide_index, 0);
    assert_eq!(state.slides, deck(&[1, 2]));

    server.shutdown().await;
}

#[tokio::test]
async fn controller_steps_through_slides_and_stops_at_the_end() {
    let server = RunningServer::start(0).await;

    let (display, _display_events) = DisplayClient::connect_with(
        settings(&server.url()),
        fast_backoff(),
        PageControlRouter::default(),
    );
    display.seed(deck(&[10, 11, 12])).await;

    let (controller, _events) =
        ControllerClient::connect_with(settings(&server.url()), fast_backoff());
    wait_for_state(controller.store(), |s| s.slides.len() == 3).await;

    for _ in 0..3 {
        controller.next_slide().await.unwrap();
    }
    controller.set_playing(true).await.unwrap();

    let state = wait_for_state(display.store(), |s| s.is_playing).await;
    assert_eq!(state.current_slide_index, 2);
    assert_eq!(server.hub.snapshot().await.unwrap().current_slide_index, 2);

    server.shutdown().await;
}

#[tokio::test]
async fn page_control_reaches_joined_displays_only() {
    let server = RunningServer::start(0).await;

    let (first_router, first_log) = recording_router(7);
    let (second_router, second_log) = recording_router(7);
    let (_first, mut first_events) =
        DisplayClient::connect_with(settings(&server.url()), fast_backoff(), first_router);
    let (_second, mut second_events) =
        DisplayClient::connect_with(settings(&server.url()), fast_backoff(), second_router);
    joined(&mut first_events).await;
    joined(&mut second_events).await;

    let (controller, mut controller_events) =
        ControllerClient::connect_with(settings(&server.url()), fast_backoff());
    joined(&mut controller_events).await;
    controller
        .page_control(7u32, PageCommandKind::Volume(40))
        .await
        .unwrap();

    for events in [&mut first_events, &mut second_events] {
        let event = next_event(events, |e| matches!(e, ClientEvent::PageControl(_))).await;
        let ClientEvent::PageControl(frame) = event else {
            unreachable!()
        };
        assert_eq!(frame.target_page_id().0, 7);
    }
    assert_eq!(*first_log.lock().unwrap(), vec![PageCommandKind::Volume(40)]);
    assert_eq!(*second_log.lock().unwrap(), vec![PageCommandKind::Volume(40)]);

    let (late_router, late_log) = recording_router(7);
    let (_late, mut late_events) =
        DisplayClient::connect_with(settings(&server.url()), fast_backoff(), late_router);
    joined(&mut late_events).await;

    controller
        .page_control(7u32, PageCommandKind::ResetAll)
        .await
        .unwrap();
    next_event(&mut late_events, |e| matches!(e, ClientEvent::PageControl(_))).await;
    assert_eq!(*late_log.lock().unwrap(), vec![PageCommandKind::ResetAll]);

    server.shutdown().await;
}

#[tokio::test]
async fn reconnect_rejoins_and_keeps_local_slides() {
    let server = RunningServer::start(0).await;
    let port = server.port;

    let (display, mut display_events) = DisplayClient::connect_with(
        settings(&server.url()),
        fast_backoff(),
        PageControlRouter::default(),
    );
    display.seed(deck(&[1, 2, 3])).await;
    joined(&mut display_events).await;

    let (controller, mut controller_events) =
        ControllerClient::connect_with(settings(&server.url()), fast_backoff());
    wait_for_state(controller.store(), |s| s.slides.len() == 3).await;
    controller.next_slide().await.unwrap();
    wait_for_state(display.store(), |s| s.current_slide_index == 1).await;

    // Restart on the same port with empty state.
    server.shutdown().await;
    next_event(&mut controller_events, |e| *e == ClientEvent::Disconnected).await;
    next_event(&mut display_events, |e| *e == ClientEvent::Disconnected).await;
    assert!(!controller.is_connected());
    assert!(matches!(
        controller.next_slide().await,
        Err(slidesync_client::ClientError::NotConnected)
    ));

    let server = RunningServer::start(port).await;

    // The rejoin is what earns the fresh snapshot.
    let event = next_event(&mut controller_events, |e| {
        matches!(e, ClientEvent::Connected { .. })
    })
    .await;
    assert!(matches!(event, ClientEvent::Connected { generation } if generation >= 2));
    let ClientEvent::StateChanged(state) = next_event(&mut controller_events, |e| {
        matches!(e, ClientEvent::StateChanged(_))
    })
    .await
    else {
        unreachable!()
    };
    assert_eq!(state.slides.len(), 3);
    assert_eq!(controller.store().state().slides, deck(&[1, 2, 3]));

    // The display re-seeds the new server after its own rejoin.
    tokio::time::timeout(WAIT, async {
        while server.hub.snapshot().await.unwrap().slides.len() != 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("display never re-seeded the server");

    // The controller holds its role again.
    controller.change_slide(2).await.unwrap();
    wait_for_state(display.store(), |s| s.current_slide_index == 2).await;

    server.shutdown().await;
}

#[tokio::test]
async fn raw_socket_speaks_the_wire_format() {
    let server = RunningServer::start(0).await;
    let (mut ws, _) = tokio_tungstenite::connect_async(server.url()).await.unwrap();

    // Garbage is ignored and the connection stays usable.
    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"event":"warp-drive"}"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(r#"{"event":"join-room","payload":"control"}"#.into()))
        .await
        .unwrap();

    let frame = tokio::time::timeout(WAIT, ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = match frame {
        Message::Text(text) => text,
        other => panic!("expected a text frame, got {other:?}"),
    };
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["event"], "state-update");
    assert_eq!(value["payload"]["currentSlideIndex"], 0);
    assert_eq!(value["payload"]["isPlaying"], false);
    assert_eq!(value["payload"]["slides"], serde_json::json!([]));

    let _ = ws.close(None).await;
    server.shutdown().await;
}

type RawSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn next_text(ws: &mut RawSocket) -> String {
    loop {
        let frame = tokio::time::timeout(WAIT, ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        match frame {
            Message::Text(text) => return text.as_str().to_owned(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn page_control_frame_reaches_display_byte_for_byte() {
    let server = RunningServer::start(0).await;
    let (mut display, _) = tokio_tungstenite::connect_async(server.url()).await.unwrap();
    let (mut controller, _) = tokio_tungstenite::connect_async(server.url()).await.unwrap();

    display
        .send(Message::Text(r#"{"event":"join-room","payload":"display"}"#.into()))
        .await
        .unwrap();
    next_text(&mut display).await;
    controller
        .send(Message::Text(r#"{"event":"join-room","payload":"control"}"#.into()))
        .await
        .unwrap();
    next_text(&mut controller).await;

    let sent = r#"{"event":"page-control","payload":{"targetPageId":7,"command":{"type":"volume","value":null,"fade":true},"origin":"panel"}}"#;
    controller.send(Message::Text(sent.into())).await.unwrap();
    assert_eq!(next_text(&mut display).await, sent);

    // The front end's `pageId` spelling goes out as it came in.
    let legacy = r#"{"event":"page-control","payload":{"pageId":27,"command":{"type":"start-recording"}}}"#;
    controller.send(Message::Text(legacy.into())).await.unwrap();
    assert_eq!(next_text(&mut display).await, legacy);

    let _ = display.close(None).await;
    let _ = controller.close(None).await;
    server.shutdown().await;
}
