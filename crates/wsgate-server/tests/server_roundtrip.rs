#![allow(missing_docs)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as ClientMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use wsgate_server::{ConnectionError, Session, SessionError, WsConnection, WsServer};
use wsgate_settings::{KeepaliveSettings, ServerSettings};

type Client = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, PartialEq)]
enum Event {
    Connect,
    Message(Vec<u8>),
    Disconnect,
}

/// Echo session that reports each callback on a shared channel.
struct EchoRecorder {
    events: mpsc::UnboundedSender<Event>,
    conn: Mutex<Option<Arc<WsConnection>>>,
    last_conn: Mutex<Option<Arc<WsConnection>>>,
}

#[async_trait]
impl Session for EchoRecorder {
    async fn on_connect(&self, conn: Arc<WsConnection>) -> Result<(), SessionError> {
        *self.last_conn.lock() = Some(Arc::clone(&conn));
        *self.conn.lock() = Some(conn);
        let _ = self.events.send(Event::Connect);
        Ok(())
    }

    async fn on_message(&self, message: Bytes) -> Result<(), SessionError> {
        let _ = self.events.send(Event::Message(message.to_vec()));
        let conn = self.conn.lock().clone();
        if let Some(conn) = conn {
            conn.write(message).await?;
        }
        Ok(())
    }

    async fn on_disconnect(&self) {
        let _ = self.conn.lock().take();
        let _ = self.events.send(Event::Disconnect);
    }
}

struct Fixture {
    addr: SocketAddr,
    server: Arc<WsServer>,
    serve: JoinHandle<()>,
    events: mpsc::UnboundedReceiver<Event>,
    sessions: Arc<Mutex<Vec<Arc<EchoRecorder>>>>,
}

impl Fixture {
    async fn start(keepalive: KeepaliveSettings) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let sessions: Arc<Mutex<Vec<Arc<EchoRecorder>>>> = Arc::new(Mutex::new(Vec::new()));
        let created = Arc::clone(&sessions);
        let factory = move || -> Arc<dyn Session> {
            let session = Arc::new(EchoRecorder {
                events: tx.clone(),
                conn: Mutex::new(None),
                last_conn: Mutex::new(None),
            });
            created.lock().push(Arc::clone(&session));
            session
        };

        let server = Arc::new(WsServer::new(
            factory,
            ServerSettings::default(),
            &keepalive,
        ));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let serving = Arc::clone(&server);
        let serve = tokio::spawn(async move {
            serving.serve(listener).await.unwrap();
        });

        Self {
            addr,
            server,
            serve,
            events,
            sessions,
        }
    }

    async fn connect(&self) -> Client {
        let (ws, _) = connect_async(format!("ws://{}/any/path", self.addr))
            .await
            .unwrap();
        ws
    }

    async fn next_event(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.events.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event channel closed")
    }

    async fn no_event_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.events.recv()).await.is_err()
    }

    fn last_connection(&self) -> Arc<WsConnection> {
        let sessions = self.sessions.lock();
        let session = sessions.last().expect("no session created");
        let conn = session.last_conn.lock().clone();
        conn.expect("session never connected")
    }
}

fn fast_keepalive() -> KeepaliveSettings {
    KeepaliveSettings {
        write_wait_ms: 1_000,
        pong_wait_ms: 300,
        ping_period_ms: 100,
    }
}

/// Next data frame from the server, skipping control frames.
async fn next_data(client: &mut Client) -> ClientMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("read failed");
        if !matches!(msg, ClientMessage::Ping(_) | ClientMessage::Pong(_)) {
            return msg;
        }
    }
}

#[tokio::test]
async fn binary_message_round_trip() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let mut client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    client
        .send(ClientMessage::binary(&b"hello"[..]))
        .await
        .unwrap();

    assert_eq!(fx.next_event().await, Event::Message(b"hello".to_vec()));
    match next_data(&mut client).await {
        ClientMessage::Binary(data) => assert_eq!(&data[..], b"hello"),
        other => panic!("expected binary echo, got {other:?}"),
    }
}

#[tokio::test]
async fn text_frames_reach_session_as_bytes() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let mut client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    client.send(ClientMessage::text("hi there")).await.unwrap();

    assert_eq!(fx.next_event().await, Event::Message(b"hi there".to_vec()));
    // Writes always go out as binary frames.
    match next_data(&mut client).await {
        ClientMessage::Binary(data) => assert_eq!(&data[..], b"hi there"),
        other => panic!("expected binary echo, got {other:?}"),
    }
}

#[tokio::test]
async fn messages_arrive_in_order() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let mut client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    for i in 0..20u8 {
        client.send(ClientMessage::binary(vec![i])).await.unwrap();
    }
    for i in 0..20u8 {
        assert_eq!(fx.next_event().await, Event::Message(vec![i]));
    }
}

#[tokio::test]
async fn client_close_triggers_single_disconnect() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let mut client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    client.close(None).await.unwrap();

    assert_eq!(fx.next_event().await, Event::Disconnect);
    assert!(fx.no_event_for(Duration::from_millis(200)).await);
}

#[tokio::test]
async fn write_after_disconnect_fails() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let mut client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);
    let conn = fx.last_connection();

    client.close(None).await.unwrap();
    assert_eq!(fx.next_event().await, Event::Disconnect);

    assert!(conn.is_closed());
    let err = conn.write(Bytes::from_static(b"late")).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Closed));
}

#[tokio::test]
async fn connection_reports_socket_addresses() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    let conn = fx.last_connection();
    assert_eq!(conn.local_addr(), fx.addr);
    assert_eq!(conn.remote_addr().ip(), fx.addr.ip());
    assert_ne!(conn.remote_addr().port(), fx.addr.port());
    drop(client);
}

#[tokio::test]
async fn each_connection_gets_a_fresh_session() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let _a = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);
    let _b = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    assert_eq!(fx.sessions.lock().len(), 2);
    assert_eq!(fx.server.connection_count(), 2);
}

#[tokio::test]
async fn silent_peer_is_dropped_after_pong_wait() {
    let mut fx = Fixture::start(fast_keepalive()).await;
    // Never read, so pings are never answered.
    let _client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    let started = std::time::Instant::now();
    assert_eq!(fx.next_event().await, Event::Disconnect);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn responsive_peer_stays_connected() {
    let mut fx = Fixture::start(fast_keepalive()).await;
    let client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    // Reading lets the client answer pings with pongs.
    let (_sink, mut stream) = client.split();
    let reader = tokio::spawn(async move { while let Some(Ok(_)) = stream.next().await {} });

    assert!(fx.no_event_for(Duration::from_millis(1_200)).await);
    assert!(!fx.last_connection().is_closed());
    reader.abort();
}

#[tokio::test]
async fn shutdown_closes_live_connections() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;
    let mut client = fx.connect().await;
    assert_eq!(fx.next_event().await, Event::Connect);

    fx.server.shutdown_token().cancel();

    assert_eq!(fx.next_event().await, Event::Disconnect);
    tokio::time::timeout(Duration::from_secs(5), &mut fx.serve)
        .await
        .expect("server did not stop")
        .unwrap();
    assert_eq!(fx.server.connection_count(), 0);

    // The client sees the close frame or the end of the stream.
    let tail = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("client never saw the close");
    assert!(matches!(tail, None | Some(Ok(ClientMessage::Close(_))) | Some(Err(_))));
}

#[tokio::test]
async fn plain_http_request_creates_no_session() {
    let mut fx = Fixture::start(KeepaliveSettings::default()).await;

    let mut stream = tokio::net::TcpStream::connect(fx.addr).await.unwrap();
    tokio::io::AsyncWriteExt::write_all(
        &mut stream,
        b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await
    .unwrap();
    let mut response = Vec::new();
    let _ = tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut response).await;
    let head = String::from_utf8_lossy(&response);
    assert!(head.starts_with("HTTP/1.1 4"), "unexpected response: {head}");

    assert!(fx.no_event_for(Duration::from_millis(200)).await);
    assert!(fx.sessions.lock().is_empty());
}
