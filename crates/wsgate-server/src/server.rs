//! Listener, routing, and shutdown for the WebSocket adapter.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;
use wsgate_settings::{KeepaliveSettings, ServerSettings};

use crate::errors::ServerError;
use crate::metrics;
use crate::session::SessionFactory;
use crate::websocket::heartbeat::Keepalive;
use crate::websocket::upgrade::{PeerAddrs, upgrade};

/// Shared state handed to every request.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) factory: Arc<dyn SessionFactory>,
    pub(crate) server: Arc<ServerSettings>,
    pub(crate) keepalive: Keepalive,
    pub(crate) shutdown: CancellationToken,
    pub(crate) tracker: TaskTracker,
    pub(crate) metrics: Option<PrometheusHandle>,
}

/// Build the router: `/metrics` (when a recorder is attached), and the
/// upgrade endpoint on every other path.
pub(crate) fn router(state: AppState) -> Router {
    let mut router = Router::new();
    if state.metrics.is_some() {
        router = router.route("/metrics", get(metrics_handler));
    }
    router
        .fallback(upgrade)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.as_ref() {
        Some(handle) => metrics::render(handle).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// WebSocket server: upgrades requests and runs one session per socket.
pub struct WsServer {
    state: AppState,
}

impl WsServer {
    /// Create a server that builds sessions with `factory`.
    pub fn new(
        factory: impl SessionFactory,
        server: ServerSettings,
        keepalive: &KeepaliveSettings,
    ) -> Self {
        Self {
            state: AppState {
                factory: Arc::new(factory),
                server: Arc::new(server),
                keepalive: Keepalive::from(keepalive),
                shutdown: CancellationToken::new(),
                tracker: TaskTracker::new(),
                metrics: None,
            },
        }
    }

    /// Serve Prometheus text on `GET /metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.state.metrics = Some(handle);
        self
    }

    /// Token that stops the server and closes every live connection.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    /// Number of connections currently being served.
    pub fn connection_count(&self) -> usize {
        self.state.tracker.len()
    }

    /// Bind `addr` and serve until shutdown.
    pub async fn start(&self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    ///
    /// Returns after the listener stops and every connection has closed.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        info!(%local, "websocket server listening");

        let app = router(self.state.clone());
        let shutdown = self.state.shutdown.clone();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<PeerAddrs>(),
        )
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

        // Upgraded sockets outlive the HTTP layer; wait for their teardown.
        let tracker = &self.state.tracker;
        let _ = tracker.close();
        tracker.wait().await;
        info!(%local, "websocket server stopped");
        Ok(())
    }
}
