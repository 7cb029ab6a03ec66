//! # wsgate
//!
//! WebSocket server binary: loads settings, installs logging and metrics,
//! and serves the demo echo session until Ctrl-C.

#![deny(unsafe_code)]

mod echo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use wsgate_server::WsServer;
use wsgate_settings::WsGateSettings;

use crate::echo::EchoSession;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// wsgate WebSocket server.
#[derive(Parser, Debug)]
#[command(name = "wsgate", about = "WebSocket connection server")]
struct Cli {
    /// Settings file (defaults to `~/.wsgate/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings, 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

impl Cli {
    /// Load settings and layer the command-line overrides on top.
    fn resolve_settings(&self) -> Result<WsGateSettings> {
        let mut settings = match self.config {
            Some(ref path) => wsgate_settings::load_settings_from_path(path)
                .with_context(|| format!("Failed to load settings: {}", path.display()))?,
            None => wsgate_settings::load_settings().with_context(|| {
                format!(
                    "Failed to load settings: {}",
                    wsgate_settings::settings_path().display()
                )
            })?,
        };

        if let Some(ref host) = self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.log_json {
            settings.logging.json = true;
        }
        settings.validate();
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.resolve_settings()?;

    let _ = wsgate_core::logging::init_subscriber(&settings.logging.level, settings.logging.json);

    let recorder = wsgate_server::metrics::install_recorder()
        .context("Failed to install metrics recorder")?;

    let server = WsServer::new(
        EchoSession::create,
        settings.server.clone(),
        &settings.keepalive,
    )
    .with_metrics(recorder);

    let shutdown = server.shutdown_token();
    let _signal = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down..."),
            Err(e) => tracing::warn!(error = %e, "failed to listen for ctrl-c, shutting down"),
        }
        shutdown.cancel();
    });

    let addr = settings.server.bind_addr();
    server
        .start(&addr)
        .await
        .with_context(|| format!("Failed to serve on {addr}"))?;

    tracing::info!("Shutdown complete");
    Ok(())
}
