mod config;
mod errors;
mod intake;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::intake::dispatch::{MessageDispatcher, SmtpDispatcher};
use crate::intake::staging::AttachmentStager;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Careers intake API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        smtp_host = %config.smtp_host,
        smtp_port = config.smtp_port,
        smtp_mail = if config.smtp_mail.is_some() { "set" } else { "not set" },
        smtp_password = if config.smtp_password.is_some() { "set" } else { "not set" },
        recipient = config.recipient().unwrap_or("not set"),
        "Mail configuration"
    );

    let stager = AttachmentStager::new(config.upload_dir.clone());
    stager.prepare().await?;

    let dispatcher: Arc<dyn MessageDispatcher> = Arc::new(SmtpDispatcher::from_config(&config)?);
    spawn_connection_probe(dispatcher.clone());

    let state = AppState {
        config: config.clone(),
        dispatcher,
        stager,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Logs whether the relay is reachable. A failure here is informational; the
/// server keeps accepting submissions.
fn spawn_connection_probe(dispatcher: Arc<dyn MessageDispatcher>) {
    tokio::spawn(async move {
        match dispatcher.check_connection().await {
            Ok(()) => info!("Email server is ready to send messages"),
            Err(e) => warn!("Email server check failed: {e}"),
        }
    });
}
