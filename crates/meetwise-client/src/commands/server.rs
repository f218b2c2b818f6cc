//! Server command — starts the daemon in the foreground.
//!
//! Orchestrates the daemon pieces:
//! - PID file (prevents duplicate instances)
//! - signal listener (SIGTERM/SIGINT)
//! - collaborator instantiation from config (calendar, intent parser,
//!   in-memory store)
//! - socket server (IPC with clients)

use std::sync::Arc;

use tracing::{info, warn};

use meetwise_core::DEFAULT_TIMEZONE;
use meetwise_providers::{CalendarProvider, IntentParser, MemoryStore};
use meetwise_server::{
    default_pid_path, make_connection_handler, new_shared_state, PidFile, ServerConfig,
    ServerState, SocketServer, spawn_signal_listener,
};

use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Starts the daemon in the foreground.
///
/// Blocks until a shutdown signal (SIGTERM/SIGINT) or a protocol `Shutdown`
/// request arrives.
pub async fn run(cli: &Cli, config: &ClientConfig) -> ClientResult<()> {
    let default_timezone = config
        .default_timezone
        .clone()
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());

    let mut state = ServerState::new(Arc::new(MemoryStore::new()), &default_timezone);

    match build_calendar(config).map_err(ClientError::Config)? {
        Some(provider) => {
            info!(name = provider.name(), "calendar provider registered");
            state = state.with_calendar(provider);
        }
        None => warn!("no calendar provider configured; availability queries will fail"),
    }

    match build_intent_parser(config).map_err(ClientError::Config)? {
        Some(parser) => {
            info!(name = parser.name(), "intent parser registered");
            state = state.with_intent_parser(parser);
        }
        None => warn!("no intent parser configured; intent requests will fail"),
    }

    let _pid_file = PidFile::create(default_pid_path())
        .map_err(|e| ClientError::Config(format!("failed to create PID file: {e}")))?;

    let state = new_shared_state(state);
    let shutdown = state.shutdown().clone();
    spawn_signal_listener(shutdown.clone());

    let socket_path = cli
        .socket_path
        .clone()
        .or_else(|| config.socket_path.clone())
        .unwrap_or_else(meetwise_server::default_socket_path);

    let server_config =
        ServerConfig::new(&socket_path).with_default_timezone(&default_timezone);
    let server = SocketServer::new(server_config)
        .await
        .map_err(|e| ClientError::Config(format!("failed to start socket server: {e}")))?;

    info!(path = %socket_path.display(), "daemon listening");

    let handler = make_connection_handler(state.clone());
    server
        .run_until_shutdown(handler, async move { shutdown.wait().await })
        .await
        .map_err(|e| ClientError::Config(format!("server error: {e}")))?;

    info!("daemon stopped");
    Ok(())
}

/// Builds the calendar provider from config, when one is configured.
fn build_calendar(_config: &ClientConfig) -> Result<Option<Arc<dyn CalendarProvider>>, String> {
    #[cfg(feature = "google")]
    if let Some(ref settings) = _config.google {
        let provider_config = settings.to_provider_config()?;
        let provider = meetwise_providers::google::GoogleCalendarProvider::new(provider_config)
            .map_err(|e| e.to_string())?;
        return Ok(Some(Arc::new(provider)));
    }
    Ok(None)
}

/// Builds the intent parser when a router token is available.
fn build_intent_parser(_config: &ClientConfig) -> Result<Option<Arc<dyn IntentParser>>, String> {
    #[cfg(feature = "intent")]
    if std::env::var("HUGGINGFACE_API_TOKEN").is_ok() {
        let settings = _config.intent.clone().unwrap_or_default();
        let router_config = settings.to_router_config().map_err(|e| e.to_string())?;
        let parser = meetwise_providers::intent::RouterIntentParser::new(router_config)
            .map_err(|e| e.to_string())?;
        return Ok(Some(Arc::new(parser)));
    }
    Ok(None)
}
