//! Daemon: socket IPC, request dispatch, collaborator wiring.
//!
//! This crate provides the meetwise daemon:
//! - Unix socket IPC for client communication
//! - Request dispatch against the collaborator traits (calendar provider,
//!   intent parser, meeting store)
//! - PID file and shutdown signal handling
//!
//! Busy intervals are fetched fresh from the calendar provider on every
//! availability request; the daemon keeps no event cache and runs no
//! background sync.

mod config;
mod error;
mod handler;
mod pidfile;
mod signals;
mod socket;

pub use config::{default_socket_path, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use handler::{make_connection_handler, new_shared_state, RequestHandler, ServerState, SharedState};
pub use pidfile::{default_pid_path, PidFile};
pub use signals::{spawn_signal_listener, ShutdownSignal};
pub use socket::{Connection, SocketServer};
