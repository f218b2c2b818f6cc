//! CLI subcommand implementations.

pub mod server;
