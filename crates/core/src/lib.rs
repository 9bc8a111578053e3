//! Core library for coffer, a terminal front end to a wallet daemon.
//!
//! Resolves where the configuration lives, locates the daemon behind a
//! Unix socket, launches it when nothing answers, and exposes a typed
//! JSON-RPC client for the interface layer. When no configuration exists
//! the resolver asks for setup instead of failing.
//!
//! Quick start:
//! - `coffer_core::resolve::resolve(&args)` yields `Launch::Run` or `Launch::Install`.
//! - `coffer_core::installer::Installer` writes a fresh configuration.
//! - `coffer_core::bootstrap::Bootstrap::new(opts).connect()` returns a live `Connection`.
//! - `coffer_core::devd::start` runs a dev daemon speaking the same protocol.

pub mod bootstrap;
pub mod config;
pub mod devd;
pub mod installer;
pub mod logging;
pub mod network;
pub mod resolve;
pub mod rpc;

pub use network::Network;
