//! `MycoSCAN` upload service

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// HTTP routes
pub mod routes;

/// Server bootstrap
pub mod server;

/// Configuration and error types
pub mod types;
