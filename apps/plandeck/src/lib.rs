//! # plandeck (THE BINARY)
//!
//! Library surface of the Plandeck application: the HTTP API, the CLI, the
//! viewer session driver, and the outbound service clients. The binary in
//! `main.rs` is a thin wrapper over these modules; integration tests build
//! the router directly via `plandeck::api`.

pub mod api;
pub mod cli;
pub mod services;
pub mod sessions;
