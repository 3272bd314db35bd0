//! Homework Helper HTTP gateway.
//!
//! Wires the usage ledger, the AI answer service and the question log
//! behind an axum router.  `main.rs` only parses the CLI, sets up tracing
//! and serves the app built by [`http::build_app`].

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod http;
pub mod questions;
pub mod state;
