//! `hh-ai`: client for the AI answer service.
//!
//! [`AiBackend`] is the seam the chat endpoint talks to; [`RestAiClient`]
//! is the production implementation that calls `POST {base_url}/chat`.

pub mod backend;
pub mod rest;

pub use backend::AiBackend;
pub use rest::{from_reqwest, RestAiClient};
