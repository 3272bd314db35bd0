//! Shared types for the Homework Helper gateway: configuration, errors,
//! structured trace events and the user/caller model.

pub mod config;
pub mod error;
pub mod trace;
pub mod user;
