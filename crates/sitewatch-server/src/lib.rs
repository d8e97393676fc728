//! REST API server for the safety alert engine.

pub mod api;
pub mod app;
pub mod config;
pub mod identity;
pub mod logging;
pub mod state;
