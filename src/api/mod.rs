//! API module for the lecture catalog
//!
//! Provides the REST endpoints consumed by the web player plus static
//! serving of the lecture video files themselves.

pub mod handlers;
pub mod models;
pub mod server;

pub use server::{build_router, start_http_server, AppState};
