//! HTTP API.

pub mod contract;
pub mod server;

pub use server::{AppState, build_router, start_server};
