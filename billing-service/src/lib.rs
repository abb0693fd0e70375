pub mod api;
pub mod catalog;
pub mod config;
pub mod import;
pub mod metrics_server;
pub mod observability;

pub use api::{router, AppState};
