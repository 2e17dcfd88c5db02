pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mysql;
pub mod quiz;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::{build_state, AppState};
