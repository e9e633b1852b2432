pub mod api;
pub mod config;
pub mod settlement;
pub mod state;
pub mod telemetry;
