pub mod applications;
pub mod auth;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod users;
