pub mod assessment;
pub mod careers;
pub mod config;
pub mod error;
pub mod telemetry;
