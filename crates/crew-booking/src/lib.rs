pub mod booking;
pub mod clock;
pub mod config;
pub mod error;
pub mod scheduling;
pub mod telemetry;
