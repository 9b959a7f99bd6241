// Library exports for the CLI and integration tests

pub mod api;
pub mod config;
pub mod confirm;
pub mod duplicates;
pub mod error;
pub mod executor;
pub mod job_monitor;
pub mod logging;
