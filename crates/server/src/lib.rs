//! Library file server: authenticated listing and download of the library
//! folder, plus health, config and metrics endpoints.

pub mod api;
pub mod download_log;
pub mod metrics;
pub mod state;
