//! Loads the raw fees CSV export from Cloud Storage into a native,
//! day-partitioned BigQuery table.
//!
//! [`job::run`] is the single operation; `src/main.rs` and the
//! `cloud_run_main` binary are thin adapters around it.

pub mod auth;
pub mod config;
pub mod error;
pub mod job;
pub mod schema;
pub mod telemetry;
pub mod trigger;
pub mod warehouse;

pub use config::LoaderConfig;
pub use error::{ErrorKind, IngestError};
pub use job::{run, run_with, IngestReport};
