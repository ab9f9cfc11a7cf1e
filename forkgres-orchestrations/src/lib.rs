//! Forkgres Orchestrations - fork, readiness polling and teardown of managed
//! PostgreSQL services
//!
//! The fork phase submits a fork of an existing service, waits for it to
//! become ready and emits its connection details. A later, separate teardown
//! phase deletes the fork using state recorded by the fork phase.
//!
//! # Usage
//!
//! ```rust,no_run
//! use forkgres_orchestrations::client::{ApiCredentials, CloudClient, DEFAULT_API_URL};
//! use forkgres_orchestrations::orchestrations::fork_instance::fork_instance_orchestration;
//! use forkgres_orchestrations::outputs::StdoutOutputSink;
//! use forkgres_orchestrations::state::FileStateStore;
//! use forkgres_orchestrations::{ForkInstanceInput, ForkServiceInput, PollConfig};
//!
//! # async fn example() -> Result<(), forkgres_orchestrations::error::ForkError> {
//! let credentials: ApiCredentials = "public:secret".parse()?;
//! let api = CloudClient::new(DEFAULT_API_URL, credentials.clone());
//! let mut store = FileStateStore::new("/tmp/forkgres.state");
//! let mut sink = StdoutOutputSink;
//!
//! let input = ForkInstanceInput {
//!     fork: ForkServiceInput {
//!         project_id: "proj".to_string(),
//!         service_id: "svc".to_string(),
//!         strategy: "last-snapshot".to_string(),
//!         ..Default::default()
//!     },
//!     credentials,
//!     cleanup: true,
//! };
//! fork_instance_orchestration(&api, &mut store, &mut sink, &input, PollConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod names;
pub mod types;
pub mod activity_types;
pub mod error;
pub mod client;
pub mod redact;
pub mod state;
pub mod outputs;

pub mod activities;
pub mod orchestrations;

mod kv_file;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use types::*;
pub use activity_types::*;
