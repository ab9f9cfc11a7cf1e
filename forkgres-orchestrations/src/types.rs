//! Input and output types for forkgres orchestrations

use serde::{Deserialize, Serialize};

use crate::activity_types::ForkServiceInput;
use crate::client::ApiCredentials;

// ============================================================================
// Fork Instance Orchestration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ForkInstanceInput {
    /// What to fork and how
    pub fork: ForkServiceInput,
    /// Credentials the API client was built with; persisted for teardown
    pub credentials: ApiCredentials,
    /// Record state so a later teardown phase deletes the fork
    pub cleanup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForkInstanceOutput {
    /// Service id of the fork
    pub service_id: String,
    /// Display name of the fork
    pub name: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Initial database password (redacted in logs)
    pub initial_password: Option<String>,
    /// Time from fork submission to READY (seconds)
    pub deployment_time_seconds: u64,
    /// Non-fatal notes raised while validating the request
    pub advisories: Vec<String>,
}

// ============================================================================
// Cleanup Instance Orchestration
// ============================================================================

/// Result of the teardown phase. Every variant counts as success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CleanupOutcome {
    /// Cleanup flag unset or false
    Disabled,
    /// Flag set but required entries are missing or unusable
    Incomplete { missing: Vec<String> },
    /// Persisted state could not be read
    StateUnavailable { error: String },
    /// Delete request accepted
    Deleted { service_id: String },
    /// Delete request failed; reported as a warning only
    DeleteFailed { service_id: String, error: String },
}
