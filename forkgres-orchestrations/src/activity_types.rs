//! Input and output types for forkgres activities

use forkgres_models::{Service, ServiceStatus, SizingPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Fork Service Activity
// ============================================================================

/// Raw fork parameters as supplied by the caller, validated by the activity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ForkServiceInput {
    /// Project owning the parent service
    pub project_id: String,
    /// Parent service to fork
    pub service_id: String,
    /// Strategy selector: `now`, `last-snapshot` or `timestamp`
    pub strategy: String,
    /// RFC 3339 timestamp, required for `timestamp`
    pub target_time: Option<String>,
    /// Name for the fork (default: provider-chosen)
    pub name: Option<String>,
    /// CPU in millicores or `shared` (default: inherit from parent)
    pub cpu: Option<String>,
    /// Memory in GB or `shared` (default: inherit from parent)
    pub memory: Option<String>,
    /// Handling of sizing values that are neither numeric nor `shared`
    #[serde(default)]
    pub sizing_policy: SizingPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForkServiceOutput {
    /// The newly created fork
    pub service: Service,
    /// Non-fatal notes about ignored or unusual input
    pub advisories: Vec<String>,
}

// ============================================================================
// Wait For Ready Activity
// ============================================================================

/// Readiness polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Overall budget; the only bound on retries
    pub timeout: Duration,
    /// Pause between status queries
    pub interval: Duration,
    /// Cadence of progress log lines, anchored to the start of polling
    pub log_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30 * 60),
            interval: Duration::from_secs(10),
            log_interval: Duration::from_secs(60),
        }
    }
}

/// How a poll ended. There is no in-progress variant.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Latest snapshot, which reports READY
    Ready(Service),
    TerminalFailure(ServiceStatus),
    /// Time spent polling when the deadline tripped
    TimedOut(Duration),
}

// ============================================================================
// Delete Service Activity
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteServiceInput {
    pub project_id: String,
    pub service_id: String,
}
