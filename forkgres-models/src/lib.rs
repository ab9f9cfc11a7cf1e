use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A user-supplied value that does not map onto a known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} '{value}': expected {expected}")]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}

// ============================================================================
// Fork strategy
// ============================================================================

/// How the fork is seeded from its parent service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ForkStrategy {
    /// Fork from the parent's current state
    #[serde(rename = "NOW")]
    Now,
    /// Fork from the most recent snapshot
    #[serde(rename = "LAST_SNAPSHOT")]
    LastSnapshot,
    /// Point-in-time recovery to `target_time`
    #[serde(rename = "PITR")]
    PointInTime,
}

impl ForkStrategy {
    /// Selector string accepted on input (`now`, `last-snapshot`, `timestamp`)
    pub fn selector(&self) -> &'static str {
        match self {
            ForkStrategy::Now => "now",
            ForkStrategy::LastSnapshot => "last-snapshot",
            ForkStrategy::PointInTime => "timestamp",
        }
    }

    pub fn requires_target_time(&self) -> bool {
        matches!(self, ForkStrategy::PointInTime)
    }
}

impl FromStr for ForkStrategy {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "now" => Ok(ForkStrategy::Now),
            "last-snapshot" => Ok(ForkStrategy::LastSnapshot),
            "timestamp" => Ok(ForkStrategy::PointInTime),
            _ => Err(InvalidValue {
                field: "strategy",
                value: s.to_string(),
                expected: "one of 'now', 'last-snapshot', 'timestamp'",
            }),
        }
    }
}

impl fmt::Display for ForkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

// ============================================================================
// Compute sizing
// ============================================================================

/// What to do with a sizing override that is neither numeric nor `shared`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SizingPolicy {
    /// Reject it before any request is made
    #[default]
    Strict,
    /// Send it to the provider unchanged
    Passthrough,
}

impl FromStr for SizingPolicy {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SizingPolicy::Strict),
            "passthrough" => Ok(SizingPolicy::Passthrough),
            _ => Err(InvalidValue {
                field: "sizing policy",
                value: s.to_string(),
                expected: "'strict' or 'passthrough'",
            }),
        }
    }
}

/// CPU or memory override. Serialized as a string token on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Sizing {
    /// The provider's shared-compute tier
    Shared,
    /// Millicores for CPU, gigabytes for memory
    Amount(u64),
    /// Unrecognized token kept verbatim (passthrough policy only)
    Raw(String),
}

impl Sizing {
    pub fn parse(field: &'static str, value: &str, policy: SizingPolicy) -> Result<Self, InvalidValue> {
        if value.eq_ignore_ascii_case("shared") {
            return Ok(Sizing::Shared);
        }
        if let Ok(amount) = value.parse::<u64>() {
            return Ok(Sizing::Amount(amount));
        }
        match policy {
            SizingPolicy::Passthrough => Ok(Sizing::Raw(value.to_string())),
            SizingPolicy::Strict => Err(InvalidValue {
                field,
                value: value.to_string(),
                expected: "a whole number or 'shared'",
            }),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Sizing::Raw(_))
    }
}

impl fmt::Display for Sizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sizing::Shared => f.write_str("shared"),
            Sizing::Amount(amount) => write!(f, "{}", amount),
            Sizing::Raw(raw) => f.write_str(raw),
        }
    }
}

impl From<Sizing> for String {
    fn from(sizing: Sizing) -> Self {
        sizing.to_string()
    }
}

// ============================================================================
// Fork request (wire body)
// ============================================================================

/// Body of `POST /projects/{p}/services/{s}/forkService`.
///
/// Absent optional fields are left out of the JSON entirely so the provider
/// inherits them from the parent service.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ForkServiceRequest {
    pub fork_strategy: ForkStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_millis: Option<Sizing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_gbs: Option<Sizing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
}

impl ForkServiceRequest {
    pub fn new(fork_strategy: ForkStrategy) -> Self {
        Self {
            fork_strategy,
            name: None,
            cpu_millis: None,
            memory_gbs: None,
            target_time: None,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Lifecycle status reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceStatus {
    Queued,
    Configuring,
    Ready,
    Deleting,
    Deleted,
    Unstable,
    Pausing,
    Paused,
    Resuming,
    Upgrading,
    Optimizing,
    /// A value this client does not know about yet
    Other(String),
}

/// How the readiness poller treats a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ready,
    TerminalFailure,
    InProgress,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ServiceStatus::Queued => "QUEUED",
            ServiceStatus::Configuring => "CONFIGURING",
            ServiceStatus::Ready => "READY",
            ServiceStatus::Deleting => "DELETING",
            ServiceStatus::Deleted => "DELETED",
            ServiceStatus::Unstable => "UNSTABLE",
            ServiceStatus::Pausing => "PAUSING",
            ServiceStatus::Paused => "PAUSED",
            ServiceStatus::Resuming => "RESUMING",
            ServiceStatus::Upgrading => "UPGRADING",
            ServiceStatus::Optimizing => "OPTIMIZING",
            ServiceStatus::Other(raw) => raw,
        }
    }

    /// Only READY and the explicit failure list are final; unknown values
    /// keep the poller waiting.
    pub fn class(&self) -> StatusClass {
        match self {
            ServiceStatus::Ready => StatusClass::Ready,
            ServiceStatus::Deleted | ServiceStatus::Unstable => StatusClass::TerminalFailure,
            _ => StatusClass::InProgress,
        }
    }
}

impl From<String> for ServiceStatus {
    fn from(raw: String) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "QUEUED" => ServiceStatus::Queued,
            "CONFIGURING" => ServiceStatus::Configuring,
            "READY" => ServiceStatus::Ready,
            "DELETING" => ServiceStatus::Deleting,
            "DELETED" => ServiceStatus::Deleted,
            "UNSTABLE" => ServiceStatus::Unstable,
            "PAUSING" => ServiceStatus::Pausing,
            "PAUSED" => ServiceStatus::Paused,
            "RESUMING" => ServiceStatus::Resuming,
            "UPGRADING" => ServiceStatus::Upgrading,
            "OPTIMIZING" => ServiceStatus::Optimizing,
            _ => ServiceStatus::Other(raw),
        }
    }
}

impl From<&str> for ServiceStatus {
    fn from(raw: &str) -> Self {
        ServiceStatus::from(raw.to_string())
    }
}

impl From<ServiceStatus> for String {
    fn from(status: ServiceStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network endpoint of a service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// A managed database service as returned by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub service_id: String,
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region_code: String,
    pub status: ServiceStatus,
    #[serde(default)]
    pub endpoint: Option<Endpoint>,
    /// Only present on the response that created the service
    #[serde(default)]
    pub initial_password: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

// ============================================================================
// Cleanup state handed from the fork phase to the teardown phase
// ============================================================================

/// Identifiers the teardown phase needs to delete a fork
#[derive(Clone, PartialEq, Eq)]
pub struct CleanupState {
    pub service_id: String,
    pub project_id: String,
    /// API key in `PUBLIC:SECRET` form
    pub api_key: String,
}

impl fmt::Debug for CleanupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupState")
            .field("service_id", &self.service_id)
            .field("project_id", &self.project_id)
            .field("api_key", &"***")
            .finish()
    }
}
