//! Error taxonomy for fork, readiness polling and teardown

use forkgres_models::{InvalidValue, ServiceStatus};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForkError {
    /// Rejected locally; no request was sent
    #[error("{0}")]
    Validation(String),

    #[error("{method} {url} failed: {cause}")]
    Network {
        method: String,
        url: String,
        cause: String,
    },

    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Malformed response from {url}: {detail}")]
    MalformedResponse { url: String, detail: String },

    #[error("Service {service_id} entered terminal status {status}")]
    TerminalFailure {
        service_id: String,
        status: ServiceStatus,
    },

    #[error("Timed out after {}s waiting for service {service_id} to become ready", .timeout.as_secs())]
    Timeout {
        service_id: String,
        timeout: Duration,
    },

    #[error("Failed to record fork state: {0}")]
    State(#[from] StateError),
}

impl ForkError {
    /// Errors the readiness poller may retry until its deadline
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ForkError::Network { .. } | ForkError::Api { .. } | ForkError::MalformedResponse { .. }
        )
    }
}

impl From<InvalidValue> for ForkError {
    fn from(err: InvalidValue) -> Self {
        ForkError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ForkError>;

/// Failures reading or writing the output and state files
#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid state entry: {0}")]
    Format(String),
}
