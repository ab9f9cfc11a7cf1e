//! Wait for a forked service to become ready
//!
//! A single sequential loop: check the deadline, query the status once,
//! then either finish or sleep for the poll interval. READY and the
//! terminal-failure statuses end the loop immediately. Query errors that are
//! transient are logged and retried; the overall timeout is the only bound
//! on retries. A query that is still outstanding when the budget runs out is
//! abandoned and the poll times out. Progress lines are emitted on a cadence anchored to the start
//! of polling, so slow queries do not make the cadence drift.

use forkgres_models::{Service, ServiceStatus, StatusClass};
use std::time::Duration;
use tokio::time::Instant;

use crate::activity_types::{PollConfig, PollOutcome};
use crate::client::ServiceApi;
use crate::error::{ForkError, Result};

/// Receives the poller's progress and warning observations
pub trait PollObserver: Send + Sync {
    fn on_progress(&self, service_id: &str, status: &ServiceStatus, elapsed: Duration);

    fn on_transient_error(&self, service_id: &str, error: &ForkError);
}

/// Logs observations through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PollObserver for TracingObserver {
    fn on_progress(&self, service_id: &str, status: &ServiceStatus, elapsed: Duration) {
        tracing::info!(
            service_id,
            status = %status,
            elapsed_secs = elapsed.as_secs(),
            "Service {} is {} ({}s elapsed)",
            service_id,
            status,
            elapsed.as_secs()
        );
    }

    fn on_transient_error(&self, service_id: &str, error: &ForkError) {
        tracing::warn!(service_id, "Status check failed, retrying: {}", error);
    }
}

static TRACING_OBSERVER: TracingObserver = TracingObserver;

pub struct ReadinessPoller<'a> {
    api: &'a dyn ServiceApi,
    config: PollConfig,
    observer: &'a dyn PollObserver,
}

impl<'a> ReadinessPoller<'a> {
    pub fn new(api: &'a dyn ServiceApi, config: PollConfig) -> Self {
        Self {
            api,
            config,
            observer: &TRACING_OBSERVER,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn PollObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Poll until the service resolves. `Err` is only returned for a query
    /// error that is not worth retrying.
    pub async fn poll(&self, project_id: &str, service_id: &str) -> Result<PollOutcome> {
        let started = Instant::now();
        // None once the cadence runs past the clock's range
        let mut next_log = started.checked_add(self.config.log_interval);

        loop {
            let elapsed = started.elapsed();
            if elapsed > self.config.timeout {
                return Ok(PollOutcome::TimedOut(elapsed));
            }

            let remaining = self.config.timeout.saturating_sub(elapsed);
            let query = self.api.get_service(project_id, service_id);
            let Ok(result) = tokio::time::timeout(remaining, query).await else {
                tracing::debug!(service_id, "Status check still pending at the deadline");
                return Ok(PollOutcome::TimedOut(started.elapsed()));
            };

            match result {
                Ok(service) => match service.status.class() {
                    StatusClass::Ready => return Ok(PollOutcome::Ready(service)),
                    StatusClass::TerminalFailure => {
                        return Ok(PollOutcome::TerminalFailure(service.status))
                    }
                    StatusClass::InProgress => {
                        let now = Instant::now();
                        tracing::debug!(service_id, status = %service.status, "Service not ready yet");
                        if let Some(checkpoint) = next_log.filter(|at| now >= *at) {
                            self.observer
                                .on_progress(service_id, &service.status, now - started);
                            next_log = checkpoint.checked_add(self.config.log_interval);
                        }
                    }
                },
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => self.observer.on_transient_error(service_id, &err),
            }

            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// Poll and turn every non-ready outcome into an error naming the service
    pub async fn wait_until_ready(&self, project_id: &str, service_id: &str) -> Result<Service> {
        tracing::info!(
            service_id,
            timeout_secs = self.config.timeout.as_secs(),
            "Waiting for service to become ready"
        );

        match self.poll(project_id, service_id).await? {
            PollOutcome::Ready(service) => {
                tracing::info!(service_id, "Service is ready");
                Ok(service)
            }
            PollOutcome::TerminalFailure(status) => Err(ForkError::TerminalFailure {
                service_id: service_id.to_string(),
                status,
            }),
            PollOutcome::TimedOut(_) => Err(ForkError::Timeout {
                service_id: service_id.to_string(),
                timeout: self.config.timeout,
            }),
        }
    }
}

pub async fn activity(
    api: &dyn ServiceApi,
    config: PollConfig,
    project_id: &str,
    service_id: &str,
) -> Result<Service> {
    ReadinessPoller::new(api, config)
        .wait_until_ready(project_id, service_id)
        .await
}
