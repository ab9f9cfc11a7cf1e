//! Scripted [`ServiceApi`] for unit tests

use async_trait::async_trait;
use forkgres_models::{Endpoint, ForkServiceRequest, Service, ServiceStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::ServiceApi;
use crate::error::{ForkError, Result};

/// One scripted answer to `get_service`
#[derive(Debug, Clone)]
pub enum Step {
    Status(&'static str),
    /// Transient API failure
    Fail(&'static str),
    /// Failure that must not be retried
    Invalid(&'static str),
    /// Accepts the query and never answers
    Stall,
}

pub fn service(service_id: &str, status: ServiceStatus) -> Service {
    Service {
        service_id: service_id.to_string(),
        project_id: "proj-1".to_string(),
        name: format!("{}-name", service_id),
        region_code: "us-east-1".to_string(),
        status,
        endpoint: Some(Endpoint {
            host: format!("{}.db.example", service_id),
            port: 35432,
        }),
        initial_password: None,
        service_type: Some("TIMESCALEDB".to_string()),
        created: None,
    }
}

/// Answers `get_service` from a script, repeating the last step once the
/// script runs out. Each query takes `latency` of (tokio) time.
pub struct FakeServiceApi {
    script: Vec<Step>,
    latency: Duration,
    get_calls: AtomicUsize,
    fork_requests: Mutex<Vec<ForkServiceRequest>>,
    fork_failure: Option<&'static str>,
    forked: Service,
    deletes: Mutex<Vec<(String, String)>>,
    delete_failure: Option<&'static str>,
}

impl FakeServiceApi {
    pub fn new(script: Vec<Step>) -> Self {
        let mut forked = service("fork-1", ServiceStatus::Queued);
        forked.endpoint = None;
        forked.initial_password = Some("initial-pw-from-fork".to_string());
        Self {
            script,
            latency: Duration::ZERO,
            get_calls: AtomicUsize::new(0),
            fork_requests: Mutex::new(Vec::new()),
            fork_failure: None,
            forked,
            deletes: Mutex::new(Vec::new()),
            delete_failure: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_fork(mut self, message: &'static str) -> Self {
        self.fork_failure = Some(message);
        self
    }

    pub fn failing_delete(mut self, message: &'static str) -> Self {
        self.delete_failure = Some(message);
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn fork_requests(&self) -> Vec<ForkServiceRequest> {
        self.fork_requests.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.deletes.lock().unwrap().clone()
    }

    fn api_error(message: &str) -> ForkError {
        ForkError::Api {
            status: 503,
            code: "SERVICE_UNAVAILABLE".to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl ServiceApi for FakeServiceApi {
    async fn fork_service(
        &self,
        _project_id: &str,
        _service_id: &str,
        request: &ForkServiceRequest,
    ) -> Result<Service> {
        self.fork_requests.lock().unwrap().push(request.clone());
        match self.fork_failure {
            Some(message) => Err(Self::api_error(message)),
            None => Ok(self.forked.clone()),
        }
    }

    async fn get_service(&self, _project_id: &str, service_id: &str) -> Result<Service> {
        let call = self.get_calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let step = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(Step::Status("CONFIGURING"));
        match step {
            Step::Status(status) => Ok(service(service_id, ServiceStatus::from(status))),
            Step::Fail(message) => Err(Self::api_error(message)),
            Step::Invalid(message) => Err(ForkError::Validation(message.to_string())),
            Step::Stall => std::future::pending().await,
        }
    }

    async fn delete_service(&self, project_id: &str, service_id: &str) -> Result<()> {
        self.deletes
            .lock()
            .unwrap()
            .push((project_id.to_string(), service_id.to_string()));
        match self.delete_failure {
            Some(message) => Err(Self::api_error(message)),
            None => Ok(()),
        }
    }
}
