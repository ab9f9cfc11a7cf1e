//! Fork instance orchestration
//!
//! fork -> record cleanup state -> wait for READY -> emit outputs.
//! Any failure ends the run with the original error and no outputs.

use forkgres_models::Service;
use tokio::time::Instant;

use crate::activities::{fork_service, wait_for_ready::ReadinessPoller};
use crate::activity_types::PollConfig;
use crate::client::{ApiCredentials, ServiceApi};
use crate::error::Result;
use crate::names::{outputs, state};
use crate::outputs::OutputSink;
use crate::redact::register_secret;
use crate::state::StateStore;
use crate::types::{ForkInstanceInput, ForkInstanceOutput};

pub async fn fork_instance_orchestration(
    api: &dyn ServiceApi,
    store: &mut dyn StateStore,
    sink: &mut dyn OutputSink,
    input: &ForkInstanceInput,
    poll_config: PollConfig,
) -> Result<ForkInstanceOutput> {
    register_secret(input.credentials.secret_key());
    register_secret(&input.credentials.to_key_string());

    tracing::info!(
        "Forking service {} in project {} (strategy: {}, cleanup: {})",
        input.fork.service_id,
        input.fork.project_id,
        input.fork.strategy,
        input.cleanup
    );

    let start_time = Instant::now();

    // Step 1: Submit the fork
    tracing::info!("Step 1: Submitting fork request");
    let forked = fork_service::activity(api, &input.fork).await?;
    let fork = forked.service;

    if let Some(password) = &fork.initial_password {
        register_secret(password);
    }

    let project_id = if fork.project_id.is_empty() {
        input.fork.project_id.clone()
    } else {
        fork.project_id.clone()
    };

    // Step 2: Record what the teardown phase needs, before waiting, so a
    // fork that never becomes ready is still cleaned up
    if input.cleanup {
        tracing::info!("Step 2: Recording cleanup state for {}", fork.service_id);
        record_cleanup_state(store, &fork.service_id, &project_id, &input.credentials)?;
    } else {
        tracing::debug!("Step 2: Cleanup disabled, no state recorded");
    }

    // Step 3: Poll until READY
    tracing::info!("Step 3: Waiting for fork {} to become ready", fork.service_id);
    let ready = ReadinessPoller::new(api, poll_config)
        .wait_until_ready(&project_id, &fork.service_id)
        .await?;

    let deployment_time_seconds = start_time.elapsed().as_secs();
    tracing::info!(
        "Fork {} ready in {} seconds",
        fork.service_id,
        deployment_time_seconds
    );

    let output = build_output(&fork, &ready, deployment_time_seconds, forked.advisories);

    // Step 4: Emit outputs
    tracing::info!("Step 4: Emitting outputs");
    emit_outputs(sink, &output)?;

    Ok(output)
}

fn record_cleanup_state(
    store: &mut dyn StateStore,
    service_id: &str,
    project_id: &str,
    credentials: &ApiCredentials,
) -> Result<()> {
    store.set(state::SERVICE_ID, service_id)?;
    store.set(state::PROJECT_ID, project_id)?;
    store.set(state::API_KEY, &credentials.to_key_string())?;
    store.set(state::CLEANUP, "true")?;
    Ok(())
}

/// The READY snapshot carries the endpoint; the initial password is only on
/// the fork response.
fn build_output(
    fork: &Service,
    ready: &Service,
    deployment_time_seconds: u64,
    advisories: Vec<String>,
) -> ForkInstanceOutput {
    let endpoint = ready.endpoint.as_ref().or(fork.endpoint.as_ref());
    let name = if ready.name.is_empty() {
        fork.name.clone()
    } else {
        ready.name.clone()
    };

    ForkInstanceOutput {
        service_id: fork.service_id.clone(),
        name,
        host: endpoint.map(|e| e.host.clone()),
        port: endpoint.map(|e| e.port),
        initial_password: fork
            .initial_password
            .clone()
            .or_else(|| ready.initial_password.clone()),
        deployment_time_seconds,
        advisories,
    }
}

fn emit_outputs(sink: &mut dyn OutputSink, output: &ForkInstanceOutput) -> Result<()> {
    sink.set_output(outputs::SERVICE_ID, &output.service_id)?;
    sink.set_output(outputs::NAME, &output.name)?;

    match (&output.host, output.port) {
        (Some(host), Some(port)) => {
            sink.set_output(outputs::HOST, host)?;
            sink.set_output(outputs::PORT, &port.to_string())?;
        }
        _ => tracing::warn!("Fork {} reported no endpoint", output.service_id),
    }

    match &output.initial_password {
        Some(password) => {
            register_secret(password);
            sink.set_output(outputs::INITIAL_PASSWORD, password)?;
        }
        None => tracing::warn!("Fork {} returned no initial password", output.service_id),
    }

    Ok(())
}
