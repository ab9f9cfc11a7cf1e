use forkgres_orchestrations::client::CloudClient;
use forkgres_orchestrations::orchestrations::cleanup_instance::cleanup_instance_orchestration;
use forkgres_orchestrations::state::FileStateStore;
use forkgres_orchestrations::CleanupOutcome;

use crate::config::Config;

/// Never fails; problems are logged as warnings
pub async fn run_cleanup(config: &Config) {
    let mut store = FileStateStore::new(&config.state_file);
    tracing::debug!("Reading cleanup state from {}", store.path().display());

    let outcome = cleanup_instance_orchestration(&mut store, |credentials| {
        CloudClient::new(&config.api_url, credentials)
    })
    .await;

    match &outcome {
        CleanupOutcome::Deleted { service_id } => {
            tracing::info!("✓ Fork {} deletion requested", service_id)
        }
        CleanupOutcome::Disabled => tracing::info!("Nothing to clean up"),
        other => {
            let detail = serde_json::to_string(other).unwrap_or_else(|_| format!("{:?}", other));
            tracing::warn!("Cleanup did not complete: {}", detail)
        }
    }
}
