//! Cleanup instance orchestration
//!
//! Runs in a later, separate invocation. Reads the state recorded by the fork
//! phase and issues one delete request. Problems are reported as warnings;
//! this phase never fails the run.

use crate::activities::delete_service;
use crate::activity_types::DeleteServiceInput;
use crate::client::{ApiCredentials, ServiceApi};
use crate::names::state;
use crate::redact::register_secret;
use crate::state::StateStore;
use crate::types::CleanupOutcome;

pub async fn cleanup_instance_orchestration<A, F>(
    store: &mut dyn StateStore,
    connect: F,
) -> CleanupOutcome
where
    A: ServiceApi,
    F: FnOnce(ApiCredentials) -> A,
{
    let outcome = match read_enabled(store) {
        Ok(true) => cleanup_recorded_fork(store, connect).await,
        Ok(false) => {
            tracing::info!("Cleanup not requested, nothing to do");
            CleanupOutcome::Disabled
        }
        Err(error) => {
            tracing::warn!("Could not read cleanup state, skipping cleanup: {}", error);
            CleanupOutcome::StateUnavailable { error }
        }
    };

    // State is single-use
    if let Err(err) = store.clear() {
        tracing::warn!("Failed to discard cleanup state: {}", err);
    }

    outcome
}

fn read_enabled(store: &dyn StateStore) -> Result<bool, String> {
    let flag = store.get(state::CLEANUP).map_err(|e| e.to_string())?;
    Ok(flag
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false))
}

async fn cleanup_recorded_fork<A, F>(store: &dyn StateStore, connect: F) -> CleanupOutcome
where
    A: ServiceApi,
    F: FnOnce(ApiCredentials) -> A,
{
    let mut missing = Vec::new();
    let mut read = |key: &'static str| -> Option<String> {
        match store.get(key) {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value),
            Ok(_) => {
                missing.push(key.to_string());
                None
            }
            Err(err) => {
                tracing::warn!("Failed to read '{}' from cleanup state: {}", key, err);
                missing.push(key.to_string());
                None
            }
        }
    };

    let service_id = read(state::SERVICE_ID);
    let project_id = read(state::PROJECT_ID);
    let api_key = read(state::API_KEY);

    let credentials = api_key.and_then(|key| match key.parse::<ApiCredentials>() {
        Ok(credentials) => Some(credentials),
        Err(_) => {
            missing.push(state::API_KEY.to_string());
            None
        }
    });

    let (Some(service_id), Some(project_id), Some(credentials)) = (service_id, project_id, credentials) else {
        tracing::warn!(
            "Cleanup requested but state is incomplete (missing: {}); skipping delete",
            missing.join(", ")
        );
        return CleanupOutcome::Incomplete { missing };
    };

    register_secret(credentials.secret_key());
    register_secret(&credentials.to_key_string());

    let api = connect(credentials);
    let input = DeleteServiceInput {
        project_id,
        service_id: service_id.clone(),
    };

    match delete_service::activity(&api, &input).await {
        Ok(()) => {
            tracing::info!("Fork {} deleted", service_id);
            CleanupOutcome::Deleted { service_id }
        }
        Err(err) => {
            tracing::warn!("Failed to delete fork {}: {}", service_id, err);
            CleanupOutcome::DeleteFailed {
                service_id,
                error: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStateStore;
    use crate::testing::FakeServiceApi;
    use std::sync::Arc;

    /// Shares one fake between the test and the orchestration
    struct SharedApi(Arc<FakeServiceApi>);

    #[async_trait::async_trait]
    impl ServiceApi for SharedApi {
        async fn fork_service(
            &self,
            project_id: &str,
            service_id: &str,
            request: &forkgres_models::ForkServiceRequest,
        ) -> crate::error::Result<forkgres_models::Service> {
            self.0.fork_service(project_id, service_id, request).await
        }

        async fn get_service(
            &self,
            project_id: &str,
            service_id: &str,
        ) -> crate::error::Result<forkgres_models::Service> {
            self.0.get_service(project_id, service_id).await
        }

        async fn delete_service(&self, project_id: &str, service_id: &str) -> crate::error::Result<()> {
            self.0.delete_service(project_id, service_id).await
        }
    }

    fn recorded_store() -> MemoryStateStore {
        let mut store = MemoryStateStore::new();
        store.set(state::CLEANUP, "true").unwrap();
        store.set(state::SERVICE_ID, "fork-1").unwrap();
        store.set(state::PROJECT_ID, "proj-1").unwrap();
        store.set(state::API_KEY, "public:cleanup-secret").unwrap();
        store
    }

    #[tokio::test]
    async fn test_flag_unset_is_a_no_op() {
        let api = Arc::new(FakeServiceApi::new(vec![]));
        let mut store = MemoryStateStore::new();

        let outcome = cleanup_instance_orchestration(&mut store, |_| SharedApi(api.clone())).await;

        assert_eq!(outcome, CleanupOutcome::Disabled);
        assert!(api.deletes().is_empty());
    }

    #[tokio::test]
    async fn test_flag_false_is_a_no_op() {
        let api = Arc::new(FakeServiceApi::new(vec![]));
        let mut store = recorded_store();
        store.set(state::CLEANUP, "false").unwrap();

        let outcome = cleanup_instance_orchestration(&mut store, |_| SharedApi(api.clone())).await;

        assert_eq!(outcome, CleanupOutcome::Disabled);
        assert!(api.deletes().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_field_skips_delete() {
        let api = Arc::new(FakeServiceApi::new(vec![]));
        let mut store = MemoryStateStore::new();
        store.set(state::CLEANUP, "true").unwrap();
        store.set(state::SERVICE_ID, "fork-1").unwrap();
        store.set(state::API_KEY, "public:cleanup-secret").unwrap();

        let outcome = cleanup_instance_orchestration(&mut store, |_| SharedApi(api.clone())).await;

        assert_eq!(
            outcome,
            CleanupOutcome::Incomplete {
                missing: vec![state::PROJECT_ID.to_string()]
            }
        );
        assert!(api.deletes().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_api_key_skips_delete() {
        let api = Arc::new(FakeServiceApi::new(vec![]));
        let mut store = recorded_store();
        store.set(state::API_KEY, "no-separator").unwrap();

        let outcome = cleanup_instance_orchestration(&mut store, |_| SharedApi(api.clone())).await;

        assert_eq!(
            outcome,
            CleanupOutcome::Incomplete {
                missing: vec![state::API_KEY.to_string()]
            }
        );
        assert!(api.deletes().is_empty());
    }

    #[tokio::test]
    async fn test_recorded_fork_is_deleted_with_persisted_credentials() {
        let api = Arc::new(FakeServiceApi::new(vec![]));
        let mut store = recorded_store();
        let mut seen_credentials = None;

        let outcome = cleanup_instance_orchestration(&mut store, |credentials| {
            seen_credentials = Some(credentials);
            SharedApi(api.clone())
        })
        .await;

        assert_eq!(
            outcome,
            CleanupOutcome::Deleted {
                service_id: "fork-1".to_string()
            }
        );
        assert_eq!(api.deletes(), vec![("proj-1".to_string(), "fork-1".to_string())]);
        assert_eq!(
            seen_credentials,
            Some(ApiCredentials::new("public", "cleanup-secret"))
        );
        assert_eq!(api.get_calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_failure_is_only_a_warning() {
        let api = Arc::new(FakeServiceApi::new(vec![]).failing_delete("service already gone"));
        let mut store = recorded_store();

        let outcome = cleanup_instance_orchestration(&mut store, |_| SharedApi(api.clone())).await;

        match outcome {
            CleanupOutcome::DeleteFailed { service_id, error } => {
                assert_eq!(service_id, "fork-1");
                assert!(error.contains("service already gone"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        // No retry
        assert_eq!(api.deletes().len(), 1);
    }
}
