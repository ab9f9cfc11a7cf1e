//! Fork service activity
//!
//! Validates the caller's fork parameters, builds the request body and
//! submits it once. Submission failures are returned as-is, never retried.

use chrono::{DateTime, NaiveDateTime};
use forkgres_models::{ForkServiceRequest, ForkStrategy, Sizing};

use crate::activity_types::{ForkServiceInput, ForkServiceOutput};
use crate::client::ServiceApi;
use crate::error::{ForkError, Result};

pub async fn activity(api: &dyn ServiceApi, input: &ForkServiceInput) -> Result<ForkServiceOutput> {
    let (request, advisories) = build_request(input)?;

    for advisory in &advisories {
        tracing::warn!("{}", advisory);
    }

    tracing::info!(
        project_id = %input.project_id,
        service_id = %input.service_id,
        strategy = %request.fork_strategy,
        "Submitting fork request"
    );

    let service = api
        .fork_service(&input.project_id, &input.service_id, &request)
        .await?;

    tracing::info!(
        fork_id = %service.service_id,
        status = %service.status,
        "Fork created"
    );

    Ok(ForkServiceOutput {
        service,
        advisories,
    })
}

/// Validate `input` and build the wire request plus any advisories.
/// Nothing here touches the network.
pub fn build_request(input: &ForkServiceInput) -> Result<(ForkServiceRequest, Vec<String>)> {
    if input.project_id.trim().is_empty() {
        return Err(ForkError::Validation("project_id is required".to_string()));
    }
    if input.service_id.trim().is_empty() {
        return Err(ForkError::Validation("service_id is required".to_string()));
    }

    let strategy: ForkStrategy = input.strategy.parse()?;
    let mut advisories = Vec::new();
    let mut request = ForkServiceRequest::new(strategy);

    let target_time = supplied(&input.target_time);
    match (strategy.requires_target_time(), target_time) {
        (true, None) => {
            return Err(ForkError::Validation(format!(
                "target_time is required when strategy is '{}'",
                strategy.selector()
            )));
        }
        (true, Some(target_time)) => {
            validate_timestamp(target_time)?;
            request.target_time = Some(target_time.to_string());
        }
        (false, Some(target_time)) => {
            advisories.push(format!(
                "target_time '{}' is ignored because strategy is '{}'",
                target_time,
                strategy.selector()
            ));
        }
        (false, None) => {}
    }

    request.name = supplied(&input.name).map(str::to_string);
    request.cpu_millis = sizing("cpu", &input.cpu, input, &mut advisories)?;
    request.memory_gbs = sizing("memory", &input.memory, input, &mut advisories)?;

    Ok((request, advisories))
}

/// Treat empty or whitespace-only values as not supplied
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn sizing(
    field: &'static str,
    value: &Option<String>,
    input: &ForkServiceInput,
    advisories: &mut Vec<String>,
) -> Result<Option<Sizing>> {
    let Some(value) = supplied(value) else {
        return Ok(None);
    };
    let sizing = Sizing::parse(field, value, input.sizing_policy)?;
    if sizing.is_raw() {
        advisories.push(format!(
            "{} value '{}' is neither a number nor 'shared'; sending it unchanged",
            field, value
        ));
    }
    Ok(Some(sizing))
}

fn validate_timestamp(value: &str) -> Result<()> {
    if DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
    {
        return Ok(());
    }
    Err(ForkError::Validation(format!(
        "target_time '{}' is not an ISO-8601 timestamp (e.g. 2024-05-01T12:00:00Z)",
        value
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServiceApi;
    use forkgres_models::SizingPolicy;

    fn input(strategy: &str) -> ForkServiceInput {
        ForkServiceInput {
            project_id: "proj-1".to_string(),
            service_id: "parent-1".to_string(),
            strategy: strategy.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unknown_strategy_makes_no_request() {
        let api = FakeServiceApi::new(vec![]);
        for strategy in ["", "pitr", "snapshot", "NOW ", "last_snapshot"] {
            let err = activity(&api, &input(strategy)).await.unwrap_err();
            match err {
                ForkError::Validation(message) => assert!(message.contains(&format!("'{}'", strategy))),
                other => panic!("unexpected error: {:?}", other),
            }
        }
        assert!(api.fork_requests().is_empty());
    }

    #[tokio::test]
    async fn test_timestamp_without_target_time_is_rejected() {
        let api = FakeServiceApi::new(vec![]);
        for target_time in [None, Some(String::new()), Some("   ".to_string())] {
            let mut input = input("timestamp");
            input.target_time = target_time;
            let err = activity(&api, &input).await.unwrap_err();
            match err {
                ForkError::Validation(message) => assert!(message.starts_with("target_time is required")),
                other => panic!("unexpected error: {:?}", other),
            }
        }
        assert!(api.fork_requests().is_empty());
    }

    #[tokio::test]
    async fn test_timestamp_sends_pitr_and_target_time() {
        let api = FakeServiceApi::new(vec![]);
        let mut input = input("TIMESTAMP");
        input.target_time = Some("2024-05-01T12:00:00Z".to_string());

        let output = activity(&api, &input).await.unwrap();
        assert!(output.advisories.is_empty());

        let requests = api.fork_requests();
        assert_eq!(requests.len(), 1);
        let body = serde_json::to_value(&requests[0]).unwrap();
        assert_eq!(body["fork_strategy"], "PITR");
        assert_eq!(body["target_time"], "2024-05-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_target_time_ignored_for_other_strategies() {
        for strategy in ["now", "last-snapshot"] {
            let api = FakeServiceApi::new(vec![]);
            let mut input = input(strategy);
            input.target_time = Some("2024-05-01T12:00:00Z".to_string());

            let output = activity(&api, &input).await.unwrap();
            assert_eq!(output.advisories.len(), 1);
            assert!(output.advisories[0].contains("ignored"));

            let body = serde_json::to_value(&api.fork_requests()[0]).unwrap();
            assert!(body.get("target_time").is_none());
        }
    }

    #[tokio::test]
    async fn test_invalid_target_time_is_rejected() {
        let api = FakeServiceApi::new(vec![]);
        let mut input = input("timestamp");
        input.target_time = Some("yesterday".to_string());
        let err = activity(&api, &input).await.unwrap_err();
        assert!(matches!(err, ForkError::Validation(_)));
        assert!(api.fork_requests().is_empty());
    }

    #[test]
    fn test_naive_timestamp_is_accepted() {
        let mut input = input("timestamp");
        input.target_time = Some("2024-05-01T12:00:00".to_string());
        let (request, _) = build_request(&input).unwrap();
        assert_eq!(request.target_time.as_deref(), Some("2024-05-01T12:00:00"));
    }

    #[test]
    fn test_omitted_optionals_are_absent_keys() {
        let (request, advisories) = build_request(&input("now")).unwrap();
        assert!(advisories.is_empty());
        let body = serde_json::to_value(&request).unwrap();
        let object = body.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["fork_strategy"]);
        assert_eq!(body["fork_strategy"], "NOW");
    }

    #[test]
    fn test_supplied_optionals_are_sent() {
        let mut input = input("last-snapshot");
        input.name = Some("ci-fork".to_string());
        input.cpu = Some("2000".to_string());
        input.memory = Some("Shared".to_string());

        let (request, _) = build_request(&input).unwrap();
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["fork_strategy"], "LAST_SNAPSHOT");
        assert_eq!(body["name"], "ci-fork");
        assert_eq!(body["cpu_millis"], "2000");
        assert_eq!(body["memory_gbs"], "shared");
    }

    #[test]
    fn test_empty_name_is_not_sent() {
        let mut input = input("now");
        input.name = Some(String::new());
        let (request, _) = build_request(&input).unwrap();
        assert!(request.name.is_none());
    }

    #[test]
    fn test_malformed_sizing_under_strict_policy() {
        let mut input = input("now");
        input.cpu = Some("lots".to_string());
        let err = build_request(&input).unwrap_err();
        match err {
            ForkError::Validation(message) => {
                assert!(message.contains("cpu"));
                assert!(message.contains("lots"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_sizing_under_passthrough_policy() {
        let mut input = input("now");
        input.memory = Some("4GB".to_string());
        input.sizing_policy = SizingPolicy::Passthrough;

        let (request, advisories) = build_request(&input).unwrap();
        assert_eq!(advisories.len(), 1);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["memory_gbs"], "4GB");
    }

    #[test]
    fn test_missing_identifiers_are_rejected() {
        let mut input = input("now");
        input.project_id = String::new();
        assert!(matches!(build_request(&input), Err(ForkError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submission_error_is_returned_unchanged() {
        let api = FakeServiceApi::new(vec![]).failing_fork("quota exceeded");
        let err = activity(&api, &input("now")).await.unwrap_err();
        match err {
            ForkError::Api { message, .. } => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected error: {:?}", other),
        }
        // One attempt only
        assert_eq!(api.fork_requests().len(), 1);
    }
}
