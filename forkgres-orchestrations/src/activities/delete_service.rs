//! Delete service activity
//!
//! Issues a single delete request. Deletion completion is not awaited.

use crate::activity_types::DeleteServiceInput;
use crate::client::ServiceApi;
use crate::error::Result;

pub async fn activity(api: &dyn ServiceApi, input: &DeleteServiceInput) -> Result<()> {
    tracing::info!(
        project_id = %input.project_id,
        service_id = %input.service_id,
        "Deleting service"
    );

    api.delete_service(&input.project_id, &input.service_id).await?;

    tracing::info!(service_id = %input.service_id, "Delete request accepted");
    Ok(())
}
