use super::client::CircleClient;
use super::types::JobItem;

impl CircleClient {
    /// Lists every job of a workflow, in execution-graph order as returned by
    /// the service.
    pub async fn workflow_jobs(&self, workflow_id: &str) -> Vec<JobItem> {
        let endpoint = format!("api/v2/workflow/{workflow_id}/job");
        self.fetch_paged(&endpoint, "continuationToken", None).await
    }
}
