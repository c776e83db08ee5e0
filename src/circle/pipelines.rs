use crate::error::Result;

use super::client::CircleClient;
use super::types::{PipelineConfig, PipelineItem, WorkflowItem};

impl CircleClient {
    /// Lists pipelines for an organization, newest first, bounded by
    /// `max_pages`. The `mine=false` flag is always sent so the listing covers
    /// the whole organization rather than the token owner's triggers.
    pub async fn list_pipelines(&self, org: &str, max_pages: usize) -> Vec<PipelineItem> {
        let endpoint = format!("api/v2/pipeline?org-slug=gh/{org}&mine=false");
        self.fetch_paged(&endpoint, "page-token", Some(max_pages))
            .await
    }

    /// Fetches a single pipeline by id.
    pub async fn pipeline_by_id(&self, pipeline_id: &str) -> Result<PipelineItem> {
        self.get_json(&format!("api/v2/pipeline/{pipeline_id}"))
            .await
    }

    /// Lists every workflow of a pipeline.
    pub async fn pipeline_workflows(&self, pipeline_id: &str) -> Vec<WorkflowItem> {
        let endpoint = format!("api/v2/pipeline/{pipeline_id}/workflow");
        self.fetch_paged(&endpoint, "continuationToken", None).await
    }

    /// Fetches the source/compiled configuration blobs for a pipeline.
    pub async fn pipeline_config(&self, pipeline_id: &str) -> Result<PipelineConfig> {
        self.get_json(&format!("api/v2/pipeline/{pipeline_id}/config"))
            .await
    }
}
