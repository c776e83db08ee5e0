use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope shared by every list endpoint.
///
/// An empty (or absent) `next_page_token` is the sole end-of-data signal.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paged<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One triggered build of a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub errors: Vec<PipelineError>,
    #[serde(default)]
    pub project_slug: String,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub state: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trigger: Trigger,
    pub vcs: Option<Vcs>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineError {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trigger {
    pub received_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub actor: Actor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Version-control facts attached to a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vcs {
    #[serde(default)]
    pub origin_repository_url: String,
    #[serde(default)]
    pub target_repository_url: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub branch: String,
    pub commit: Option<CommitInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitInfo {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub subject: String,
}

/// One named execution graph within a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowItem {
    #[serde(default)]
    pub pipeline_id: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub started_by: String,
    #[serde(default)]
    pub pipeline_number: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// One executable unit within a workflow.
///
/// Approval gates carry no `job_number`, so it stays optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobItem {
    pub job_number: Option<i64>,
    #[serde(default)]
    pub id: String,
    pub started_at: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project_slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub stopped_at: Option<String>,
}

/// Full job record from the project-scoped endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDetails {
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub project: JobProject,
    #[serde(default)]
    pub parallel_runs: Vec<ParallelRun>,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_workflow: WorkflowRef,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub executor: Executor,
    #[serde(default)]
    pub parallelism: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub pipeline: PipelineRef,
    #[serde(default)]
    pub duration: i64,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    #[serde(default)]
    pub contexts: Vec<ContextRef>,
    #[serde(default)]
    pub organization: OrganizationRef,
    pub queued_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProject {
    #[serde(default)]
    pub external_url: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelRun {
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Executor {
    #[serde(default)]
    pub resource_class: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineRef {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationRef {
    #[serde(default)]
    pub name: String,
}

/// One recorded test result for a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestMetadata {
    #[serde(default)]
    pub classname: String,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub run_time: f64,
    #[serde(default)]
    pub source: String,
}

/// One stored artifact for a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactItem {
    #[serde(default)]
    pub node_index: i64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub url: String,
}

/// The four configuration blobs served for a pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub compiled: String,
    #[serde(rename = "setup-config", default)]
    pub setup_config: String,
    #[serde(rename = "compiled-setup-config", default)]
    pub compiled_setup_config: String,
}
