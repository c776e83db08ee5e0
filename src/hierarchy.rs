use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::circle::types::{JobItem, PipelineItem, WorkflowItem};
use crate::correlator::JobTrace;
use crate::telemetry::EnvironmentTelemetry;

/// One step of a job as it actually ran: declaration fields plus the captured
/// log output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub output: String,
}

/// One job of a workflow with its correlated steps and mined host facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_number: Option<i64>,
    pub id: String,
    pub started_at: Option<String>,
    pub name: String,
    pub project_slug: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub stopped_at: Option<String>,
    pub environment: EnvironmentTelemetry,
    pub steps: Vec<StepRecord>,
}

impl JobReport {
    pub fn assemble(job: &JobItem, trace: JobTrace) -> Self {
        Self {
            job_number: job.job_number,
            id: job.id.clone(),
            started_at: job.started_at.clone(),
            name: job.name.clone(),
            project_slug: job.project_slug.clone(),
            status: job.status.clone(),
            kind: job.kind.clone(),
            stopped_at: job.stopped_at.clone(),
            environment: trace.telemetry,
            steps: trace.steps,
        }
    }
}

/// One workflow of a pipeline with its job reports, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub pipeline_id: String,
    pub id: String,
    pub name: String,
    pub project_slug: String,
    pub status: String,
    pub started_by: String,
    pub pipeline_number: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub jobs: Vec<JobReport>,
}

impl WorkflowReport {
    pub fn assemble(workflow: &WorkflowItem, jobs: Vec<JobReport>) -> Self {
        Self {
            pipeline_id: workflow.pipeline_id.clone(),
            id: workflow.id.clone(),
            name: workflow.name.clone(),
            project_slug: workflow.project_slug.clone(),
            status: workflow.status.clone(),
            started_by: workflow.started_by.clone(),
            pipeline_number: workflow.pipeline_number,
            created_at: workflow.created_at,
            stopped_at: workflow.stopped_at,
            tag: workflow.tag.clone(),
            jobs,
        }
    }
}

/// The top of the reconstructed hierarchy: one pipeline with its workflow
/// reports, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub id: String,
    pub number: i64,
    pub state: String,
    #[serde(default)]
    pub revision: String,
    #[serde(default)]
    pub branch: String,
    pub created_at: Option<DateTime<Utc>>,
    pub workflows: Vec<WorkflowReport>,
}

impl PipelineReport {
    pub fn assemble(pipeline: &PipelineItem, workflows: Vec<WorkflowReport>) -> Self {
        let (revision, branch) = pipeline
            .vcs
            .as_ref()
            .map(|vcs| (vcs.revision.clone(), vcs.branch.clone()))
            .unwrap_or_default();

        Self {
            id: pipeline.id.clone(),
            number: pipeline.number,
            state: pipeline.state.clone(),
            revision,
            branch,
            created_at: pipeline.created_at,
            workflows,
        }
    }
}
