use crate::error::{CircleTraceError, Result};

use super::client::CircleClient;
use super::types::{ArtifactItem, JobDetails, TestMetadata};

/// The vcs/namespace/project triple encoded in a project slug
/// (e.g. `gh/acme/widget-factory`), needed by the job-scoped endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCoords {
    pub vcs: String,
    pub namespace: String,
    pub project: String,
}

impl ProjectCoords {
    /// Splits a project slug into its three segments.
    ///
    /// # Errors
    ///
    /// Returns an error unless the slug has exactly three non-empty
    /// `/`-separated segments.
    pub fn from_slug(slug: &str) -> Result<Self> {
        let segments: Vec<&str> = slug.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            [vcs, namespace, project]
                if !vcs.is_empty() && !namespace.is_empty() && !project.is_empty() =>
            {
                Ok(Self {
                    vcs: (*vcs).to_string(),
                    namespace: (*namespace).to_string(),
                    project: (*project).to_string(),
                })
            }
            _ => Err(CircleTraceError::Config(format!(
                "Project slug must be vcs/namespace/project, got: {slug}"
            ))),
        }
    }
}

impl CircleClient {
    /// Fetches the full job record for a job number.
    pub async fn job_details(&self, coords: &ProjectCoords, job_number: i64) -> Result<JobDetails> {
        let endpoint = format!(
            "api/v2/project/{}/{}/{}/job/{job_number}",
            coords.vcs, coords.namespace, coords.project
        );
        self.get_json(&endpoint).await
    }

    /// Lists every artifact stored for a job.
    pub async fn job_artifacts(&self, project: &str, job_number: i64) -> Vec<ArtifactItem> {
        let endpoint = format!("api/v2/project/{project}/{job_number}/artifacts");
        self.fetch_paged(&endpoint, "continuationToken", None).await
    }

    /// Lists recorded test results for a job, bounded by `max_pages`.
    pub async fn test_metadata(
        &self,
        coords: &ProjectCoords,
        job_number: i64,
        max_pages: usize,
    ) -> Vec<TestMetadata> {
        let endpoint = format!(
            "api/v2/project/{}/{}/{}/{job_number}/tests",
            coords.vcs, coords.namespace, coords.project
        );
        self.fetch_paged(&endpoint, "continuationToken", Some(max_pages))
            .await
    }

    /// Fetches the raw log text of one step, keyed by its ordinal.
    pub async fn step_output(
        &self,
        coords: &ProjectCoords,
        job_number: i64,
        step_ordinal: u32,
    ) -> Result<String> {
        let endpoint = format!(
            "api/v1.1/project/{}/{}/{}/{job_number}/output/{step_ordinal}/0?file=true",
            coords.vcs, coords.namespace, coords.project
        );
        self.get_text(&endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;

    fn test_client(server: &mockito::ServerGuard) -> CircleClient {
        CircleClient::new(&server.url(), Token::from("test-token")).unwrap()
    }

    fn coords() -> ProjectCoords {
        ProjectCoords::from_slug("gh/acme/widget-factory").unwrap()
    }

    #[test]
    fn test_project_coords_from_slug() {
        assert_eq!(
            coords(),
            ProjectCoords {
                vcs: "gh".into(),
                namespace: "acme".into(),
                project: "widget-factory".into(),
            }
        );
        // trailing slash is tolerated
        assert!(ProjectCoords::from_slug("gh/acme/widget-factory/").is_ok());
    }

    #[test]
    fn test_project_coords_rejects_malformed_slugs() {
        assert!(ProjectCoords::from_slug("acme/widget-factory").is_err());
        assert!(ProjectCoords::from_slug("gh//widget-factory").is_err());
        assert!(ProjectCoords::from_slug("gh/acme/widget/extra").is_err());
        assert!(ProjectCoords::from_slug("").is_err());
    }

    #[tokio::test]
    async fn test_job_details_decodes_executor() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/project/gh/acme/widget-factory/job/42")
            .with_body(
                r#"{"name": "build", "number": 42, "status": "success",
                    "parallelism": 2,
                    "executor": {"resource_class": "large", "type": "machine"},
                    "latest_workflow": {"name": "main", "id": "w1"}}"#,
            )
            .create_async()
            .await;

        let details = test_client(&server).job_details(&coords(), 42).await.unwrap();
        assert_eq!(details.executor.resource_class, "large");
        assert_eq!(details.parallelism, 2);
        assert_eq!(details.latest_workflow.name, "main");
    }

    #[tokio::test]
    async fn test_step_output_fetches_raw_text_by_ordinal() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock(
                "GET",
                "/api/v1.1/project/gh/acme/widget-factory/42/output/99/0?file=true",
            )
            .with_body("  CIRCLE_SHA1=deadbeef\n")
            .create_async()
            .await;

        let output = test_client(&server)
            .step_output(&coords(), 42, 99)
            .await
            .unwrap();
        assert_eq!(output, "  CIRCLE_SHA1=deadbeef\n");
    }

    #[tokio::test]
    async fn test_job_artifacts_paginates() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/api/v2/project/gh/acme/widget-factory/42/artifacts")
            .with_body(
                r#"{"items": [{"node_index": 0, "path": "report.xml", "url": "https://x/report.xml"}],
                    "next_page_token": ""}"#,
            )
            .create_async()
            .await;

        let artifacts = test_client(&server)
            .job_artifacts("gh/acme/widget-factory", 42)
            .await;
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, "report.xml");
    }
}
