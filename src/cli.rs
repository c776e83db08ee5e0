use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::circle::{CircleClient, ProjectCoords};
use crate::config::Settings;
use crate::correlator::{JobTrace, StepCorrelator};
use crate::hierarchy::{JobReport, PipelineReport, WorkflowReport};
use crate::output::{self, FragmentWriter, ScanProgress};
use crate::scanner::{scan_document, ConfigDocument, DocumentScan};

#[derive(Parser)]
#[command(name = "circletrace")]
#[command(author, version, about = "CircleCI build hierarchy and telemetry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: circletrace.* in the working directory)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct pipeline hierarchies with per-step logs and telemetry
    Scan {
        /// Organization whose pipelines to scan
        #[arg(short, long, env = "CIRCLE_ORG")]
        org: String,

        /// Pipeline listing page cap
        #[arg(long, default_value_t = 2)]
        pages: usize,

        /// Scan a single pipeline id instead of the listing
        #[arg(long)]
        pipeline: Option<String>,

        /// Output file for workflow report fragments
        #[arg(long, default_value = "trace.json")]
        out: PathBuf,
    },

    /// List recent pipelines for an organization
    Pipelines {
        #[arg(short, long, env = "CIRCLE_ORG")]
        org: String,

        #[arg(long, default_value_t = 1)]
        pages: usize,
    },

    /// Show jobs, parameters and orbs declared in a pipeline's configuration
    Config {
        #[arg(short, long)]
        pipeline: String,

        /// Scan the compiled blob instead of the source
        #[arg(long, default_value_t = false)]
        compiled: bool,
    },

    /// Show details, artifacts and test results for one job
    Job {
        /// Project slug (vcs/namespace/project); defaults to the settings value
        #[arg(long)]
        slug: Option<String>,

        #[arg(short, long)]
        number: i64,

        #[arg(long, default_value_t = 1)]
        test_pages: usize,
    },

    /// Verify connectivity and credentials
    Check,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Scan {
                org,
                pages,
                pipeline,
                out,
            } => {
                self.execute_scan(org, *pages, pipeline.as_deref(), out)
                    .await
            }
            Commands::Pipelines { org, pages } => self.execute_pipelines(org, *pages).await,
            Commands::Config { pipeline, compiled } => {
                self.execute_config(pipeline, *compiled).await
            }
            Commands::Job {
                slug,
                number,
                test_pages,
            } => self.execute_job(slug.as_deref(), *number, *test_pages).await,
            Commands::Check => self.execute_check().await,
        }
    }

    fn client(&self) -> Result<(Settings, CircleClient)> {
        let settings = Settings::load(self.settings.as_deref())?;
        let client = CircleClient::new(&settings.hostname, settings.api_token()?)?;
        Ok((settings, client))
    }

    async fn execute_scan(
        &self,
        org: &str,
        pages: usize,
        pipeline: Option<&str>,
        out: &PathBuf,
    ) -> Result<()> {
        let (settings, client) = self.client()?;
        info!("Scanning pipelines for organization: {org}");

        let pipeline = pipeline.or(settings.pipeline_id.as_deref());
        let pipelines = match pipeline {
            Some(id) => vec![client.pipeline_by_id(id).await?],
            None => client.list_pipelines(org, pages).await,
        };

        let mut writer = FragmentWriter::create(out)?;
        let progress = ScanProgress::start();
        let correlator = StepCorrelator::new(&client);

        let mut scanned = 0usize;
        for pipeline in &pipelines {
            progress.note(format!("pipeline {} ({})", pipeline.number, pipeline.state));

            let config = match client.pipeline_config(&pipeline.id).await {
                Ok(config) => config,
                Err(e) => {
                    warn!("No configuration for pipeline {}: {e}", pipeline.id);
                    continue;
                }
            };
            // the compiled blob carries the expanded job list the service ran
            let doc = match ConfigDocument::parse(&config.compiled) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Unreadable configuration for pipeline {}: {e}", pipeline.id);
                    continue;
                }
            };

            let workflows = client.pipeline_workflows(&pipeline.id).await;
            let mut workflow_reports = Vec::with_capacity(workflows.len());

            for workflow in &workflows {
                progress.note(format!(
                    "workflow {} of pipeline {}",
                    workflow.name, pipeline.number
                ));

                let coords = match ProjectCoords::from_slug(&workflow.project_slug) {
                    Ok(coords) => coords,
                    Err(e) => {
                        warn!("Skipping workflow {}: {e}", workflow.id);
                        continue;
                    }
                };

                let jobs = client.workflow_jobs(&workflow.id).await;
                let mut job_reports = Vec::with_capacity(jobs.len());
                for job in &jobs {
                    // approval gates never ran anything; record them bare
                    let Some(job_number) = job.job_number else {
                        job_reports.push(JobReport::assemble(job, JobTrace::default()));
                        continue;
                    };
                    let trace = correlator
                        .correlate(&doc, &job.name, job_number, &coords)
                        .await?;
                    job_reports.push(JobReport::assemble(job, trace));
                }

                let report = WorkflowReport::assemble(workflow, job_reports);
                writer.append_fragment(std::slice::from_ref(&report))?;
                workflow_reports.push(report);
            }

            let report = PipelineReport::assemble(pipeline, workflow_reports);
            progress.log(output::scan_summary_line(&report));
            scanned += 1;
        }

        writer.finish()?;
        progress.finish(format!(
            "Scanned {scanned} pipelines into {}",
            out.display()
        ));

        Ok(())
    }

    async fn execute_pipelines(&self, org: &str, pages: usize) -> Result<()> {
        let (_, client) = self.client()?;
        let pipelines = client.list_pipelines(org, pages).await;
        output::print_pipelines(&pipelines);
        Ok(())
    }

    async fn execute_config(&self, pipeline: &str, compiled: bool) -> Result<()> {
        let (_, client) = self.client()?;
        let config = client.pipeline_config(pipeline).await?;
        let blob = if compiled {
            &config.compiled
        } else {
            &config.source
        };

        // an unreadable document yields empty collections, not a failure
        let scan = match scan_document(blob) {
            Ok(scan) => scan,
            Err(e) => {
                warn!("Unreadable configuration for pipeline {pipeline}: {e}");
                DocumentScan::default()
            }
        };
        output::print_document_scan(&scan);
        Ok(())
    }

    async fn execute_job(
        &self,
        slug: Option<&str>,
        number: i64,
        test_pages: usize,
    ) -> Result<()> {
        let (settings, client) = self.client()?;
        let slug = slug.unwrap_or(&settings.project);
        let coords = ProjectCoords::from_slug(slug)?;

        let details = client.job_details(&coords, number).await?;
        println!(
            "{} #{} [{}] executor={}/{} parallelism={} duration={}s",
            details.name,
            details.number,
            details.status,
            details.executor.kind,
            details.executor.resource_class,
            details.parallelism,
            details.duration,
        );

        let artifacts = client.job_artifacts(slug, number).await;
        println!("artifacts: {}", artifacts.len());
        for artifact in &artifacts {
            println!("  {}", artifact.path);
        }

        let tests = client.test_metadata(&coords, number, test_pages).await;
        let failed = tests.iter().filter(|t| t.result == "failure").count();
        println!("tests: {} recorded, {} failed", tests.len(), failed);

        Ok(())
    }

    async fn execute_check(&self) -> Result<()> {
        let (settings, client) = self.client()?;
        let ok = client.verify_connection().await;
        println!(
            "Connection to {} was successful -> {ok}",
            settings.hostname
        );
        Ok(())
    }
}
