use futures::future::join_all;
use log::warn;
use serde_yaml::Value;

use crate::circle::{CircleClient, ProjectCoords};
use crate::error::Result;
use crate::hierarchy::StepRecord;
use crate::scanner::{scalar_str, ConfigDocument};
use crate::telemetry::{EnvironmentTelemetry, MarkerSet};

/// Reserved ordinal for the platform's implicit environment spin-up phase.
const SPIN_UP_ORDINAL: u32 = 0;
/// Reserved ordinal for the implicit environment-variable preparation phase.
const PREPARE_ENV_ORDINAL: u32 = 99;
/// Declared steps are numbered from here, in declaration order.
const FIRST_DECLARED_ORDINAL: u32 = 100;

const SPIN_UP_NAME: &str = "Spin up environment";
const PREPARE_ENV_NAME: &str = "Preparing environment variables";

/// What actually ran for one job: the ordered step records and the host facts
/// mined from the reserved step outputs.
#[derive(Debug, Default)]
pub struct JobTrace {
    pub steps: Vec<StepRecord>,
    pub telemetry: EnvironmentTelemetry,
}

/// Correlates a job's declared step list with the log output the service
/// captured for each step.
pub struct StepCorrelator<'a> {
    client: &'a CircleClient,
    markers: MarkerSet,
}

impl<'a> StepCorrelator<'a> {
    pub fn new(client: &'a CircleClient) -> Self {
        Self {
            client,
            markers: MarkerSet::default(),
        }
    }

    /// Swaps the telemetry marker set, for log formats that have drifted from
    /// the defaults.
    pub fn with_markers(client: &'a CircleClient, markers: MarkerSet) -> Self {
        Self { client, markers }
    }

    /// Produces the ordered step records for one job.
    ///
    /// The two synthetic platform steps (`0`, `99`) always come first and feed
    /// the telemetry miner; declared steps follow with ordinals from 100 in
    /// declaration order. Individual log fetches that fail leave that step's
    /// output empty.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration document has no `jobs` section
    /// at all — a scan against the wrong blob, which would otherwise be
    /// indistinguishable from a job with no declared steps.
    pub async fn correlate(
        &self,
        doc: &ConfigDocument,
        job_name: &str,
        job_number: i64,
        coords: &ProjectCoords,
    ) -> Result<JobTrace> {
        let declared = doc.job_steps(job_name)?;

        let spin_up = self.fetch_output(coords, job_number, SPIN_UP_ORDINAL).await;
        let prepare = self
            .fetch_output(coords, job_number, PREPARE_ENV_ORDINAL)
            .await;

        let mut telemetry = self.markers.mine_host(&spin_up);
        telemetry.sha = self.markers.mine_commit(&prepare);

        let mut steps = vec![
            StepRecord {
                id: SPIN_UP_ORDINAL,
                name: SPIN_UP_NAME.to_string(),
                output: spin_up,
                ..StepRecord::default()
            },
            StepRecord {
                id: PREPARE_ENV_ORDINAL,
                name: PREPARE_ENV_NAME.to_string(),
                output: prepare,
                ..StepRecord::default()
            },
        ];

        if let Some(entries) = declared {
            // step logs are read-only and independent; fetch them concurrently
            // and reassemble in ordinal order
            let fetches = entries.iter().enumerate().map(|(index, entry)| {
                self.declared_step(coords, job_number, FIRST_DECLARED_ORDINAL + index as u32, entry)
            });
            steps.extend(join_all(fetches).await);
        }

        Ok(JobTrace { steps, telemetry })
    }

    /// Builds the record for one declared step entry.
    ///
    /// A bare string is the step name, with log output fetched only for the
    /// literal `checkout`. A single-key mapping names the step after its key;
    /// a string value replaces the name, a mapping value contributes the
    /// `command`/`path`/`when`/`key` fields, and the log is always fetched.
    async fn declared_step(
        &self,
        coords: &ProjectCoords,
        job_number: i64,
        ordinal: u32,
        entry: &Value,
    ) -> StepRecord {
        let mut record = StepRecord {
            id: ordinal,
            ..StepRecord::default()
        };

        match entry {
            Value::String(name) => {
                record.name = name.clone();
                if name == "checkout" {
                    record.output = self.fetch_output(coords, job_number, ordinal).await;
                }
            }
            Value::Mapping(map) => {
                let Some((key, value)) = map.iter().next() else {
                    return record;
                };
                record.name = key.as_str().unwrap_or_default().to_string();

                match value {
                    Value::String(name) => record.name = name.clone(),
                    Value::Mapping(fields) => {
                        for (field, field_value) in fields {
                            let rendered = || render_value(field_value);
                            match field.as_str() {
                                Some("command") => record.command = rendered(),
                                Some("path") => record.path = rendered(),
                                Some("when") => record.when = rendered(),
                                Some("key") => record.key = rendered(),
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }

                record.output = self.fetch_output(coords, job_number, ordinal).await;
            }
            _ => {}
        }

        record
    }

    async fn fetch_output(
        &self,
        coords: &ProjectCoords,
        job_number: i64,
        ordinal: u32,
    ) -> String {
        match self.client.step_output(coords, job_number, ordinal).await {
            Ok(text) => text,
            Err(e) => {
                warn!("No output for step {ordinal} of job {job_number}: {e}");
                String::new()
            }
        }
    }
}

/// Renders a step field value: scalars directly, anything else as YAML text
/// (a `when` guard may be a full condition mapping).
fn render_value(value: &Value) -> String {
    scalar_str(value)
        .or_else(|| serde_yaml::to_string(value).ok().map(|s| s.trim_end().to_string()))
        .unwrap_or_default()
}
