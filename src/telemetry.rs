use serde::{Deserialize, Serialize};

/// Host facts for one job's execution, mined from the two reserved step outputs.
///
/// Every field defaults to empty when its marker never appears in the log text;
/// an absent marker is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentTelemetry {
    /// Commit SHA, from the environment-preparation step output
    pub sha: String,
    /// Build-agent version
    pub agent: String,
    /// Launch-agent (runner) version
    pub runner: String,
    /// VM identifier
    pub vm: String,
    /// Volume label
    pub volume: String,
    /// Machine image
    pub image: String,
}

/// Literal text markers used to locate telemetry in raw step log output.
///
/// The exact phrasing comes from the CI platform's provisioning logs, so it is
/// inherently subject to drift. Swapping a `MarkerSet` is a configuration
/// change, not a code change.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    pub agent_prefix: &'static str,
    pub runner_prefix: &'static str,
    pub vm_open: &'static str,
    pub vm_close: &'static str,
    pub volume_prefix: &'static str,
    pub image_prefix: &'static str,
    pub sha_prefix: &'static str,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            agent_prefix: "Build-agent version",
            runner_prefix: "Launch-agent version",
            vm_open: "VM '",
            vm_close: "' has been created",
            volume_prefix: "Using volume:",
            image_prefix: "using image",
            sha_prefix: "CIRCLE_SHA1=",
        }
    }
}

impl MarkerSet {
    /// Mines agent, runner, VM, volume and image facts from the spin-up step's
    /// log text. First matching line per marker wins; later matches are ignored.
    pub fn mine_host(&self, text: &str) -> EnvironmentTelemetry {
        let mut facts = EnvironmentTelemetry::default();

        for line in text.lines() {
            if facts.agent.is_empty() {
                if let Some(rest) = after_marker(line, self.agent_prefix) {
                    facts.agent = rest.to_string();
                }
            }
            if facts.runner.is_empty() {
                if let Some(rest) = after_marker(line, self.runner_prefix) {
                    facts.runner = rest.to_string();
                }
            }
            if facts.vm.is_empty() {
                if let Some(name) = between_markers(line, self.vm_open, self.vm_close) {
                    facts.vm = name.to_string();
                }
            }
            if facts.volume.is_empty() {
                if let Some(rest) = after_marker(line, self.volume_prefix) {
                    facts.volume = rest.to_string();
                }
            }
            if facts.image.is_empty() {
                if let Some(rest) = after_marker(line, self.image_prefix) {
                    facts.image = rest.to_string();
                }
            }
        }

        facts
    }

    /// Mines the commit SHA from the environment-preparation step's log text.
    pub fn mine_commit(&self, text: &str) -> String {
        text.lines()
            .find_map(|line| after_marker(line, self.sha_prefix))
            .unwrap_or_default()
            .to_string()
    }
}

/// Everything after the first occurrence of `marker`, trimmed. `None` when the
/// line does not contain the marker.
fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker)
        .map(|at| line[at + marker.len()..].trim())
}

/// The text bounded by `open` and `close`, in that order. `None` when either
/// bound is missing.
fn between_markers<'a>(line: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = line.find(open)? + open.len();
    let end = line[start..].find(close)? + start;
    Some(&line[start..end])
}
