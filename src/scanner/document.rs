use serde_yaml::{Mapping, Sequence, Value};

use crate::error::{CircleTraceError, Result};

/// A parsed build-configuration document.
///
/// One `serde_yaml` parse produces the navigable tree; all structure discovery
/// and all value resolution read from it. Declaration order is preserved by the
/// underlying mapping type, so scanner output order equals document order.
///
/// Indentation handling is delegated wholly to YAML syntax: tab indentation and
/// irregular indent widths fail the parse and no partial structure is returned.
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    /// Parses raw configuration text. A malformed document is an error; callers
    /// never see a partially-built tree.
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)?;
        Ok(Self { root })
    }

    /// Resolves a dot-separated key path (e.g. `jobs.build.machine`) against the
    /// tree. `None` when any segment is missing or a non-mapping is traversed.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            if !current.is_mapping() {
                return None;
            }
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Resolves a key path to a scalar rendered as a string. Absent keys and
    /// non-scalar values are `None` — there is no sentinel marker string.
    pub fn lookup_str(&self, path: &str) -> Option<String> {
        self.lookup(path).and_then(scalar_str)
    }

    /// A named top-level section, when present and map-shaped.
    pub fn section(&self, name: &str) -> Option<&Mapping> {
        self.root.get(name)?.as_mapping()
    }

    /// The declared step list for one job: `jobs.<job_name>.steps`.
    ///
    /// A document with no `jobs` mapping at all is fatal for the scan; a known
    /// `jobs` mapping without this job (or without a step sequence under it)
    /// yields `Ok(None)` and the caller proceeds with synthetic steps only.
    pub fn job_steps(&self, job_name: &str) -> Result<Option<&Sequence>> {
        if self.section("jobs").is_none() {
            return Err(CircleTraceError::MissingSection("jobs"));
        }
        Ok(self
            .lookup(&format!("jobs.{job_name}.steps"))
            .and_then(Value::as_sequence))
    }
}

/// Renders a scalar YAML value to a string. Mappings, sequences and nulls are
/// not scalars and yield `None`.
pub(crate) fn scalar_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
version: 2.1
jobs:
  build:
    machine: true
    resource_class: large
    steps:
      - checkout
      - run: make
";

    #[test]
    fn test_lookup_resolves_nested_paths() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        assert_eq!(doc.lookup_str("jobs.build.machine").as_deref(), Some("true"));
        assert_eq!(
            doc.lookup_str("jobs.build.resource_class").as_deref(),
            Some("large")
        );
        assert_eq!(doc.lookup_str("version").as_deref(), Some("2.1"));
    }

    #[test]
    fn test_lookup_absent_path_is_none() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        assert!(doc.lookup("jobs.build.image").is_none());
        assert!(doc.lookup("jobs.deploy.machine").is_none());
        assert!(doc.lookup("jobs.build.steps.deeper").is_none());
    }

    #[test]
    fn test_non_scalar_values_render_as_none() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        assert!(doc.lookup_str("jobs.build").is_none());
        assert!(doc.lookup_str("jobs.build.steps").is_none());
    }

    #[test]
    fn test_job_steps_found() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        let steps = doc.job_steps("build").unwrap().unwrap();
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_job_steps_unknown_job_is_none() {
        let doc = ConfigDocument::parse(DOC).unwrap();
        assert!(doc.job_steps("deploy").unwrap().is_none());
    }

    #[test]
    fn test_job_steps_without_jobs_section_is_fatal() {
        let doc = ConfigDocument::parse("workflows:\n  main:\n    jobs: [build]\n").unwrap();
        assert!(matches!(
            doc.job_steps("build"),
            Err(CircleTraceError::MissingSection("jobs"))
        ));
    }

    #[test]
    fn test_malformed_document_fails_parse() {
        assert!(ConfigDocument::parse("jobs:\n  build: [unclosed").is_err());
        assert!(ConfigDocument::parse("jobs:\n\tbuild: tab-indented").is_err());
    }
}
