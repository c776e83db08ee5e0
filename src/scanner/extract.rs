use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::error::Result;

use super::document::{scalar_str, ConfigDocument};

/// Execution-environment descriptor for one declared job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEnvironment {
    /// Scalar `machine` value, when the job declares one (e.g. `true`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
    /// Machine image, from `image` or a map-shaped `machine.image`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_class: Option<String>,
}

/// A build-configuration input declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,
}

/// A reusable configuration package reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orb {
    pub name: String,
    pub version: OrbVersion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbVersion {
    /// Declared as a plain `name: version` string
    Pinned(String),
    /// Declared inline as a map rather than a registry reference
    Embedded,
}

/// Everything the scanner recovers from one configuration document, in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentScan {
    pub jobs: IndexMap<String, JobEnvironment>,
    pub parameters: IndexMap<String, Parameter>,
    pub orbs: Vec<Orb>,
}

/// Scans raw configuration text into typed job, parameter and orb records.
///
/// The document is parsed exactly once and walked once; a malformed document is
/// an error and nothing partial is returned. Top-level sections other than
/// `jobs`, `parameters` and `orbs` are ignored.
pub fn scan_document(text: &str) -> Result<DocumentScan> {
    let doc = ConfigDocument::parse(text)?;
    Ok(DocumentScan {
        jobs: extract_jobs(&doc),
        parameters: extract_parameters(&doc),
        orbs: extract_orbs(&doc),
    })
}

/// Every direct child of the `jobs` mapping, with its environment descriptor
/// resolved. Absent fields are omitted rather than rendered as marker strings.
pub fn extract_jobs(doc: &ConfigDocument) -> IndexMap<String, JobEnvironment> {
    let Some(jobs) = doc.section("jobs") else {
        return IndexMap::new();
    };

    jobs.iter()
        .filter_map(|(key, _)| key.as_str())
        .map(|name| {
            let machine = doc.lookup_str(&format!("jobs.{name}.machine"));
            // a map-shaped machine carries the image one level down
            let image = doc
                .lookup_str(&format!("jobs.{name}.image"))
                .or_else(|| doc.lookup_str(&format!("jobs.{name}.machine.image")));
            let resource_class = doc.lookup_str(&format!("jobs.{name}.resource_class"));
            (
                name.to_string(),
                JobEnvironment {
                    machine,
                    image,
                    resource_class,
                },
            )
        })
        .collect()
}

/// Every direct child of the `parameters` mapping with its `default`, `type`
/// and `enum` fields.
pub fn extract_parameters(doc: &ConfigDocument) -> IndexMap<String, Parameter> {
    let Some(parameters) = doc.section("parameters") else {
        return IndexMap::new();
    };

    parameters
        .iter()
        .filter_map(|(key, _)| key.as_str())
        .map(|name| {
            let enum_values = doc
                .lookup(&format!("parameters.{name}.enum"))
                .and_then(Value::as_sequence)
                .map(|seq| seq.iter().filter_map(scalar_str).collect())
                .unwrap_or_default();
            (
                name.to_string(),
                Parameter {
                    default: doc.lookup_str(&format!("parameters.{name}.default")),
                    kind: doc.lookup_str(&format!("parameters.{name}.type")),
                    enum_values,
                },
            )
        })
        .collect()
}

/// Every direct child of the `orbs` mapping. A string-valued child is a pinned
/// registry reference; a map-valued child is an embedded orb, and one level of
/// `orbs` nested inside it contributes additional records resolved via
/// root-level key-path lookup.
pub fn extract_orbs(doc: &ConfigDocument) -> Vec<Orb> {
    let Some(orbs) = doc.section("orbs") else {
        return Vec::new();
    };

    let mut records = Vec::new();
    for (key, value) in orbs {
        let Some(name) = key.as_str() else { continue };

        match value {
            Value::Mapping(embedded) => {
                records.push(Orb {
                    name: name.to_string(),
                    version: OrbVersion::Embedded,
                });
                let nested = embedded
                    .iter()
                    .find(|(k, _)| k.as_str() == Some("orbs"))
                    .and_then(|(_, v)| v.as_mapping());
                if let Some(nested) = nested {
                    for (nested_key, _) in nested {
                        let Some(nested_name) = nested_key.as_str() else {
                            continue;
                        };
                        let version = doc
                            .lookup_str(&format!("orbs.{name}.orbs.{nested_name}"))
                            .map(OrbVersion::Pinned)
                            .unwrap_or(OrbVersion::Embedded);
                        records.push(Orb {
                            name: nested_name.to_string(),
                            version,
                        });
                    }
                }
            }
            _ => {
                if let Some(version) = scalar_str(value) {
                    records.push(Orb {
                        name: name.to_string(),
                        version: OrbVersion::Pinned(version),
                    });
                }
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
version: 2.1

orbs:
  foo: circleci/foo@1.0.0
  bar:
    orbs:
      baz: circleci/baz@2.0.0
    commands:
      greet:
        steps:
          - run: echo hi

parameters:
  deploy-target:
    type: enum
    default: staging
    enum: [staging, production]
  dry-run:
    type: boolean
    default: false

jobs:
  build:
    machine: true
    resource_class: large
    steps:
      - checkout
  test:
    machine:
      image: ubuntu-2204:current
    steps:
      - run: make test

workflows:
  main:
    jobs: [build, test]
";

    #[test]
    fn test_extracts_jobs_in_declaration_order() {
        let scan = scan_document(DOC).unwrap();
        let names: Vec<_> = scan.jobs.keys().cloned().collect();
        assert_eq!(names, ["build", "test"]);

        let build = &scan.jobs["build"];
        assert_eq!(build.machine.as_deref(), Some("true"));
        assert_eq!(build.resource_class.as_deref(), Some("large"));
        assert_eq!(build.image, None);

        // map-shaped machine: scalar omitted, image resolved one level down
        let test = &scan.jobs["test"];
        assert_eq!(test.machine, None);
        assert_eq!(test.image.as_deref(), Some("ubuntu-2204:current"));
        assert_eq!(test.resource_class, None);
    }

    #[test]
    fn test_extracts_parameters_with_defaults_and_enums() {
        let scan = scan_document(DOC).unwrap();
        assert_eq!(scan.parameters.len(), 2);

        let target = &scan.parameters["deploy-target"];
        assert_eq!(target.kind.as_deref(), Some("enum"));
        assert_eq!(target.default.as_deref(), Some("staging"));
        assert_eq!(target.enum_values, ["staging", "production"]);

        let dry_run = &scan.parameters["dry-run"];
        assert_eq!(dry_run.kind.as_deref(), Some("boolean"));
        assert_eq!(dry_run.default.as_deref(), Some("false"));
        assert!(dry_run.enum_values.is_empty());
    }

    #[test]
    fn test_orb_nesting_one_level() {
        let scan = scan_document(DOC).unwrap();
        assert_eq!(
            scan.orbs,
            vec![
                Orb {
                    name: "foo".into(),
                    version: OrbVersion::Pinned("circleci/foo@1.0.0".into()),
                },
                Orb {
                    name: "bar".into(),
                    version: OrbVersion::Embedded,
                },
                Orb {
                    name: "baz".into(),
                    version: OrbVersion::Pinned("circleci/baz@2.0.0".into()),
                },
            ]
        );
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let first = scan_document(DOC).unwrap();
        let second = scan_document(DOC).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_sections_yield_empty_collections() {
        let scan = scan_document("version: 2.1\n").unwrap();
        assert!(scan.jobs.is_empty());
        assert!(scan.parameters.is_empty());
        assert!(scan.orbs.is_empty());
    }

    #[test]
    fn test_malformed_document_returns_no_partial_structure() {
        assert!(scan_document("jobs:\n  build: [unclosed").is_err());
    }
}
