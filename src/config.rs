use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::Token;
use crate::error::{CircleTraceError, Result};

const HOST_ENV_VAR: &str = "CIRCLE_HOSTNAME";
const TOKEN_ENV_VAR: &str = "CIRCLE_TOKEN";
const PROJECT_ENV_VAR: &str = "CIRCLE_PROJECT";
const PIPELINE_ID_ENV_VAR: &str = "CIRCLE_PIPELINEID";

/// Where a settings value set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    Environment,
    File(PathBuf),
}

/// Connection settings for a CircleCI server.
///
/// Sourced from environment variables when `CIRCLE_HOSTNAME` is set, otherwise
/// from the first settings document found among `circletrace.{toml,json,yaml,yml}`
/// in the working directory and `.circletrace.yaml` in the home directory.
///
/// The token is stored base64-encoded in both sources; [`Settings::api_token`]
/// decodes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Server base URL (e.g. <https://circleci.example.com>)
    pub hostname: String,

    /// API token, base64-encoded at rest
    pub token: String,

    /// Default project slug (e.g. 'gh/acme/widget-factory')
    #[serde(default)]
    pub project: String,

    /// Pipeline to scan when none is given on the command line
    #[serde(default)]
    pub pipeline_id: Option<String>,

    #[serde(skip)]
    pub source: Option<SettingsSource>,
}

impl Settings {
    /// Loads settings, preferring the environment over settings files.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if std::env::var(HOST_ENV_VAR).is_ok() {
            return Self::from_env();
        }

        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "circletrace.toml",
            "circletrace.json",
            "circletrace.yaml",
            "circletrace.yml",
        ];
        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let path = home.join(".circletrace.yaml");
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Err(CircleTraceError::Config(format!(
            "No settings found: set {HOST_ENV_VAR}/{TOKEN_ENV_VAR} or create circletrace.toml"
        )))
    }

    fn from_env() -> Result<Self> {
        let hostname = std::env::var(HOST_ENV_VAR)
            .map_err(|_| CircleTraceError::Config(format!("{HOST_ENV_VAR} is not set")))?;
        let token = std::env::var(TOKEN_ENV_VAR)
            .map_err(|_| CircleTraceError::Config(format!("{TOKEN_ENV_VAR} is not set")))?;

        Ok(Self {
            hostname,
            token,
            project: std::env::var(PROJECT_ENV_VAR).unwrap_or_default(),
            pipeline_id: std::env::var(PIPELINE_ID_ENV_VAR).ok(),
            source: Some(SettingsSource::Environment),
        })
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CircleTraceError::Config(format!(
                "Failed to read settings file {}: {e}",
                path.display()
            ))
        })?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let mut settings: Settings = match extension {
            "toml" => toml::from_str(&contents).map_err(|e| {
                CircleTraceError::Config(format!("Failed to parse TOML settings: {e}"))
            })?,
            "json" => serde_json::from_str(&contents)?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)?,
            _ => toml::from_str(&contents)
                .ok()
                .or_else(|| serde_json::from_str(&contents).ok())
                .or_else(|| serde_yaml::from_str(&contents).ok())
                .ok_or_else(|| {
                    CircleTraceError::Config(format!(
                        "Failed to parse settings file: {}",
                        path.display()
                    ))
                })?,
        };

        settings.source = Some(SettingsSource::File(path.to_path_buf()));
        Ok(settings)
    }

    /// Decodes the stored token for use on the wire.
    pub fn api_token(&self) -> Result<Token> {
        Token::from_base64(&self.token)
    }
}
