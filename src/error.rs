use thiserror::Error;

#[derive(Error, Debug)]
pub enum CircleTraceError {
    #[error("API request failed with status {status}: {endpoint}")]
    Api { status: u16, endpoint: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Build configuration parse error: {0}")]
    Document(#[from] serde_yaml::Error),

    #[error("Build configuration has no `{0}` section")]
    MissingSection(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CircleTraceError>;
