use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum HavenError {
    #[error("escalation already recorded for post {0}")]
    DuplicateEscalation(Uuid),

    #[error("invalid escalation transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, HavenError>;
