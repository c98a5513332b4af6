use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchStatsError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Taxonomy error: {0}")]
    Taxonomy(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {kind} '{name}'")]
    NotFound { kind: String, name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, WatchStatsError>;
