use thiserror::Error;

use crate::core::types::UnitId;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Invalid battle setup: {0}")]
    InvalidSetup(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Decision source unavailable: {0}")]
    DecisionUnavailable(String),

    #[error("Malformed decision: {0}")]
    MalformedDecision(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
