//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Secrets Manager lookup or secret payload failure.
    Secrets(String),
    /// Deduplication store failure other than a duplicate key.
    Dedup(String),
    /// Object storage upload failure.
    Storage(String),
    /// Image model invocation or response decoding failure.
    Model(String),
    /// Slack API transport failure.
    Slack(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Secrets(msg) => write!(f, "secrets: {msg}"),
            Self::Dedup(msg) => write!(f, "dedup: {msg}"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
            Self::Model(msg) => write!(f, "model: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
