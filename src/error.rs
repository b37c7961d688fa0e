/// Typed errors for configuration and registry failures

use std::path::PathBuf;
use thiserror::Error;

/// Registry configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("env file not found at: {}", path.display())]
    EnvFileNotFound { path: PathBuf },

    #[error("failed to read env file {}: {message}", path.display())]
    EnvFileUnreadable { path: PathBuf, message: String },

    #[error("{name} must be set in the environment or env file")]
    MissingVar { name: &'static str },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Harbor API errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unexpected Harbor response: {status}")]
    UnexpectedStatus { status: u16 },

    #[error("cannot create project: {status} {body}")]
    CreateRejected { status: u16, body: String },
}
