//! Shared configuration for the Flipscout workspace.
//!
//! All configuration is read once from environment variables at process
//! start and passed by reference into the analysis engine and the HTTP
//! layer; aggregation code never does ambient env lookups.

mod app_config;
mod config;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
