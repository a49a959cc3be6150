pub mod app_config;
pub mod config;
pub mod places;
pub mod target;

use std::path::PathBuf;

use thiserror::Error;

pub use app_config::{AppConfig, CheckpointMode};
pub use config::{load_app_config, CREDENTIALS_FILE_NAME};
pub use places::{GpsCoordinates, PlaceRecord};
pub use target::{slug, CheckpointKey, PageRange, SearchTarget, PAGE_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read credentials file {path}: {source}")]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("missing required setting: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid checkpoint key \"{0}\": expected \"{{zone}}_{{page}}\"")]
    InvalidCheckpointKey(String),
}
