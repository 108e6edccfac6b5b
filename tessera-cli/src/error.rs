//! CLI error type.

use thiserror::Error;

use tessera::config::ConfigError;
use tessera::logging::LoggingError;
use tessera::multires::LoadError;
use tessera::tile::TileError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("Tile error: {0}")]
    Tile(#[from] TileError),

    #[error("Resource error: {0}")]
    Load(#[from] LoadError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    Usage(String),

    #[error("Failed to write output: {0}")]
    Output(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => 2,
            _ => 1,
        }
    }
}
