use thiserror::Error;

/// Main error type for caption session setup
#[derive(Error, Debug)]
pub enum CaptionError {
    /// A standard I/O error (socket bind, file access)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session configuration failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file could not be parsed
    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// The configuration could not be serialized
    #[error("Config serialization error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// The caption script is not valid JSON or misses fields
    #[error("Caption script error: {0}")]
    Json(#[from] serde_json::Error),

    /// The caption script is structurally valid but unusable
    #[error("Caption script error: {0}")]
    Script(String),

    /// A speaker id outside the known set was encountered
    #[error("Unknown speaker ID encountered: {0}")]
    UnknownSpeaker(String),

    /// A required asset (font, script, bitmap directory) is missing
    #[error("Missing asset: {0}")]
    Asset(String),

    /// A worker thread could not be spawned or panicked
    #[error("Worker thread error: {0}")]
    Thread(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CaptionError>;
