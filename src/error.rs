//! Error types for the sakura crate

use thiserror::Error;

/// Main error type
///
/// Generation, caching and simulation never fail; only the edges
/// (config files, theme names, the window, the remote signal) do.
#[derive(Debug, Error)]
pub enum SakuraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown theme '{0}'")]
    UnknownTheme(String),

    #[error("display error: {0}")]
    Display(String),

    #[error("MQTT error: {0}")]
    Mqtt(String),
}

pub type Result<T> = std::result::Result<T, SakuraError>;
