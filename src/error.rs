//! Error types for repbot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Transport-related errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Transport {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("Failed to send on transport {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid inbound event: {0}")]
    InvalidEvent(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
