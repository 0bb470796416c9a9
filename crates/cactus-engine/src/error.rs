//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run loop so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: cactus_core::ConfigError,
    },

    /// The end-of-run report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The log filter could not be built from `logging.level`.
    #[error("invalid log level `{level}`: {message}")]
    Logging {
        /// The configured level string.
        level: String,
        /// Description of the parse failure.
        message: String,
    },
}
