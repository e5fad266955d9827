//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode during engine startup. Once the tick loop is running, failures
//! are logged and survived rather than propagated.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: magistrate_core::ConfigError,
    },

    /// World construction failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: magistrate_core::ClockError,
    },

    /// Jurisdiction setup was rejected by the legal aggregate.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying authority error.
        #[from]
        source: magistrate_core::AuthorityError,
    },

    /// Patrol route setup was rejected by the controller.
    #[error("patrol error: {source}")]
    Patrol {
        /// The underlying patrol error.
        #[from]
        source: magistrate_patrol::PatrolError,
    },

    /// The `settlement` section of the config could not be read.
    #[error("settlement error: {message}")]
    Settlement {
        /// Description of the settlement failure.
        message: String,
    },
}
