//! Unified error types for the confmod workspace.
//!
//! Composition errors are synchronous and fatal for the call that raised
//! them. Failures of a deferred computation are never represented here:
//! they travel as an opaque [`BoxError`] through the resolver the host
//! container invokes.

use thiserror::Error;

/// Opaque error produced by a deferred computation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ConfmodError {
    /// A configurable unit matches none of the recognized variants.
    #[error(
        "configurable unit {shape} resolved against {argument} is not a valid config base for module"
    )]
    InvalidUnitShape {
        /// Description of the offending unit's shape.
        shape: String,
        /// Rendering of the runtime argument the unit was resolved against.
        argument: String,
    },

    /// A label key is absent from the argument and the strict policy is active.
    #[error("label \"{label}\" is not present in the configuration argument")]
    MissingLabel {
        /// The label that could not be found.
        label: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ConfmodError>;
