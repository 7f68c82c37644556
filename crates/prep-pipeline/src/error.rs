//! Error types for the preprocessing pipeline.
//!
//! Every stage propagates failures unchanged to the caller of
//! [`Preprocessor::process`](crate::Preprocessor::process); nothing is
//! retried or swallowed.

use crate::transform::Arity;
use thiserror::Error;

/// Error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A joint transform was invoked with an arity it does not accept,
    /// e.g. a dual-only transform configured in the triple slot.
    #[error("transform `{transform}` does not accept {arity} inputs")]
    ArityMismatch {
        /// Transform name
        transform: String,
        /// Arity it was called with
        arity: Arity,
    },

    /// A transform failed while processing.
    #[error("transform `{transform}` failed: {message}")]
    Transform {
        /// Transform name
        transform: String,
        /// Failure description
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Preset settings could not be parsed.
    #[error("invalid preset settings: {0}")]
    Settings(#[from] serde_yaml::Error),

    /// Raster construction or alignment failed.
    #[error(transparent)]
    Core(#[from] prep_core::Error),

    /// A raster operation failed.
    #[error(transparent)]
    Ops(#[from] prep_ops::OpsError),
}

impl PipelineError {
    /// Creates an [`PipelineError::ArityMismatch`] error.
    #[inline]
    pub fn arity_mismatch(transform: impl Into<String>, arity: Arity) -> Self {
        Self::ArityMismatch {
            transform: transform.into(),
            arity,
        }
    }

    /// Creates a [`PipelineError::Transform`] error.
    #[inline]
    pub fn transform(transform: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            transform: transform.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if a transform was registered in the wrong slot.
    #[inline]
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self, Self::ArityMismatch { .. })
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
