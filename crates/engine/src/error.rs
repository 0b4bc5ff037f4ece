//! Error types for the resolution engine.
//!
//! None of these cross the [`crate::RecordResolver`] boundary: every failure is
//! logged and collapses into "no record".

use thiserror::Error;

use crate::resolver::ResolutionStage;

/// Failure reported by a backend collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("operation not supported: {operation}")]
    Unsupported { operation: &'static str },

    #[error("model not found: {name}")]
    ModelNotFound { name: String },

    #[error("backend call failed: {message}")]
    Call { message: String },
}

impl BackendError {
    /// Create an unsupported-operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Create a model-not-found error.
    pub fn model_not_found(name: impl Into<String>) -> Self {
        Self::ModelNotFound { name: name.into() }
    }

    /// Create a generic call failure.
    pub fn call(message: impl Into<String>) -> Self {
        Self::Call { message: message.into() }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Why a resolution produced no record.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("identifier is empty")]
    EmptyIdentifier,

    #[error("no backend client attached")]
    NoClient,

    #[error("no entity model matched any lookup strategy")]
    ModelNotFound,

    #[error("query could not be acquired from model '{model}'")]
    QueryUnavailable { model: String },

    #[error("execution failed: {message}")]
    Execution { message: String },

    #[error("response contained no records")]
    NoRecords,

    #[error("response shape not recognised: {message}")]
    ShapeMismatch { message: String },
}

impl ResolveError {
    /// Create an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution { message: message.into() }
    }

    /// Create a shape-mismatch error.
    pub fn shape_mismatch(message: impl Into<String>) -> Self {
        Self::ShapeMismatch { message: message.into() }
    }

    /// Stage that was active when the failure occurred.
    pub fn stage(&self) -> ResolutionStage {
        match self {
            Self::EmptyIdentifier | Self::NoClient => ResolutionStage::Idle,
            Self::ModelNotFound => ResolutionStage::Locating,
            Self::QueryUnavailable { .. } => ResolutionStage::Building,
            Self::Execution { .. } => ResolutionStage::Executing,
            Self::NoRecords | Self::ShapeMismatch { .. } => ResolutionStage::Normalizing,
        }
    }
}
