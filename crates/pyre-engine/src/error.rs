//! Construction-time errors.
//!
//! All validation happens while building emitters, initializers, and
//! behaviours from configuration; the per-step update path never returns
//! errors. Runtime numeric trouble (a `NaN` slipping into a particle) is
//! handled by killing the particle and logging a warning instead.

use pyre_core::{SpanError, ZoneError};

/// Errors produced while building simulation objects from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A span field failed validation.
    #[error("invalid span for '{field}': {source}")]
    InvalidSpan {
        field: &'static str,
        #[source]
        source: SpanError,
    },

    /// A zone description failed validation.
    #[error("invalid zone: {0}")]
    InvalidZone(#[from] ZoneError),

    /// A scalar field holds an out-of-range or non-finite value.
    #[error("invalid value for '{field}': {details}")]
    InvalidField {
        field: &'static str,
        details: String,
    },

    /// A rule that needs a zone was configured without one.
    #[error("'{rule}' requires a zone but none was provided")]
    MissingZone { rule: &'static str },

    /// A rule holds runtime-only state (such as an externally supplied zone)
    /// that has no JSON representation.
    #[error("'{rule}' was built with an external zone and cannot be serialized")]
    NotSerializable { rule: &'static str },

    /// JSON parsing failed before validation could start.
    #[error("configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    pub(crate) fn span(field: &'static str, source: SpanError) -> Self {
        BuildError::InvalidSpan { field, source }
    }

    pub(crate) fn field(field: &'static str, details: impl Into<String>) -> Self {
        BuildError::InvalidField {
            field,
            details: details.into(),
        }
    }
}
