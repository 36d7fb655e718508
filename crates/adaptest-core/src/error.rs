//! Error types for item ingestion, configuration, and calibration.
//!
//! The numerical routines (response model, estimator, selector, termination,
//! scorer) are total and never return these. Errors only surface at the
//! boundaries where untrusted data enters the engine or where shared item
//! state is written back.

use thiserror::Error;

/// An item whose IRT parameters cannot be used by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ItemError {
    /// Difficulty, discrimination, or guessing is NaN or infinite.
    #[error("item '{item_id}': {field} must be finite, got {value}")]
    NonFinite {
        item_id: String,
        field: &'static str,
        value: f64,
    },

    /// Discrimination must be strictly positive.
    #[error("item '{item_id}': discrimination must be > 0, got {value}")]
    NonPositiveDiscrimination { item_id: String, value: f64 },

    /// Guessing must lie in `[0, 1)`.
    #[error("item '{item_id}': guessing must be in [0, 1), got {value}")]
    GuessingOutOfRange { item_id: String, value: f64 },
}

impl ItemError {
    /// The id of the offending item.
    pub fn item_id(&self) -> &str {
        match self {
            ItemError::NonFinite { item_id, .. }
            | ItemError::NonPositiveDiscrimination { item_id, .. }
            | ItemError::GuessingOutOfRange { item_id, .. } => item_id,
        }
    }
}

/// An engine configuration that would make the adaptive loop misbehave.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("termination.min_questions ({min}) exceeds termination.max_questions ({max})")]
    QuestionBounds { min: u32, max: u32 },

    #[error("termination.max_questions must be at least 1")]
    NoQuestions,

    #[error("estimation.max_iterations must be at least 1")]
    NoIterations,

    #[error("{field} must be in (0, 1], got {value}")]
    PrecisionOutOfRange { field: &'static str, value: f64 },

    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f64 },
}

/// Failures while writing recalibrated parameters back to an item store.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The store has no record of the item.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// Another writer updated the item between our read and write.
    #[error("version conflict on item '{item_id}' (expected v{expected}, found v{found})")]
    VersionConflict {
        item_id: String,
        expected: u64,
        found: u64,
    },

    /// The backing store failed.
    #[error("item store error: {0}")]
    Store(String),
}

impl CalibrationError {
    /// Returns `true` if retrying the update cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, CalibrationError::UnknownItem(_))
    }
}
