//! Animation engine errors

use thiserror::Error;

/// Errors raised by the motion engine
///
/// Steady-state ticking never fails; these only surface from configuration
/// and activation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A sampling range is empty, reversed, or non-finite
    #[error("invalid {name} range [{min}, {max}): {reason}")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
        reason: &'static str,
    },

    /// `activate` called while a running set is still installed
    #[error("graph is already active with {running} oscillators; deactivate first")]
    AlreadyActive { running: usize },
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
