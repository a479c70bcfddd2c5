//! Uniform error type for the engine's non-core collaborators.
//!
//! The AAD tape itself is infallible by design (spec: programmer errors
//! panic, numerical edge cases propagate `NaN` silently); this error type
//! is for the surrounding machinery — surface construction, calibration,
//! RNG bounds — that can legitimately fail on bad input.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("invalid input: {0}")]
    InvalidInputErr(String),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
