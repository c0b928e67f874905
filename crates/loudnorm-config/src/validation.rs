//! Settings validation.
//!
//! Parsing only checks shape; the ranges below are checked separately so a
//! hand-edited file reports every problem at once.
//!
//! | Field | Accepted |
//! |-------|----------|
//! | `wait.interval_ms` | > 0 |
//! | `wait.max_attempts` | > 0 |
//! | `selectors.player`, `selectors.video` | non-blank |
//! | `render.sample_rate` | 8000 ..= 192000 |
//! | `render.block_size` | > 0 |

use thiserror::Error;

use crate::settings::Settings;

/// Lowest accepted sample rate in Hz.
pub const MIN_SAMPLE_RATE: u32 = 8_000;

/// Highest accepted sample rate in Hz.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Poll interval of zero.
    #[error("wait.interval_ms must be positive")]
    ZeroInterval,

    /// Attempt budget of zero.
    #[error("wait.max_attempts must be positive")]
    ZeroAttempts,

    /// Blank selector.
    #[error("selector '{0}' must not be empty")]
    EmptySelector(&'static str),

    /// Sample rate outside the supported range.
    #[error("sample rate {0} Hz out of range [{MIN_SAMPLE_RATE}, {MAX_SAMPLE_RATE}]")]
    SampleRate(u32),

    /// Render block size of zero.
    #[error("block_size must be positive")]
    ZeroBlockSize,

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Checks every field of `settings`.
///
/// A single problem is returned as is; several are wrapped in
/// [`ValidationError::Multiple`].
pub fn validate_settings(settings: &Settings) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if settings.wait.interval_ms == 0 {
        errors.push(ValidationError::ZeroInterval);
    }
    if settings.wait.max_attempts == 0 {
        errors.push(ValidationError::ZeroAttempts);
    }
    if settings.selectors.player.trim().is_empty() {
        errors.push(ValidationError::EmptySelector("player"));
    }
    if settings.selectors.video.trim().is_empty() {
        errors.push(ValidationError::EmptySelector("video"));
    }
    if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&settings.render.sample_rate) {
        errors.push(ValidationError::SampleRate(settings.render.sample_rate));
    }
    if settings.render.block_size == 0 {
        errors.push(ValidationError::ZeroBlockSize);
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
