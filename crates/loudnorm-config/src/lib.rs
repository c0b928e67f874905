//! Settings for the loudnorm normalizer.
//!
//! # Features
//!
//! - **Settings file**: Wait budget, host selectors and render parameters in TOML
//! - **Validation**: Range checks reported all at once
//! - **Paths**: Platform-specific config directory
//!
//! The limiter's knee, ratio, attack and release and the gain damping factor
//! are constants of the audio path, not settings.
//!
//! # Example
//!
//! ```rust,no_run
//! use loudnorm_config::{Settings, settings_path};
//!
//! let settings = Settings::load_or_default(settings_path()).unwrap();
//! let policy = settings.wait_policy();
//! println!("waiting up to {:?}", policy.budget());
//! ```

mod error;
mod settings;

/// Platform-specific config paths.
pub mod paths;

/// Settings validation.
pub mod validation;

pub use error::ConfigError;
pub use paths::{SETTINGS_FILE, ensure_user_config_dir, settings_path, user_config_dir};
pub use settings::{RenderSettings, Selectors, Settings, WaitSettings};
pub use validation::{ValidationError, ValidationResult, validate_settings};
