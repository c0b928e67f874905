//! Content loudness carried in player metadata.
//!
//! The host exposes a nested response object; the loudness lives at
//! `playerConfig.audioConfig.loudnessDb`, in dB relative to the platform's
//! reference level. Any link of that chain may be missing.
//!
//! A missing value is reported as `None` ("unknown"), never as `0.0`: zero
//! means the content is already at the reference level, while unknown means
//! there is nothing to act on.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "playerConfig": {
//!     "audioConfig": {
//!       "loudnessDb": -7.24,
//!       "perceptualLoudnessDb": -21.24
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::Player;

/// Top-level player metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    /// Player configuration block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_config: Option<PlayerConfig>,
}

/// Player configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Audio configuration block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_config: Option<AudioConfig>,
}

/// Audio configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    /// Content loudness relative to the reference, in dB.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness_db: Option<f64>,

    /// Perceptual loudness of the content, in dB. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perceptual_loudness_db: Option<f64>,
}

impl PlayerResponse {
    /// A response carrying only `loudnessDb`.
    pub fn with_loudness_db(loudness_db: f64) -> Self {
        Self {
            player_config: Some(PlayerConfig {
                audio_config: Some(AudioConfig {
                    loudness_db: Some(loudness_db),
                    perceptual_loudness_db: None,
                }),
            }),
        }
    }

    /// Parse a response from the host's JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn audio_config(&self) -> Option<&AudioConfig> {
        self.player_config.as_ref()?.audio_config.as_ref()
    }

    /// `loudnessDb` if the full chain is present and finite.
    pub fn loudness_db(&self) -> Option<f64> {
        self.audio_config()?.loudness_db.filter(|db| db.is_finite())
    }

    /// `perceptualLoudnessDb` if the full chain is present and finite.
    pub fn perceptual_loudness_db(&self) -> Option<f64> {
        self.audio_config()?
            .perceptual_loudness_db
            .filter(|db| db.is_finite())
    }
}

/// Reads the content loudness from `player`'s metadata.
///
/// Returns `None` when the player has no metadata or the chain is incomplete.
pub fn read_loudness_db<P: Player + ?Sized>(player: &P) -> Option<f64> {
    player.player_response()?.loudness_db()
}
