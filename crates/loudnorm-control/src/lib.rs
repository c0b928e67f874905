//! Loudnorm Control - the gain-control state machine
//!
//! Ties the host contract from `loudnorm-host` to the audio path from
//! `loudnorm-core`:
//!
//! - [`Controller`] - Waits for the host, then keeps the pipeline's wiring and
//!   gain in line with the content loudness on every change notification
//! - [`GainState`] - Player volume, display gain and self-trigger suppression
//! - [`target_gain`] - Undamped display gain for a loudness value
//!
//! # Example
//!
//! ```rust
//! use loudnorm_config::Settings;
//! use loudnorm_control::{ChangeEvent, Controller, ControllerState};
//! use loudnorm_host::RecordingSleeper;
//! use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};
//!
//! let page = MemoryPage::new();
//! let player = MemoryPlayer::new(100.0);
//! player.set_loudness_db(Some(-6.0));
//! page.add_player("#movie_player", player.clone());
//! page.add_media(".html5-main-video", MemoryMedia::new("video-0"));
//!
//! let mut controller: Controller<MemoryPlayer, MemoryMedia> =
//!     Controller::start(&page, &Settings::default(), RecordingSleeper::default()).unwrap();
//! assert_eq!(controller.state(), ControllerState::Engaged);
//!
//! player.set_loudness_db(Some(0.0));
//! controller.handle(ChangeEvent::SourceChanged).unwrap();
//! assert_eq!(controller.state(), ControllerState::Bypassed);
//! ```

pub mod controller;
pub mod error;
pub mod gain_state;

pub use controller::{ChangeEvent, Controller, ControllerState, Reaction, Recompute};
pub use error::ControllerError;
pub use gain_state::{GainState, GainUpdate, target_gain};
