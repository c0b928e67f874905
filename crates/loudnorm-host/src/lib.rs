//! Loudnorm Host - the page-side contract of loudness normalization
//!
//! The normalizer never talks to a concrete page model. Everything it needs
//! from the hosting frame is expressed by four small traits:
//!
//! - [`Scope`] - Element lookup by selector
//! - [`Player`] - Volume level and player metadata
//! - [`MediaElement`] - The video element whose audio is processed
//! - [`Observable`] - Change subscription replacing DOM mutation observers
//!
//! On top of the traits the crate provides:
//!
//! - [`read_loudness_db`] - Extracts content loudness from player metadata
//! - [`Waiter`] - Bounded polling with an injectable [`Sleeper`]
//! - [`memory`] - An in-memory host for simulation and tests
//!
//! # Example
//!
//! ```rust
//! use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};
//! use loudnorm_host::{RecordingSleeper, WaitPolicy, Waiter, read_loudness_db};
//!
//! let page = MemoryPage::new();
//! let player = MemoryPlayer::new(80.0);
//! player.set_loudness_db(Some(-4.5));
//! page.add_player("#movie_player", player);
//! page.add_media(".html5-main-video", MemoryMedia::new("video-0"));
//!
//! let mut waiter = Waiter::new(WaitPolicy::default(), RecordingSleeper::default());
//! let player: MemoryPlayer = waiter.wait_for_element("#movie_player", &page).unwrap();
//! let db = waiter.wait_for_condition(read_loudness_db, &player).unwrap();
//! assert_eq!(db, -4.5);
//! ```

pub mod loudness;
pub mod memory;
pub mod waiter;

pub use loudness::{AudioConfig, PlayerConfig, PlayerResponse, read_loudness_db};
pub use waiter::{
    CancelToken, RecordingSleeper, Sleeper, ThreadSleeper, WaitError, WaitPolicy, Waiter,
};

/// Callback registered through [`Observable::on_change`].
pub type ChangeCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Something that announces changes to registered callbacks.
///
/// Implementations call every registered callback once per change. Callbacks
/// must stay cheap: the normalizer only enqueues an event in them.
pub trait Observable {
    /// Register `callback` to run after every change.
    fn on_change(&self, callback: ChangeCallback);
}

/// The host's video player object.
///
/// Its [`Observable`] implementation fires when the player's displayed state
/// mutates, which includes loudness metadata updates.
pub trait Player: Observable {
    /// Current volume slider level, `0.0..=100.0`.
    fn volume(&self) -> f64;

    /// Player metadata, if the host has loaded any.
    fn player_response(&self) -> Option<PlayerResponse>;
}

/// The media element whose audio the pipeline processes.
///
/// Its [`Observable`] implementation fires when the source attribute changes,
/// i.e. when a new video is loaded.
pub trait MediaElement: Observable {
    /// Stable identifier for the element; the pipeline's source node is bound to it.
    fn id(&self) -> String;

    /// Current source attribute.
    fn src(&self) -> Option<String>;
}

/// Element lookup by selector.
///
/// A document implements `Scope<E>` once per element type it can hand out.
pub trait Scope<E> {
    /// Returns the first element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Option<E>;
}
