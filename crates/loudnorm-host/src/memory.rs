//! In-memory host for simulation and tests.
//!
//! [`MemoryPage`] resolves selectors to [`MemoryPlayer`] and [`MemoryMedia`]
//! handles. Handles are cheap clones sharing one state, so a test can keep a
//! handle, mutate it, and watch the normalizer react.
//!
//! Elements can be registered to appear only after a number of lookups, which
//! models a player that the host creates some time after the frame loads.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::loudness::PlayerResponse;
use crate::{ChangeCallback, MediaElement, Observable, Player, Scope};

type SharedCallback = Arc<dyn Fn() + Send + Sync + 'static>;

#[derive(Default)]
struct Observers {
    callbacks: Vec<SharedCallback>,
}

impl Observers {
    fn push(&mut self, callback: ChangeCallback) {
        self.callbacks.push(Arc::from(callback));
    }

    fn snapshot(&self) -> Vec<SharedCallback> {
        self.callbacks.clone()
    }
}

// Callbacks run after the state lock is released, so they may read the
// element they observe.
fn notify(callbacks: Vec<SharedCallback>) {
    for callback in callbacks {
        callback();
    }
}

// --- Player ---

struct PlayerState {
    volume: f64,
    response: Option<PlayerResponse>,
    observers: Observers,
}

/// In-memory [`Player`].
#[derive(Clone)]
pub struct MemoryPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl MemoryPlayer {
    /// A player at `volume` (0–100) with no metadata loaded.
    pub fn new(volume: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState {
                volume,
                response: None,
                observers: Observers::default(),
            })),
        }
    }

    /// Moves the volume slider. Fires a change.
    pub fn set_volume(&self, volume: f64) {
        let callbacks = {
            let mut state = self.state.lock();
            state.volume = volume;
            state.observers.snapshot()
        };
        notify(callbacks);
    }

    /// Replaces the metadata without firing a change.
    pub fn set_response(&self, response: Option<PlayerResponse>) {
        self.state.lock().response = response;
    }

    /// Replaces the metadata with one carrying only `loudness_db`, or clears
    /// it for `None`. Fires a change.
    pub fn set_loudness_db(&self, loudness_db: Option<f64>) {
        let callbacks = {
            let mut state = self.state.lock();
            state.response = loudness_db.map(PlayerResponse::with_loudness_db);
            state.observers.snapshot()
        };
        notify(callbacks);
    }

    /// Fires a change without altering any state.
    pub fn mutate(&self) {
        let callbacks = self.state.lock().observers.snapshot();
        notify(callbacks);
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.callbacks.len()
    }
}

impl std::fmt::Debug for MemoryPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryPlayer")
            .field("volume", &state.volume)
            .field("response", &state.response)
            .field("observers", &state.observers.callbacks.len())
            .finish()
    }
}

impl Observable for MemoryPlayer {
    fn on_change(&self, callback: ChangeCallback) {
        self.state.lock().observers.push(callback);
    }
}

impl Player for MemoryPlayer {
    fn volume(&self) -> f64 {
        self.state.lock().volume
    }

    fn player_response(&self) -> Option<PlayerResponse> {
        self.state.lock().response.clone()
    }
}

// --- Media ---

struct MediaState {
    src: Option<String>,
    observers: Observers,
}

/// In-memory [`MediaElement`].
#[derive(Clone)]
pub struct MemoryMedia {
    id: Arc<str>,
    state: Arc<Mutex<MediaState>>,
}

impl MemoryMedia {
    /// A media element with the given identifier and no source.
    pub fn new(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self {
            id: Arc::from(id),
            state: Arc::new(Mutex::new(MediaState {
                src: None,
                observers: Observers::default(),
            })),
        }
    }

    /// Changes the source attribute. Fires a change.
    pub fn set_src(&self, src: impl Into<String>) {
        let callbacks = {
            let mut state = self.state.lock();
            state.src = Some(src.into());
            state.observers.snapshot()
        };
        notify(callbacks);
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.state.lock().observers.callbacks.len()
    }
}

impl std::fmt::Debug for MemoryMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryMedia")
            .field("id", &self.id)
            .field("src", &state.src)
            .field("observers", &state.observers.callbacks.len())
            .finish()
    }
}

impl Observable for MemoryMedia {
    fn on_change(&self, callback: ChangeCallback) {
        self.state.lock().observers.push(callback);
    }
}

impl MediaElement for MemoryMedia {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn src(&self) -> Option<String> {
        self.state.lock().src.clone()
    }
}

// --- Page ---

struct Entry<E> {
    element: E,
    /// Lookups that still miss before the element becomes visible.
    hidden_for: u32,
}

struct Registry<E> {
    entries: Mutex<HashMap<String, Entry<E>>>,
}

impl<E: Clone> Registry<E> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, selector: &str, element: E, hidden_for: u32) {
        self.entries
            .lock()
            .insert(selector.to_string(), Entry { element, hidden_for });
    }

    fn lookup(&self, selector: &str) -> Option<E> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(selector)?;
        if entry.hidden_for > 0 {
            entry.hidden_for -= 1;
            return None;
        }
        Some(entry.element.clone())
    }
}

/// In-memory document holding players and media elements by selector.
pub struct MemoryPage {
    players: Registry<MemoryPlayer>,
    media: Registry<MemoryMedia>,
}

impl MemoryPage {
    /// An empty page.
    pub fn new() -> Self {
        Self {
            players: Registry::new(),
            media: Registry::new(),
        }
    }

    /// Registers `player` under `selector`, visible immediately.
    pub fn add_player(&self, selector: &str, player: MemoryPlayer) {
        self.players.insert(selector, player, 0);
    }

    /// Registers `player` under `selector`; the first `misses` lookups fail.
    pub fn add_player_after(&self, selector: &str, player: MemoryPlayer, misses: u32) {
        self.players.insert(selector, player, misses);
    }

    /// Registers `media` under `selector`, visible immediately.
    pub fn add_media(&self, selector: &str, media: MemoryMedia) {
        self.media.insert(selector, media, 0);
    }

    /// Registers `media` under `selector`; the first `misses` lookups fail.
    pub fn add_media_after(&self, selector: &str, media: MemoryMedia, misses: u32) {
        self.media.insert(selector, media, misses);
    }
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope<MemoryPlayer> for MemoryPage {
    fn query_selector(&self, selector: &str) -> Option<MemoryPlayer> {
        self.players.lookup(selector)
    }
}

impl Scope<MemoryMedia> for MemoryPage {
    fn query_selector(&self, selector: &str) -> Option<MemoryMedia> {
        self.media.lookup(selector)
    }
}
