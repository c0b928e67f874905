//! Player volume and the normalizer's gain factor.
//!
//! [`GainState`] tracks three numbers:
//!
//! | Field | Meaning |
//! |-------|---------|
//! | base gain | player volume / 100 |
//! | user gain | linear factor from content loudness, initially 1 |
//! | effective percent | `round(user_gain * base_gain * 100)` |
//!
//! # Self-trigger suppression
//!
//! Applying a gain changes what the player displays, and the host reports
//! that back as a player mutation. Each applied gain therefore arms one skip:
//! the next mutation (or the next [`apply_user_gain`](GainState::apply_user_gain))
//! is swallowed. This assumes exactly one feedback notification per change;
//! if the host coalesces or duplicates notifications the counter drifts, and
//! a genuine change can be dropped or a feedback loop can run once.

use loudnorm_host::Player;

/// Linear gain that would fully compensate content at `loudness_db`.
///
/// This is the undamped factor shown as the volume percentage; the audio
/// path applies a damped gain instead (see `loudnorm_core::level_for`).
pub fn target_gain(loudness_db: f64) -> f64 {
    10f64.powf(-loudness_db / 20.0)
}

/// Outcome of [`GainState::apply_user_gain`] and [`GainState::reapply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainUpdate {
    /// A pending self-trigger skip was consumed; nothing changed.
    Suppressed,
    /// The default path is active; nothing changed.
    DefaultPath,
    /// The gain was applied and one skip armed.
    Applied {
        /// New effective percent.
        percent: u32,
    },
}

/// Volume bookkeeping for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct GainState {
    base_gain: f64,
    user_gain: f64,
    effective_percent: u32,
    using_default_path: bool,
    self_trigger_skips: u32,
}

fn percent(user_gain: f64, base_gain: f64) -> u32 {
    (user_gain * base_gain * 100.0).round().max(0.0) as u32
}

impl GainState {
    /// Reads the player's volume and starts on the default path with unity
    /// user gain and no pending skips.
    pub fn initialize<P: Player + ?Sized>(player: &P) -> Self {
        let base_gain = player.volume() / 100.0;
        Self {
            base_gain,
            user_gain: 1.0,
            effective_percent: percent(1.0, base_gain),
            using_default_path: true,
            self_trigger_skips: 0,
        }
    }

    /// Re-reads the player's volume. The user gain is kept.
    pub fn refresh<P: Player + ?Sized>(&mut self, player: &P) {
        self.base_gain = player.volume() / 100.0;
        self.effective_percent = percent(self.user_gain, self.base_gain);
    }

    /// Sets the user gain to `factor` unless a skip is pending or the
    /// default path is active.
    pub fn apply_user_gain(&mut self, factor: f64) -> GainUpdate {
        self.update(Some(factor))
    }

    /// Recomputes the percent with the current user gain, under the same
    /// guards as [`apply_user_gain`](Self::apply_user_gain).
    pub fn reapply(&mut self) -> GainUpdate {
        self.update(None)
    }

    fn update(&mut self, factor: Option<f64>) -> GainUpdate {
        if self.self_trigger_skips > 0 {
            self.self_trigger_skips -= 1;
            return GainUpdate::Suppressed;
        }
        if self.using_default_path {
            return GainUpdate::DefaultPath;
        }
        if let Some(factor) = factor {
            self.user_gain = factor;
        }
        self.effective_percent = percent(self.user_gain, self.base_gain);
        self.self_trigger_skips += 1;
        tracing::info!("volume: {}%", self.effective_percent);
        GainUpdate::Applied {
            percent: self.effective_percent,
        }
    }

    /// Consumes one pending skip. Returns `false` if none was pending.
    pub fn take_self_trigger(&mut self) -> bool {
        if self.self_trigger_skips > 0 {
            self.self_trigger_skips -= 1;
            true
        } else {
            false
        }
    }

    /// Marks whether audio bypasses the processing path.
    pub fn set_use_default_path(&mut self, default: bool) {
        self.using_default_path = default;
    }

    /// Whether audio bypasses the processing path.
    pub fn is_using_default_path(&self) -> bool {
        self.using_default_path
    }

    /// Player volume as a fraction.
    pub fn base_gain(&self) -> f64 {
        self.base_gain
    }

    /// Linear factor last applied.
    pub fn user_gain(&self) -> f64 {
        self.user_gain
    }

    /// `round(user_gain * base_gain * 100)`.
    pub fn effective_percent(&self) -> u32 {
        self.effective_percent
    }

    /// Pending self-trigger skips.
    pub fn pending_skips(&self) -> u32 {
        self.self_trigger_skips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loudnorm_host::memory::MemoryPlayer;

    fn active(volume: f64) -> (MemoryPlayer, GainState) {
        let player = MemoryPlayer::new(volume);
        let mut state = GainState::initialize(&player);
        state.set_use_default_path(false);
        (player, state)
    }

    #[test]
    fn initialize_reads_volume() {
        let player = MemoryPlayer::new(65.0);
        let state = GainState::initialize(&player);
        assert_eq!(state.base_gain(), 0.65);
        assert_eq!(state.user_gain(), 1.0);
        assert_eq!(state.effective_percent(), 65);
        assert!(state.is_using_default_path());
        assert_eq!(state.pending_skips(), 0);
    }

    #[test]
    fn default_path_ignores_gain() {
        let player = MemoryPlayer::new(50.0);
        let mut state = GainState::initialize(&player);
        assert_eq!(state.apply_user_gain(2.0), GainUpdate::DefaultPath);
        assert_eq!(state.user_gain(), 1.0);
        assert_eq!(state.pending_skips(), 0);
    }

    #[test]
    fn applied_gain_arms_one_skip() {
        let (_player, mut state) = active(50.0);
        assert_eq!(state.apply_user_gain(2.0), GainUpdate::Applied { percent: 100 });
        assert_eq!(state.pending_skips(), 1);
        assert_eq!(state.apply_user_gain(3.0), GainUpdate::Suppressed);
        assert_eq!(state.user_gain(), 2.0);
        assert_eq!(state.apply_user_gain(3.0), GainUpdate::Applied { percent: 150 });
    }

    #[test]
    fn take_self_trigger_consumes_once() {
        let (_player, mut state) = active(100.0);
        state.apply_user_gain(1.5);
        assert!(state.take_self_trigger());
        assert!(!state.take_self_trigger());
    }

    #[test]
    fn refresh_keeps_user_gain() {
        let (player, mut state) = active(80.0);
        state.apply_user_gain(1.25);
        player.set_volume(40.0);
        state.refresh(&player);
        assert_eq!(state.user_gain(), 1.25);
        assert_eq!(state.effective_percent(), 50);
    }

    #[test]
    fn reapply_uses_current_gain() {
        let (player, mut state) = active(100.0);
        state.apply_user_gain(1.2);
        state.take_self_trigger();
        player.set_volume(50.0);
        state.refresh(&player);
        assert_eq!(state.reapply(), GainUpdate::Applied { percent: 60 });
    }

    #[test]
    fn target_gain_values() {
        assert!((target_gain(-6.0) - 1.9953).abs() < 1e-4);
        assert_eq!(target_gain(0.0), 1.0);
        assert!((target_gain(-20.0) - 10.0).abs() < 1e-12);
    }
}
