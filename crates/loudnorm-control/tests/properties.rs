//! Property-based tests for gain bookkeeping.

use loudnorm_control::{GainState, GainUpdate, target_gain};
use loudnorm_host::memory::MemoryPlayer;
use proptest::prelude::*;

fn active_state(volume: f64) -> GainState {
    let player = MemoryPlayer::new(volume);
    let mut state = GainState::initialize(&player);
    state.set_use_default_path(false);
    state
}

proptest! {
    #[test]
    fn percent_formula(volume in 0.0f64..=100.0, gain in 0.001f64..20.0) {
        let mut state = active_state(volume);
        let expected = (gain * (volume / 100.0) * 100.0).round() as u32;
        prop_assert_eq!(state.apply_user_gain(gain), GainUpdate::Applied { percent: expected });
        prop_assert_eq!(state.effective_percent(), expected);
    }

    #[test]
    fn one_echo_is_swallowed(volume in 0.0f64..=100.0, gain in 0.001f64..20.0) {
        let mut state = active_state(volume);
        state.apply_user_gain(gain);
        prop_assert!(state.take_self_trigger());
        prop_assert!(!state.take_self_trigger());
        let reapplied = matches!(state.reapply(), GainUpdate::Applied { .. });
        prop_assert!(reapplied);
    }

    #[test]
    fn default_path_never_arms(gain in 0.001f64..20.0, calls in 1usize..10) {
        let player = MemoryPlayer::new(100.0);
        let mut state = GainState::initialize(&player);
        for _ in 0..calls {
            prop_assert_eq!(state.apply_user_gain(gain), GainUpdate::DefaultPath);
        }
        prop_assert_eq!(state.pending_skips(), 0);
    }

    #[test]
    fn display_gain_boosts_quiet_content(db in -60.0f64..-0.001) {
        prop_assert!(target_gain(db) > 1.0);
        prop_assert!((20.0 * target_gain(db).log10() + db).abs() < 1e-9);
    }
}
