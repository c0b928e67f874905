//! Integration tests for loudnorm-host.
//!
//! Drives the waiter against the in-memory page the way the controller does:
//! find the player, find the media element, then wait for loudness metadata.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};
use loudnorm_host::{
    MediaElement, Observable, Player, PlayerResponse, RecordingSleeper, WaitError, WaitPolicy,
    Waiter, read_loudness_db,
};
use proptest::prelude::*;

fn waiter() -> Waiter<RecordingSleeper> {
    Waiter::new(WaitPolicy::default(), RecordingSleeper::default())
}

#[test]
fn late_player_is_found() {
    let page = MemoryPage::new();
    page.add_player_after("#movie_player", MemoryPlayer::new(40.0), 7);

    let mut waiter = waiter();
    let player: MemoryPlayer = waiter.wait_for_element("#movie_player", &page).unwrap();

    assert_eq!(player.volume(), 40.0);
    assert_eq!(waiter.sleeper().count(), 8);
    assert_eq!(waiter.sleeper().total(), Duration::from_millis(800));
}

#[test]
fn missing_media_reports_selector() {
    let page = MemoryPage::new();
    page.add_player("#movie_player", MemoryPlayer::new(40.0));

    let mut waiter = waiter();
    let err = waiter
        .wait_for_element::<MemoryMedia, _>(".html5-main-video", &page)
        .unwrap_err();

    assert_eq!(
        err,
        WaitError::NotFound {
            selector: ".html5-main-video".to_string(),
            attempts: 51,
        }
    );
}

#[test]
fn zero_loudness_is_available() {
    let player = MemoryPlayer::new(100.0);
    player.set_loudness_db(Some(0.0));

    let mut waiter = waiter();
    let db = waiter.wait_for_condition(read_loudness_db, &player).unwrap();
    assert_eq!(db, 0.0);
    assert_eq!(waiter.sleeper().count(), 1);
}

#[test]
fn loudness_that_never_arrives_times_out() {
    let player = MemoryPlayer::new(100.0);
    player.set_response(Some(PlayerResponse::default()));

    let mut waiter = waiter();
    let err = waiter.wait_for_condition(read_loudness_db, &player).unwrap_err();
    assert_eq!(err, WaitError::Timeout { attempts: 51 });
}

#[test]
fn loudness_from_host_json() {
    let json = r#"{"playerConfig":{"audioConfig":{"loudnessDb":-2.5,"perceptualLoudnessDb":-16.5}}}"#;
    let player = MemoryPlayer::new(100.0);
    player.set_response(Some(PlayerResponse::from_json(json).unwrap()));

    assert_eq!(read_loudness_db(&player), Some(-2.5));
    let response = player.player_response().unwrap();
    assert_eq!(response.perceptual_loudness_db(), Some(-16.5));
}

#[test]
fn observers_see_every_source_change() {
    let media = MemoryMedia::new("video-0");
    let seen = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&seen);
    media.on_change(Box::new(move || {
        s.fetch_add(1, Ordering::SeqCst);
    }));

    for n in 0..5 {
        media.set_src(format!("blob:{n}"));
    }

    assert_eq!(seen.load(Ordering::SeqCst), 5);
    assert_eq!(media.src().as_deref(), Some("blob:4"));
}

proptest! {
    #[test]
    fn wait_never_exceeds_budget(misses in 0u32..120, max_attempts in 1u32..80) {
        let page = MemoryPage::new();
        page.add_media_after(".v", MemoryMedia::new("v"), misses);

        let policy = WaitPolicy { interval: Duration::from_millis(10), max_attempts };
        let mut waiter = Waiter::new(policy, RecordingSleeper::default());
        let result = waiter.wait_for_element::<MemoryMedia, _>(".v", &page);

        let sleeps = waiter.sleeper().count() as u32;
        prop_assert!(sleeps <= max_attempts);
        if misses < max_attempts {
            prop_assert!(result.is_ok());
            prop_assert_eq!(sleeps, misses + 1);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(sleeps, max_attempts);
        }
    }
}
