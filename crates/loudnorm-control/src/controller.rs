//! The normalizer's lifecycle.
//!
//! ```text
//! WaitingForPlayer ──► ReadingMetadata ──► Bypassed ◄──► Engaged
//! ```
//!
//! [`Controller::start`] runs the two waiting states synchronously: find the
//! player, find the media element, then poll until loudness metadata is
//! present. If any wait gives up, startup fails and nothing is subscribed or
//! built.
//!
//! Once active, the controller owns the [`AudioPipeline`] and reacts to
//! [`ChangeEvent`]s. Host callbacks only push events onto a channel; the
//! controller drains it with [`pump`](Controller::pump) or
//! [`run`](Controller::run), so at most one [`recompute`](Controller::recompute)
//! is in progress at any time.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError, unbounded};

use loudnorm_config::Settings;
use loudnorm_core::{AudioPipeline, LevelSettings, Wiring};
use loudnorm_host::{
    CancelToken, MediaElement, Player, Scope, Sleeper, Waiter, read_loudness_db,
};

use crate::error::ControllerError;
use crate::gain_state::{GainState, GainUpdate, target_gain};

/// How often [`Controller::run`] checks its cancel token while idle.
const RUN_POLL: Duration = Duration::from_millis(50);

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// Waiting for the player and media elements.
    WaitingForPlayer,
    /// Waiting for loudness metadata.
    ReadingMetadata,
    /// Active, audio on the direct path.
    Bypassed,
    /// Active, audio through limiter and gain.
    Engaged,
}

impl std::fmt::Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayer => f.write_str("waiting for player"),
            Self::ReadingMetadata => f.write_str("reading metadata"),
            Self::Bypassed => f.write_str("bypassed"),
            Self::Engaged => f.write_str("engaged"),
        }
    }
}

impl From<Wiring> for ControllerState {
    fn from(wiring: Wiring) -> Self {
        match wiring {
            Wiring::Bypassed => Self::Bypassed,
            Wiring::Engaged => Self::Engaged,
        }
    }
}

/// Notifications the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// The media element's source changed: a new video was loaded.
    SourceChanged,
    /// The player's displayed state changed, possibly because of our own gain update.
    PlayerMutated,
}

/// Outcome of handling one [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reaction {
    /// The event was our own feedback and was swallowed.
    Suppressed,
    /// Gain and wiring were recomputed.
    Recomputed(Recompute),
}

/// What one [`Controller::recompute`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recompute {
    /// Loudness read from the player, `None` if unknown.
    pub loudness_db: Option<f64>,
    /// Limiter and gain settings, if the content needed amplification.
    pub level: Option<LevelSettings>,
    /// Result of handing the display gain to the [`GainState`].
    pub gain: Option<GainUpdate>,
    /// Wiring after the recompute.
    pub state: ControllerState,
}

/// Loudness normalizer bound to one player and one media element.
pub struct Controller<P, M> {
    player: P,
    media: M,
    gain: GainState,
    pipeline: AudioPipeline,
    events: Receiver<ChangeEvent>,
}

impl<P, M> Controller<P, M>
where
    P: Player,
    M: MediaElement,
{
    /// Waits for the host, builds the pipeline, subscribes to changes and
    /// applies the initial gain.
    pub fn start<Sc, S>(scope: &Sc, settings: &Settings, sleeper: S) -> Result<Self, ControllerError>
    where
        Sc: Scope<P> + Scope<M> + ?Sized,
        S: Sleeper,
    {
        let waiter = Waiter::new(settings.wait_policy(), sleeper);
        Self::start_with(scope, settings, waiter)
    }

    /// Like [`start`](Self::start), with a caller-built [`Waiter`], e.g. one
    /// carrying a [`CancelToken`].
    pub fn start_with<Sc, S>(
        scope: &Sc,
        settings: &Settings,
        mut waiter: Waiter<S>,
    ) -> Result<Self, ControllerError>
    where
        Sc: Scope<P> + Scope<M> + ?Sized,
        S: Sleeper,
    {
        tracing::info!("load");

        tracing::debug!(state = %ControllerState::WaitingForPlayer);
        let player: P = waiter.wait_for_element(&settings.selectors.player, scope)?;
        let media: M = waiter.wait_for_element(&settings.selectors.video, scope)?;

        tracing::debug!(state = %ControllerState::ReadingMetadata);
        let loudness_db = waiter.wait_for_condition(read_loudness_db, &player)?;
        tracing::info!("content loudness: {loudness_db} dB");

        let gain = GainState::initialize(&player);
        let pipeline = AudioPipeline::new(media.id(), settings.sample_rate())?;

        let (sender, events) = unbounded();
        let tx = sender.clone();
        player.on_change(Box::new(move || {
            let _ = tx.send(ChangeEvent::PlayerMutated);
        }));
        media.on_change(Box::new(move || {
            let _ = sender.send(ChangeEvent::SourceChanged);
        }));

        let mut controller = Self {
            player,
            media,
            gain,
            pipeline,
            events,
        };
        controller.recompute()?;
        Ok(controller)
    }

    /// Re-reads volume and loudness and brings gain and wiring in line.
    ///
    /// Loudness below 0 dB engages the pipeline; 0 dB, above, or unknown
    /// bypasses it.
    pub fn recompute(&mut self) -> Result<Recompute, ControllerError> {
        tracing::info!("new video");
        self.gain.refresh(&self.player);

        let loudness_db = read_loudness_db(&self.player);
        match loudness_db {
            Some(db) => tracing::info!("average volume: {db} dB"),
            None => tracing::info!("average volume: unknown"),
        }

        let Some(db) = loudness_db.filter(|db| *db < 0.0) else {
            tracing::info!("no amplification needed");
            if self.pipeline.is_engaged() {
                tracing::info!("disconnecting audio graph");
                self.pipeline.bypass()?;
                self.gain.set_use_default_path(true);
            }
            return Ok(Recompute {
                loudness_db,
                level: None,
                gain: None,
                state: self.state(),
            });
        };

        let level = self.pipeline.set_level(db as f32);
        tracing::debug!(
            threshold_db = level.threshold_db,
            linear_gain = level.linear_gain,
            "level"
        );
        if !self.pipeline.is_engaged() {
            tracing::info!("connecting audio graph");
            self.pipeline.engage()?;
            self.gain.set_use_default_path(false);
        }

        let display_gain = target_gain(db);
        let update = self.gain.apply_user_gain(display_gain);
        tracing::info!("gain: {}dB ({}%)", -db, display_gain * 100.0);

        Ok(Recompute {
            loudness_db,
            level: Some(level),
            gain: Some(update),
            state: self.state(),
        })
    }

    /// Re-reads the player volume and re-applies the current user gain
    /// without reading loudness or touching the wiring.
    ///
    /// Subject to the same skip and default-path guards as a recompute.
    pub fn refresh_gain(&mut self) -> GainUpdate {
        self.gain.refresh(&self.player);
        self.gain.reapply()
    }

    /// Reacts to one notification.
    ///
    /// A player mutation while a self-trigger skip is pending is taken to be
    /// the echo of our own gain update and is dropped.
    pub fn handle(&mut self, event: ChangeEvent) -> Result<Reaction, ControllerError> {
        if event == ChangeEvent::PlayerMutated && self.gain.take_self_trigger() {
            tracing::debug!("skip self-triggered mutation");
            return Ok(Reaction::Suppressed);
        }
        self.recompute().map(Reaction::Recomputed)
    }

    /// Handles every queued notification without blocking.
    ///
    /// Returns the number of events handled.
    pub fn pump(&mut self) -> Result<usize, ControllerError> {
        let mut handled = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.handle(event)?;
                    handled += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(handled),
            }
        }
    }

    /// Handles notifications as they arrive until `cancel` fires or every
    /// notification source is gone.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<(), ControllerError> {
        while !cancel.is_cancelled() {
            match self.events.recv_timeout(RUN_POLL) {
                Ok(event) => {
                    self.handle(event)?;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(())
    }

    /// Current lifecycle state; always `Bypassed` or `Engaged` once started.
    pub fn state(&self) -> ControllerState {
        self.pipeline.wiring().into()
    }

    /// Volume bookkeeping.
    pub fn gain_state(&self) -> &GainState {
        &self.gain
    }

    /// The audio pipeline.
    pub fn pipeline(&self) -> &AudioPipeline {
        &self.pipeline
    }

    /// Renders a block of the media element's audio through the pipeline.
    pub fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        self.pipeline.process_block(input, output);
    }

    /// The player this controller follows.
    pub fn player(&self) -> &P {
        &self.player
    }

    /// The media element whose audio is processed.
    pub fn media(&self) -> &M {
        &self.media
    }
}

impl<P, M> std::fmt::Debug for Controller<P, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("gain", &self.gain)
            .field("wiring", &self.pipeline.wiring())
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loudnorm_host::RecordingSleeper;
    use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};

    fn page(volume: f64, loudness_db: Option<f64>) -> (MemoryPage, MemoryPlayer, MemoryMedia) {
        let page = MemoryPage::new();
        let player = MemoryPlayer::new(volume);
        player.set_loudness_db(loudness_db);
        let media = MemoryMedia::new("video-0");
        page.add_player("#movie_player", player.clone());
        page.add_media(".html5-main-video", media.clone());
        (page, player, media)
    }

    fn start(page: &MemoryPage) -> Controller<MemoryPlayer, MemoryMedia> {
        Controller::start(page, &Settings::default(), RecordingSleeper::default()).unwrap()
    }

    #[test]
    fn state_follows_wiring() {
        assert_eq!(ControllerState::from(Wiring::Engaged), ControllerState::Engaged);
        assert_eq!(ControllerState::WaitingForPlayer.to_string(), "waiting for player");
    }

    #[test]
    fn subscribes_once_each() {
        let (page, player, media) = page(100.0, Some(-3.0));
        let _controller = start(&page);
        assert_eq!(player.observer_count(), 1);
        assert_eq!(media.observer_count(), 1);
    }

    #[test]
    fn pump_drains_queue() {
        let (page, player, media) = page(100.0, Some(2.0));
        let mut controller = start(&page);
        media.set_src("blob:a");
        player.set_volume(50.0);
        assert_eq!(controller.pump(), Ok(2));
        assert_eq!(controller.pump(), Ok(0));
        assert_eq!(controller.gain_state().effective_percent(), 50);
    }

    #[test]
    fn run_stops_on_cancel() {
        let (page, _player, media) = page(100.0, Some(-6.0));
        let mut controller = start(&page);
        media.set_src("blob:b");
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(controller.run(&cancel), Ok(()));
        // Cancelled before the loop body ran, so the event is still queued.
        assert_eq!(controller.pump(), Ok(1));
    }
}
