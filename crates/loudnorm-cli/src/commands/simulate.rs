//! Scripted run of the controller against the in-memory host.
//!
//! # Scenario format
//!
//! ```toml
//! volume = 100.0
//! loudness_db = -6.0      # initial metadata; omit to make startup time out
//! player_delay = 3        # lookups before the player appears
//! video_delay = 0
//!
//! [[steps]]
//! action = "load"         # new video; omit loudness_db for unknown
//! loudness_db = -2.5
//!
//! [[steps]]
//! action = "volume"
//! level = 40.0
//!
//! [[steps]]
//! action = "mutate"       # player display change
//!
//! [[steps]]
//! action = "clear_metadata"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Deserialize;

use loudnorm_control::Controller;
use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};
use loudnorm_host::{PlayerResponse, RecordingSleeper, Waiter};

use super::common::load_settings;

#[derive(Args)]
pub struct SimulateArgs {
    /// Scenario file (TOML)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default = "full_volume")]
    volume: f64,
    #[serde(default)]
    loudness_db: Option<f64>,
    #[serde(default)]
    player_delay: u32,
    #[serde(default)]
    video_delay: u32,
    #[serde(default)]
    steps: Vec<Step>,
}

fn full_volume() -> f64 {
    100.0
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Load {
        #[serde(default)]
        loudness_db: Option<f64>,
        #[serde(default)]
        src: Option<String>,
    },
    Volume {
        level: f64,
    },
    Mutate,
    ClearMetadata,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load {
                loudness_db: Some(db),
                ..
            } => write!(f, "load {db:+.1} dB"),
            Self::Load { .. } => f.write_str("load (unknown loudness)"),
            Self::Volume { level } => write!(f, "volume {level}"),
            Self::Mutate => f.write_str("mutate"),
            Self::ClearMetadata => f.write_str("clear metadata"),
        }
    }
}

type SimController = Controller<MemoryPlayer, MemoryMedia>;

fn report(label: &str, controller: &SimController, handled: usize) {
    let gain = controller.gain_state();
    let pipeline = controller.pipeline();
    let mut line = format!(
        "{label:<28} {:<9} volume {:>3}%",
        controller.state().to_string(),
        gain.effective_percent()
    );
    if pipeline.is_engaged() {
        line.push_str(&format!(
            "  threshold {:.2} dB  gain {:.3}",
            pipeline.limiter().threshold_db(),
            pipeline.gain().gain()
        ));
    }
    if handled > 0 {
        line.push_str(&format!("  ({handled} event{})", if handled == 1 { "" } else { "s" }));
    }
    println!("{line}");
}

pub fn run(args: SimulateArgs, config: Option<&Path>) -> anyhow::Result<()> {
    let settings = load_settings(config)?;
    let text = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = toml::from_str(&text)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;

    let page = MemoryPage::new();
    let player = MemoryPlayer::new(scenario.volume);
    player.set_response(scenario.loudness_db.map(PlayerResponse::with_loudness_db));
    let media = MemoryMedia::new("video-0");
    page.add_player_after(&settings.selectors.player, player.clone(), scenario.player_delay);
    page.add_media_after(&settings.selectors.video, media.clone(), scenario.video_delay);

    let policy = settings.wait_policy();
    let mut sleeper = RecordingSleeper::default();
    let started = SimController::start_with(&page, &settings, Waiter::new(policy, &mut sleeper));
    println!(
        "startup waited {} ms ({} attempts)",
        sleeper.total().as_millis(),
        sleeper.count()
    );
    let mut controller: SimController = started.context("controller did not start")?;
    report("start", &controller, 0);

    for (n, step) in scenario.steps.iter().enumerate() {
        match step {
            Step::Load { loudness_db, src } => {
                player.set_response(loudness_db.map(PlayerResponse::with_loudness_db));
                media.set_src(src.clone().unwrap_or_else(|| format!("video-{}", n + 1)));
            }
            Step::Volume { level } => player.set_volume(*level),
            Step::Mutate => player.mutate(),
            Step::ClearMetadata => player.set_loudness_db(None),
        }
        let handled = controller.pump()?;
        report(&format!("{}. {step}", n + 1), &controller, handled);
    }

    Ok(())
}
