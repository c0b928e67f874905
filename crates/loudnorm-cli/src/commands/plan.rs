//! Decision preview for a single loudness value.
//!
//! The preview starts a real controller against an in-memory player that
//! reports `--loudness-db` at `--volume`, then reads back what it decided.

use std::path::Path;

use clap::Args;
use serde::Serialize;

use loudnorm_config::Settings;
use loudnorm_control::{Controller, ControllerState};
use loudnorm_core::linear_to_db;
use loudnorm_host::RecordingSleeper;
use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};

use super::common::{load_settings, parse_db};

#[derive(Args)]
pub struct PlanArgs {
    /// Content loudness relative to the reference, in dB (e.g. -6)
    #[arg(long, value_parser = parse_db, allow_hyphen_values = true)]
    loudness_db: f64,

    /// Player volume, 0-100
    #[arg(long, default_value = "100")]
    volume: f64,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum Decision {
    Bypass,
    Engage,
}

#[derive(Debug, Serialize)]
struct Plan {
    loudness_db: f64,
    decision: Decision,
    threshold_db: Option<f32>,
    applied_gain: Option<f32>,
    display_gain: Option<f64>,
    volume_percent: u32,
}

fn plan(loudness_db: f64, volume: f64, settings: &Settings) -> anyhow::Result<Plan> {
    let page = MemoryPage::new();
    let player = MemoryPlayer::new(volume);
    player.set_loudness_db(Some(loudness_db));
    page.add_player(&settings.selectors.player, player);
    page.add_media(&settings.selectors.video, MemoryMedia::new("plan"));

    let controller: Controller<MemoryPlayer, MemoryMedia> =
        Controller::start(&page, settings, RecordingSleeper::default())?;
    let gain = controller.gain_state();
    let pipeline = controller.pipeline();

    let (decision, threshold_db, applied_gain, display_gain) = match controller.state() {
        ControllerState::Engaged => (
            Decision::Engage,
            Some(pipeline.limiter().threshold_db()),
            Some(pipeline.gain().gain()),
            Some(gain.user_gain()),
        ),
        _ => (Decision::Bypass, None, None, None),
    };

    Ok(Plan {
        loudness_db,
        decision,
        threshold_db,
        applied_gain,
        display_gain,
        volume_percent: gain.effective_percent(),
    })
}

pub fn run(args: PlanArgs, config: Option<&Path>) -> anyhow::Result<()> {
    anyhow::ensure!(
        (0.0..=100.0).contains(&args.volume),
        "volume must be within 0-100, got {}",
        args.volume
    );

    let settings = load_settings(config)?;
    let plan = plan(args.loudness_db, args.volume, &settings)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Loudness:      {:+.2} dB", plan.loudness_db);
    match plan.decision {
        Decision::Bypass => {
            println!("Decision:      bypass (no amplification needed)");
        }
        Decision::Engage => {
            println!("Decision:      engage limiter + gain");
        }
    }
    if let (Some(threshold), Some(applied), Some(display)) =
        (plan.threshold_db, plan.applied_gain, plan.display_gain)
    {
        println!("Threshold:     {threshold:.3} dB");
        println!(
            "Applied gain:  {applied:.3} ({:+.2} dB)",
            linear_to_db(applied)
        );
        println!("Display gain:  {display:.3}");
    }
    println!("Volume:        {}%", plan.volume_percent);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_content_engages() {
        let p = plan(-6.0, 100.0, &Settings::default()).unwrap();
        assert_eq!(p.decision, Decision::Engage);
        assert!((p.threshold_db.unwrap() - -6.3158).abs() < 1e-3);
        assert!((p.applied_gain.unwrap() - 1.3183).abs() < 1e-3);
        assert_eq!(p.volume_percent, 200);
    }

    #[test]
    fn reference_level_bypasses() {
        let p = plan(0.0, 80.0, &Settings::default()).unwrap();
        assert_eq!(p.decision, Decision::Bypass);
        assert_eq!(p.applied_gain, None);
        assert_eq!(p.volume_percent, 80);
    }

    #[test]
    fn matches_controller_percent_rounding() {
        let p = plan(-3.0, 37.0, &Settings::default()).unwrap();
        assert_eq!(p.decision, Decision::Engage);
        // 10^(3/20) * 37 = 52.26
        assert_eq!(p.volume_percent, 52);
        assert!((p.display_gain.unwrap() - 1.4125).abs() < 1e-4);
    }

    #[test]
    fn extreme_loudness_reports_clamped_threshold() {
        let p = plan(-200.0, 100.0, &Settings::default()).unwrap();
        assert_eq!(p.threshold_db, Some(-100.0));
    }
}
