//! Offline rendering through the normalization pipeline.
//!
//! The file's audio stands in for the media element: an in-memory player
//! reports `--loudness-db`, the controller decides the wiring exactly as it
//! would in a page, and the samples are rendered block by block.

use std::path::{Path, PathBuf};

use clap::Args;

use loudnorm_control::{Controller, ControllerState};
use loudnorm_core::linear_to_db;
use loudnorm_host::RecordingSleeper;
use loudnorm_host::memory::{MemoryMedia, MemoryPage, MemoryPlayer};

use super::common::{load_settings, parse_db};
use crate::wav::{read_wav, write_wav};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (mono)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Content loudness relative to the reference, in dB
    #[arg(long, value_parser = parse_db, allow_hyphen_values = true)]
    loudness_db: f64,

    /// Processing block size (defaults to the settings file)
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

pub fn run(args: ProcessArgs, config: Option<&Path>) -> anyhow::Result<()> {
    anyhow::ensure!(
        matches!(args.bit_depth, 16 | 24 | 32),
        "bit depth must be 16, 24 or 32, got {}",
        args.bit_depth
    );

    let mut settings = load_settings(config)?;

    println!("Reading {}...", args.input.display());
    let (input, spec) = read_wav(&args.input)?;
    println!(
        "  {} samples, {} Hz, {:.2}s",
        input.len(),
        spec.sample_rate,
        input.len() as f32 / spec.sample_rate as f32
    );

    settings.render.sample_rate = spec.sample_rate;
    loudnorm_config::validate_settings(&settings)?;
    let block_size = args.block_size.unwrap_or(settings.render.block_size);
    anyhow::ensure!(block_size > 0, "block size must be positive");

    let page = MemoryPage::new();
    let player = MemoryPlayer::new(100.0);
    player.set_loudness_db(Some(args.loudness_db));
    page.add_player(&settings.selectors.player, player);
    let element = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".to_string());
    page.add_media(&settings.selectors.video, MemoryMedia::new(element));

    let mut controller: Controller<MemoryPlayer, MemoryMedia> =
        Controller::start(&page, &settings, RecordingSleeper::default())?;

    match controller.state() {
        ControllerState::Engaged => {
            let pipeline = controller.pipeline();
            println!(
                "Engaged: threshold {:.2} dB, gain {:.3}",
                pipeline.limiter().threshold_db(),
                pipeline.gain().gain()
            );
        }
        state => println!("Pipeline {state}: audio passes unchanged"),
    }

    let mut output = vec![0.0_f32; input.len()];
    for (inp, out) in input.chunks(block_size).zip(output.chunks_mut(block_size)) {
        controller.process_block(inp, out);
    }

    let (peak_in, peak_out) = (peak(&input), peak(&output));
    println!(
        "  peak {:.2} dBFS -> {:.2} dBFS",
        linear_to_db(peak_in),
        linear_to_db(peak_out)
    );

    write_wav(&args.output, &output, spec.sample_rate, args.bit_depth)?;
    println!("Wrote {}", args.output.display());
    Ok(())
}
