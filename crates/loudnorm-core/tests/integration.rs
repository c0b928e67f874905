//! Integration tests for loudnorm-core.
//!
//! Renders signals through the pipeline in both wirings and checks levels
//! at the output.

use loudnorm_core::{AudioPipeline, Wiring, db_to_linear, linear_to_db};

const SAMPLE_RATE: f32 = 48000.0;

fn sine(amplitude: f32, freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| amplitude * (core::f32::consts::TAU * freq_hz * n as f32 / SAMPLE_RATE).sin())
        .collect()
}

fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

fn render(pipeline: &mut AudioPipeline, input: &[f32]) -> Vec<f32> {
    let mut output = vec![0.0; input.len()];
    for (inp, out) in input.chunks(512).zip(output.chunks_mut(512)) {
        pipeline.process_block(inp, out);
    }
    output
}

#[test]
fn quiet_content_is_boosted_by_damped_gain() {
    let mut pipeline = AudioPipeline::new("video", SAMPLE_RATE).unwrap();
    let level = pipeline.set_level(-10.0);
    pipeline.engage().unwrap();

    // -30 dBFS sine stays well under the -10.5 dB threshold.
    let input = sine(db_to_linear(-30.0), 440.0, 9600);
    let output = render(&mut pipeline, &input);

    let boost_db = linear_to_db(peak(&output) / peak(&input));
    assert!((boost_db - 4.0).abs() < 0.05, "expected +4 dB, got {boost_db}");
    assert!((db_to_linear(4.0) - level.linear_gain).abs() < 1e-3);
}

#[test]
fn loud_content_is_held_near_threshold() {
    let mut pipeline = AudioPipeline::new("video", SAMPLE_RATE).unwrap();
    let level = pipeline.set_level(-6.0);
    pipeline.engage().unwrap();

    let input = sine(1.0, 100.0, 48000);
    let output = render(&mut pipeline, &input);

    // Skip the attack transient, then the output peak must sit far below
    // the unlimited boosted peak.
    let settled = peak(&output[24000..]);
    assert!(settled < level.linear_gain * 0.9, "settled peak {settled}");
    assert!(pipeline.limiter().reduction_db() < 0.0);
}

#[test]
fn bypass_restores_direct_path() {
    let mut pipeline = AudioPipeline::new("video", SAMPLE_RATE).unwrap();
    pipeline.set_level(-12.0);
    pipeline.engage().unwrap();
    let input = sine(0.2, 440.0, 2048);
    let boosted = render(&mut pipeline, &input);
    assert!(peak(&boosted) > peak(&input));

    pipeline.bypass().unwrap();
    assert_eq!(pipeline.wiring(), Wiring::Bypassed);
    let direct = render(&mut pipeline, &input);
    assert_eq!(direct, input);
}

#[test]
fn nodes_survive_rewiring() {
    let mut pipeline = AudioPipeline::new("video", SAMPLE_RATE).unwrap();
    let nodes = pipeline.nodes();
    let node_count = pipeline.graph().node_count();
    for _ in 0..10 {
        pipeline.engage().unwrap();
        pipeline.bypass().unwrap();
    }
    assert_eq!(pipeline.nodes(), nodes);
    assert_eq!(pipeline.graph().node_count(), node_count);
    assert_eq!(pipeline.graph().edge_count(), 2);
}
