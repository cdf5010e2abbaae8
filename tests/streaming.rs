//! Online separation: causality, chunking and parity with batch similarity.

mod common;

use common::*;
use repet::{separate_channels, Mode, SeparationParams, StreamSeparator};

const SR: u32 = 8000;

fn params() -> SeparationParams {
    SeparationParams::new(Mode::OnlineSimilarity)
        .with_window_seconds(0.0315)
        .with_similarity(0.0, 0.064, 20)
        .with_buffer_seconds(2.0)
}

// ========== Output length ==========

#[test]
fn test_output_length_matches_input_for_any_chunking() {
    let n = 3 * SR as usize + 77;
    for &channels in &[1usize, 2] {
        let input = gen_noise(1, n * channels, 0.5);
        for &chunk in &[1usize, 7, 128, 1000, n] {
            let mut sep = StreamSeparator::new(&params(), SR, channels as u16).unwrap();
            let output = run_stream(&mut sep, &input, channels, chunk).unwrap();
            assert_eq!(
                output.len(),
                input.len(),
                "{} channel(s), chunk {}",
                channels,
                chunk
            );
            assert_all_finite(&output);
        }
    }
}

#[test]
fn test_chunking_invariance() {
    let input = gen_noise(2, 2 * 2 * SR as usize, 0.5);
    let mut reference_sep = StreamSeparator::new(&params(), SR, 2).unwrap();
    let reference = run_stream(&mut reference_sep, &input, 2, input.len()).unwrap();
    for &chunk in &[1usize, 100, 333, 4096] {
        let mut sep = StreamSeparator::new(&params(), SR, 2).unwrap();
        let output = run_stream(&mut sep, &input, 2, chunk).unwrap();
        assert_eq!(output, reference, "chunk {}", chunk);
    }
}

#[test]
fn test_reuse_after_flush() {
    let input = gen_noise(3, SR as usize, 0.5);
    let mut sep = StreamSeparator::new(&params(), SR, 1).unwrap();
    let first = run_stream(&mut sep, &input, 1, 512).unwrap();
    let second = run_stream(&mut sep, &input, 1, 512).unwrap();
    assert_eq!(first, second);
    assert_eq!(sep.frames_processed(), 0);
}

// ========== Causality ==========

#[test]
fn test_output_prefix_independent_of_future_input() {
    let n = 3 * SR as usize;
    let diverge = 2 * SR as usize;
    let a = gen_noise(4, n, 0.5);
    let mut b = a.clone();
    let different = gen_sine(700.0, SR, n - diverge, |_| 0.9);
    b[diverge..].copy_from_slice(&different);

    let mut sep = StreamSeparator::new(&params(), SR, 1).unwrap();
    let latency = sep.latency_samples();
    let out_a = run_stream(&mut sep, &a, 1, 300).unwrap();
    let out_b = run_stream(&mut sep, &b, 1, 300).unwrap();

    let prefix = diverge - latency;
    assert_eq!(&out_a[..prefix], &out_b[..prefix]);
    assert_ne!(&out_a[diverge..], &out_b[diverge..]);
}

#[test]
fn test_emits_before_flush() {
    let mut sep = StreamSeparator::new(&params(), SR, 1).unwrap();
    let latency = sep.latency_samples();
    assert_eq!(latency, 256);
    let input = gen_noise(5, 4 * latency, 0.5);
    let output = sep.process(&input).unwrap();
    // Everything but the last window is final
    assert!(output.len() >= input.len() - latency);
}

// ========== Batch parity ==========

#[test]
fn test_stream_matches_batch_similarity() {
    init_logging();
    // Background repeating every 8 hops: both separators keep it intact
    let n = 5 * SR as usize;
    let input = gen_repeating_noise(6, 8 * 128, n, 0.5);

    let batch_params = params().with_mode(Mode::Similarity);
    let batch = separate_channels(&[input.clone()], SR, &batch_params).unwrap();

    let mut sep = StreamSeparator::new(&params(), SR, 1).unwrap();
    let stream = run_stream(&mut sep, &input, 1, 1024).unwrap();

    // Compare once the stream's history spans several repetitions
    let start = SR as usize;
    let corr = ncc(&batch[0][start..], &stream[start..]);
    assert!(corr >= 0.95, "normalised cross-correlation {}", corr);
}

#[test]
fn test_stream_and_batch_remove_non_repeating_burst() {
    init_logging();
    let n = 5 * SR as usize;
    let pattern = gen_repeating_noise(6, 8 * 128, n, 0.5);
    // A 1 kHz burst well past the first second, so the history is full
    let tone = gen_sine(1000.0, SR, 1280, |_| 0.5);
    let mut mix = pattern.clone();
    add_into(&mut mix, &tone, 24_000);

    let batch_params = params().with_mode(Mode::Similarity);
    let batch = separate_channels(&[mix.clone()], SR, &batch_params).unwrap();

    let mut sep = StreamSeparator::new(&params(), SR, 1).unwrap();
    let stream = run_stream(&mut sep, &mix, 1, 1024).unwrap();

    let (start, end) = (24_256, 25_024);
    let tone_rms = windowed_rms(&tone, 256, 768);
    let batch_residual = rms_diff(&batch[0][start..end], &pattern[start..end]);
    let stream_residual = rms_diff(&stream[start..end], &pattern[start..end]);

    assert!(
        batch_residual < 0.6 * tone_rms,
        "batch residual {} vs tone rms {}",
        batch_residual,
        tone_rms
    );
    assert!(
        stream_residual < 0.6 * tone_rms,
        "stream residual {} vs tone rms {}",
        stream_residual,
        tone_rms
    );
    assert!(
        (batch_residual - stream_residual).abs() < 0.1 * tone_rms,
        "batch {} vs stream {}",
        batch_residual,
        stream_residual
    );
    let corr = ncc(&batch[0][start..end], &stream[start..end]);
    assert!(corr >= 0.95, "normalised cross-correlation {}", corr);
}

#[test]
fn test_online_mode_through_batch_api() {
    let input = gen_noise(8, 2 * SR as usize, 0.5);
    let batch = separate_channels(&[input.clone()], SR, &params()).unwrap();
    let mut sep = StreamSeparator::new(&params(), SR, 1).unwrap();
    let stream = run_stream(&mut sep, &input, 1, 999).unwrap();
    assert_eq!(batch[0], stream);
}

// ========== Channels ==========

#[test]
fn test_silent_channel_stays_silent() {
    let n = 2 * SR as usize;
    let right = gen_noise(9, n, 0.5);
    let mut interleaved = Vec::with_capacity(2 * n);
    for &r in &right {
        interleaved.push(0.0);
        interleaved.push(r);
    }
    let mut sep = StreamSeparator::new(&params(), SR, 2).unwrap();
    let output = run_stream(&mut sep, &interleaved, 2, 640).unwrap();
    assert!(output.iter().step_by(2).all(|&s| s == 0.0));
    assert!(windowed_rms(&output, 0, output.len()) > 0.0);
}
