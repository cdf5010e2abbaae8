//! Reconstruction tests: transforms that must hand the input back unchanged.

mod common;

use common::*;
use repet::{separate, separate_channels, AudioBuffer, Mode, SeparationParams, Stft, WindowType};

const SR: u32 = 8000;
/// 20 hops of 128 samples.
const PATTERN: usize = 2560;

fn params(mode: Mode) -> SeparationParams {
    SeparationParams::new(mode)
        .with_window_seconds(0.0315)
        .with_period_range(0.22, 0.4)
        .with_segments(3.0, 1.5)
        .with_similarity(0.9, 0.064, 50)
}

// ========== STFT round trip ==========

#[test]
fn test_stft_roundtrip_cola_configurations() {
    let input = gen_noise(1, 20_000, 0.8);
    for &(window_type, window_length, step) in &[
        (WindowType::Hamming, 1024, 512),
        (WindowType::Hamming, 1024, 256),
        (WindowType::Hann, 1024, 512),
        (WindowType::Hann, 1024, 256),
    ] {
        let stft = Stft::new(window_type, window_length, step).unwrap();
        let output = stft.inverse(&stft.forward(&input));
        let err = rms_diff(&input, &output[..input.len()]);
        assert!(
            err < 1e-5,
            "{:?} {}/{}: rms error {}",
            window_type,
            window_length,
            step,
            err
        );
    }
}

#[test]
fn test_hamming_half_overlap_gain() {
    let stft = Stft::new(WindowType::Hamming, 2048, 1024).unwrap();
    assert!((stft.gain() - 1.08).abs() < 1e-4);
}

// ========== Fully repeating input is all background ==========

#[test]
fn test_repeating_signal_passes_through_every_batch_mode() {
    init_logging();
    let input = gen_repeating_noise(7, PATTERN, 10 * SR as usize, 0.5);
    for mode in [Mode::Original, Mode::Extended, Mode::Adaptive, Mode::Similarity] {
        let output = separate_channels(&[input.clone()], SR, &params(mode)).unwrap();
        assert_eq!(output[0].len(), input.len());
        let err = rms_diff(&output[0][8000..72000], &input[8000..72000]);
        assert!(err < 1e-3, "{:?}: rms error {}", mode, err);
    }
}

// ========== Degenerate inputs ==========

#[test]
fn test_silence_in_silence_out_all_modes() {
    let input = AudioBuffer::new(vec![0.0; 2 * 3 * SR as usize], 2, SR).unwrap();
    for mode in [
        Mode::Original,
        Mode::Extended,
        Mode::Adaptive,
        Mode::Similarity,
        Mode::OnlineSimilarity,
    ] {
        let params = params(mode).with_segments(1.0, 0.5);
        let output = separate(&input, &params).unwrap();
        assert_eq!(output.data.len(), input.data.len(), "{:?}", mode);
        assert_eq!(output.channels, 2);
        assert!(
            output.data.iter().all(|&s| s == 0.0),
            "{:?}: silence produced non-zero output",
            mode
        );
    }
}

#[test]
fn test_signal_shorter_than_one_window() {
    let input = gen_sine(440.0, SR, 10, |_| 0.3);
    for mode in [
        Mode::Original,
        Mode::Extended,
        Mode::Adaptive,
        Mode::Similarity,
        Mode::OnlineSimilarity,
    ] {
        let output = separate_channels(&[input.clone()], SR, &params(mode)).unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].len(), 10, "{:?}", mode);
        assert_all_finite(&output[0]);
    }
}

#[test]
fn test_stereo_shape_preserved() {
    let left = gen_noise(3, 2 * SR as usize, 0.5);
    let right = gen_sine(330.0, SR, 2 * SR as usize, |_| 0.4);
    let input = AudioBuffer::from_channels(&[left, right], SR).unwrap();
    for mode in [
        Mode::Original,
        Mode::Extended,
        Mode::Adaptive,
        Mode::Similarity,
        Mode::OnlineSimilarity,
    ] {
        let output = separate(&input, &params(mode)).unwrap();
        assert_eq!(output.channels, 2);
        assert_eq!(output.sample_rate, SR);
        assert_eq!(output.num_samples(), input.num_samples(), "{:?}", mode);
        assert_all_finite(&output.data);
    }
}
