#![allow(dead_code)]

use std::f32::consts::PI;

use rand::prelude::*;
use repet::{SeparationError, StreamSeparator};

/// Routes `log` output through the test harness; repeated calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn gen_sine<F>(freq_hz: f32, sr: u32, n: usize, amp_fn: F) -> Vec<f32>
where
    F: Fn(usize) -> f32,
{
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * freq_hz * i as f32 / sr as f32;
            amp_fn(i) * phase.sin()
        })
        .collect()
}

pub fn gen_impulse_train(period: usize, n: usize, amp: f32) -> Vec<f32> {
    let mut out = vec![0.0f32; n];
    if period == 0 {
        return out;
    }
    for i in (0..n).step_by(period) {
        out[i] = amp;
    }
    out
}

/// Uniform noise in `[-amp, amp)` from a fixed seed.
pub fn gen_noise(seed: u64, n: usize, amp: f32) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random_range(-amp..amp)).collect()
}

/// A random pattern of `period` samples repeated over `n` samples.
pub fn gen_repeating_noise(seed: u64, period: usize, n: usize, amp: f32) -> Vec<f32> {
    let pattern = gen_noise(seed, period, amp);
    (0..n).map(|i| pattern[i % period]).collect()
}

pub fn add_into(dst: &mut [f32], src: &[f32], offset: usize) {
    for (d, &s) in dst[offset..].iter_mut().zip(src.iter()) {
        *d += s;
    }
}

pub fn windowed_rms(signal: &[f32], start: usize, len: usize) -> f64 {
    if signal.is_empty() || len == 0 {
        return 0.0;
    }
    let start = start.min(signal.len());
    let end = (start + len).min(signal.len());
    if end <= start {
        return 0.0;
    }
    let sum_sq: f64 = signal[start..end]
        .iter()
        .map(|&s| {
            let v = s as f64;
            v * v
        })
        .sum();
    (sum_sq / (end - start) as f64).sqrt()
}

pub fn rms_diff(a: &[f32], b: &[f32]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = (x - y) as f64;
            d * d
        })
        .sum();
    (sum_sq / n as f64).sqrt()
}

/// Zero-lag normalised cross-correlation.
pub fn ncc(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(&x, &y)| x as f64 * y as f64).sum();
    let ea: f64 = a.iter().map(|&x| (x as f64).powi(2)).sum();
    let eb: f64 = b.iter().map(|&x| (x as f64).powi(2)).sum();
    if ea <= 0.0 || eb <= 0.0 {
        return 0.0;
    }
    dot / (ea.sqrt() * eb.sqrt())
}

/// Feeds `input` to `separator` in chunks of `chunk_frames` interleaved
/// frames and flushes.
pub fn run_stream(
    separator: &mut StreamSeparator,
    input: &[f32],
    channels: usize,
    chunk_frames: usize,
) -> Result<Vec<f32>, SeparationError> {
    let mut output = Vec::with_capacity(input.len());
    for chunk in input.chunks(chunk_frames.max(1) * channels) {
        output.extend(separator.process(chunk)?);
    }
    output.extend(separator.flush()?);
    Ok(output)
}

pub fn assert_all_finite(signal: &[f32]) {
    for (i, s) in signal.iter().enumerate() {
        assert!(s.is_finite(), "sample {} is not finite: {}", i, s);
    }
}
