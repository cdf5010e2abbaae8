//! Window functions for spectral analysis and segment cross-fading.
//!
//! Analysis windows are *periodic* (length `N`, period `N`), which makes a
//! Hamming or Hann window satisfy constant overlap-add at hops of `N/2` and
//! `N/4`. The triangular window is symmetric and only used for blending
//! adjacent segments.

use std::f64::consts::PI;

/// Hamming window coefficients.
const HAMMING_A0: f64 = 0.54;
const HAMMING_A1: f64 = 0.46;

/// Analysis window types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    /// Periodic Hamming window.
    #[default]
    Hamming,
    /// Periodic Hann window.
    Hann,
}

/// Generates a periodic analysis window of the specified type and size.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f32> {
    match window_type {
        WindowType::Hamming => cosine_window(size, HAMMING_A0, HAMMING_A1),
        WindowType::Hann => cosine_window(size, 0.5, 0.5),
    }
}

/// Returns `Some(trivial_window)` for degenerate sizes (0 or 1), or `None`
/// to indicate the caller should compute the full window.
#[inline]
fn trivial_window(size: usize) -> Option<Vec<f32>> {
    match size {
        0 => Some(vec![]),
        1 => Some(vec![1.0]),
        _ => None,
    }
}

/// Generates a periodic two-term cosine window `a0 - a1 cos(2πn/N)`.
#[inline]
fn cosine_window(size: usize, a0: f64, a1: f64) -> Vec<f32> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = (2.0 * PI * i as f64) / n;
            (a0 - a1 * x.cos()) as f32
        })
        .collect()
}

/// Generates a symmetric triangular window of even or odd length.
///
/// For an even length `2L`, the first half rises as `(2n+1)/(2L)` and the
/// second half mirrors it, so `w[n] + w[n + L] == 1` for every `n < L`.
pub fn triangular_window(size: usize) -> Vec<f32> {
    if let Some(w) = trivial_window(size) {
        return w;
    }
    let n = size as f64;
    (0..size)
        .map(|i| {
            let k = i.min(size - 1 - i) as f64;
            if size % 2 == 0 {
                ((2.0 * k + 1.0) / n) as f32
            } else {
                ((2.0 * (k + 1.0)) / (n + 1.0)) as f32
            }
        })
        .collect()
}

/// Sum of the window sampled every `step` samples.
///
/// For a window/step pair satisfying constant overlap-add this is the
/// constant the overlapped windows add up to.
#[inline]
pub fn overlap_gain(window: &[f32], step: usize) -> f32 {
    if step == 0 {
        return 0.0;
    }
    window.iter().step_by(step).sum()
}
