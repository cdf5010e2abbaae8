//! Repeating-mask synthesis.
//!
//! Every strategy estimates a repeating spectrogram `W` from the observed
//! magnitudes `V` and turns it into a soft mask
//! `(min(V, W) + ε) / (V + ε)`: the repeating part can never hold more energy
//! than was observed, and the epsilon keeps silent bins finite.

pub mod adaptive;
pub mod fixed;
pub mod similarity;

use rustfft::num_complex::Complex;

use crate::core::fft::EPSILON;
use crate::core::spectrogram::{Magnitudes, Spectrogram};

pub use adaptive::adaptive_mask;
pub use fixed::{fixed_mask, repeating_segment};
pub use similarity::similarity_mask;

/// Turns a repeating estimate into a mask in place, given the observed frame.
#[inline]
pub fn finalize_frame(observed: &[f32], repeating: &mut [f32]) {
    for (r, &v) in repeating.iter_mut().zip(observed.iter()) {
        *r = (r.min(v) + EPSILON) / (v + EPSILON);
    }
}

/// Highest bin forced to the background for a cutoff frequency.
#[inline]
pub fn cutoff_bin(cutoff_hz: f64, window_length: usize, sample_rate: u32) -> usize {
    (cutoff_hz * window_length.saturating_sub(1) as f64 / sample_rate as f64).ceil() as usize
}

/// Forces bins `1..=cutoff_bin` of one mask frame to 1. DC is left as estimated.
#[inline]
pub fn apply_cutoff_frame(mask: &mut [f32], cutoff_bin: usize) {
    let end = (cutoff_bin + 1).min(mask.len());
    if end > 1 {
        mask[1..end].iter_mut().for_each(|m| *m = 1.0);
    }
}

/// Forces the low band of every frame to the background.
pub fn apply_cutoff(mask: &mut Magnitudes, cutoff_bin: usize) {
    for t in 0..mask.num_frames() {
        apply_cutoff_frame(mask.frame_mut(t), cutoff_bin);
    }
}

/// Multiplies a full complex frame by a half-spectrum mask mirrored across Nyquist.
#[inline]
pub fn apply_mask_frame(spectrum: &mut [Complex<f32>], mask: &[f32]) {
    let n = spectrum.len();
    for (k, c) in spectrum.iter_mut().enumerate() {
        let bin = if k < mask.len() { k } else { n - k };
        *c *= mask[bin];
    }
}

/// Applies a half-spectrum mask to every frame of a spectrogram.
pub fn apply_mask(spectrogram: &mut Spectrogram, mask: &Magnitudes) {
    debug_assert_eq!(spectrogram.num_frames(), mask.num_frames());
    for (t, frame) in spectrogram.frames_mut().enumerate() {
        apply_mask_frame(frame, mask.frame(t));
    }
}
