//! FFT-related constants and utilities shared across the crate.

use rustfft::num_complex::Complex;

/// Zero-valued complex number, used for FFT buffer initialization.
pub const COMPLEX_ZERO: Complex<f32> = Complex::new(0.0, 0.0);

/// Additive floor used in every mask normalization and frame normalization,
/// so silent bins never divide by zero.
pub const EPSILON: f32 = f32::EPSILON;

/// Number of non-mirrored bins (`0..=N/2`) for a transform of length `n`.
#[inline]
pub fn num_bins(window_length: usize) -> usize {
    window_length / 2 + 1
}

/// Writes `samples * window` into the real part of `buffer`, zeroing the
/// imaginary part and any trailing positions the samples do not cover.
#[inline]
pub fn load_windowed(buffer: &mut [Complex<f32>], samples: &[f32], window: &[f32]) {
    for (i, slot) in buffer.iter_mut().enumerate() {
        *slot = match (samples.get(i), window.get(i)) {
            (Some(&s), Some(&w)) => Complex::new(s * w, 0.0),
            _ => COMPLEX_ZERO,
        };
    }
}
