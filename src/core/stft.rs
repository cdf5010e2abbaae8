//! Short-time Fourier transform with constant-overlap-add reconstruction.
//!
//! Frames are centred on sample boundaries by padding `window_length - step`
//! zeros at the head and enough zeros at the tail to complete the last frame.
//! The inverse removes the same padding and divides by the overlapped window
//! gain, so an unmodified spectrogram reconstructs the input exactly (up to
//! floating-point rounding) whenever the window/step pair is COLA.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::core::fft::{load_windowed, num_bins, COMPLEX_ZERO};
use crate::core::spectrogram::Spectrogram;
use crate::core::window::{generate_window, overlap_gain, WindowType};
use crate::error::SeparationError;

/// Planned forward/inverse transform pair for one window/step configuration.
#[derive(Clone)]
pub struct Stft {
    window_length: usize,
    step: usize,
    window: Vec<f32>,
    /// `Σ window[0:step:window_length]`.
    gain: f32,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("window_length", &self.window_length)
            .field("step", &self.step)
            .field("gain", &self.gain)
            .finish()
    }
}

impl Stft {
    /// Plans a transform.
    ///
    /// # Errors
    /// Returns `SeparationError::InvalidParams` unless
    /// `0 < step <= window_length` and `window_length >= 2`.
    pub fn new(
        window_type: WindowType,
        window_length: usize,
        step: usize,
    ) -> Result<Self, SeparationError> {
        if window_length < 2 || step == 0 || step > window_length {
            return Err(SeparationError::InvalidParams(format!(
                "window length {} / step {} do not form a valid STFT",
                window_length, step
            )));
        }
        let window = generate_window(window_type, window_length);
        let gain = overlap_gain(&window, step);
        let mut planner = FftPlanner::new();
        Ok(Self {
            window_length,
            step,
            window,
            gain,
            forward: planner.plan_fft_forward(window_length),
            inverse: planner.plan_fft_inverse(window_length),
        })
    }

    #[inline]
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        num_bins(self.window_length)
    }

    #[inline]
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Overlapped window gain divided out by the inverse transform.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Head padding in samples.
    #[inline]
    pub fn padding(&self) -> usize {
        self.window_length - self.step
    }

    /// Number of frames covering `num_samples` samples (at least one).
    #[inline]
    pub fn num_frames(&self, num_samples: usize) -> usize {
        (self.padding() + num_samples).div_ceil(self.step).max(1)
    }

    /// Forward transform of a whole channel.
    pub fn forward(&self, signal: &[f32]) -> Spectrogram {
        let num_frames = self.num_frames(signal.len());
        let pad = self.padding();
        let padded_len = num_frames * self.step + pad;
        let mut padded = vec![0.0f32; padded_len];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let mut spec = Spectrogram::zeros(self.window_length, num_frames);
        for (t, frame) in spec.frames_mut().enumerate() {
            let start = t * self.step;
            self.forward_frame(&padded[start..start + self.window_length], frame);
        }
        spec
    }

    /// Windows `samples` into `out` and transforms it in place.
    ///
    /// `samples` shorter than the window are zero-padded.
    #[inline]
    pub fn forward_frame(&self, samples: &[f32], out: &mut [Complex<f32>]) {
        load_windowed(out, samples, &self.window);
        self.forward.process(out);
    }

    /// Inverse transform of one frame in place, scaled so the real part is
    /// the windowed time-domain frame.
    #[inline]
    pub fn inverse_frame(&self, buffer: &mut [Complex<f32>]) {
        self.inverse.process(buffer);
        let norm = 1.0 / self.window_length as f32;
        for c in buffer.iter_mut() {
            *c = Complex::new(c.re * norm, 0.0);
        }
    }

    /// Inverse transform with overlap-add.
    ///
    /// Returns `num_frames * step - (window_length - step)` samples; callers
    /// truncate to the original signal length.
    pub fn inverse(&self, spec: &Spectrogram) -> Vec<f32> {
        let num_frames = spec.num_frames();
        let pad = self.padding();
        let total = num_frames * self.step + pad;
        let mut accum = vec![0.0f32; total];
        let mut buffer = vec![COMPLEX_ZERO; self.window_length];

        for t in 0..num_frames {
            buffer.copy_from_slice(spec.frame(t));
            self.inverse_frame(&mut buffer);
            let start = t * self.step;
            for (acc, c) in accum[start..start + self.window_length]
                .iter_mut()
                .zip(buffer.iter())
            {
                *acc += c.re;
            }
        }

        let inv_gain = if self.gain > 0.0 { 1.0 / self.gain } else { 0.0 };
        let end = total.saturating_sub(pad).max(pad);
        accum[pad..end].iter().map(|&s| s * inv_gain).collect()
    }
}
