//! Frame-major spectrogram containers.

use rustfft::num_complex::Complex;

use crate::core::fft::{num_bins, COMPLEX_ZERO};

/// Complex short-time spectrum of one channel.
///
/// Holds all `window_length` bins of every frame (mirrored bins included) so
/// that the inverse transform can run directly on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    window_length: usize,
    num_frames: usize,
    data: Vec<Complex<f32>>,
}

impl Spectrogram {
    /// Creates an all-zero spectrogram.
    pub fn zeros(window_length: usize, num_frames: usize) -> Self {
        Self {
            window_length,
            num_frames,
            data: vec![COMPLEX_ZERO; window_length * num_frames],
        }
    }

    #[inline]
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Number of non-mirrored bins.
    #[inline]
    pub fn num_bins(&self) -> usize {
        num_bins(self.window_length)
    }

    #[inline]
    pub fn frame(&self, t: usize) -> &[Complex<f32>] {
        &self.data[t * self.window_length..(t + 1) * self.window_length]
    }

    #[inline]
    pub fn frame_mut(&mut self, t: usize) -> &mut [Complex<f32>] {
        &mut self.data[t * self.window_length..(t + 1) * self.window_length]
    }

    /// Mutable iterator over frames.
    pub fn frames_mut(&mut self) -> std::slice::ChunksExactMut<'_, Complex<f32>> {
        self.data.chunks_exact_mut(self.window_length.max(1))
    }

    /// Magnitudes of bins `0..=window_length/2`.
    pub fn magnitudes(&self) -> Magnitudes {
        let bins = self.num_bins();
        let mut mags = Magnitudes::zeros(bins, self.num_frames);
        for t in 0..self.num_frames {
            let src = self.frame(t);
            for (dst, c) in mags.frame_mut(t).iter_mut().zip(src.iter()) {
                *dst = c.norm();
            }
        }
        mags
    }
}

/// Real, non-negative `num_bins × num_frames` matrix stored frame-major.
///
/// Used for magnitude spectrograms, power spectrograms and repeating masks.
#[derive(Debug, Clone, PartialEq)]
pub struct Magnitudes {
    num_bins: usize,
    num_frames: usize,
    data: Vec<f32>,
}

impl Magnitudes {
    /// Creates an all-zero matrix.
    pub fn zeros(num_bins: usize, num_frames: usize) -> Self {
        Self {
            num_bins,
            num_frames,
            data: vec![0.0; num_bins * num_frames],
        }
    }

    /// Builds a matrix from per-frame columns. All frames must share one length.
    pub fn from_frames(frames: &[Vec<f32>]) -> Self {
        let num_bins = frames.first().map_or(0, |f| f.len());
        let mut data = Vec::with_capacity(num_bins * frames.len());
        for frame in frames {
            debug_assert_eq!(frame.len(), num_bins);
            data.extend_from_slice(frame);
        }
        Self {
            num_bins,
            num_frames: frames.len(),
            data,
        }
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    #[inline]
    pub fn get(&self, bin: usize, frame: usize) -> f32 {
        self.data[frame * self.num_bins + bin]
    }

    #[inline]
    pub fn frame(&self, t: usize) -> &[f32] {
        &self.data[t * self.num_bins..(t + 1) * self.num_bins]
    }

    #[inline]
    pub fn frame_mut(&mut self, t: usize) -> &mut [f32] {
        &mut self.data[t * self.num_bins..(t + 1) * self.num_bins]
    }

    /// Iterator over frames in time order.
    pub fn frames(&self) -> std::slice::ChunksExact<'_, f32> {
        self.data.chunks_exact(self.num_bins.max(1))
    }

    /// Flat frame-major storage, for frame-parallel writers.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Copies one bin's values across all frames into `out`.
    pub fn bin_series_into(&self, bin: usize, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.frames().map(|f| f[bin]));
    }

    /// Per-bin mean of squared magnitudes across channels.
    ///
    /// Repetition structure is shared across channels, and squaring sharpens
    /// the periodicity peaks, so every estimation step runs on this matrix.
    /// Returns `None` when `channels` is empty.
    pub fn power_mean(channels: &[Magnitudes]) -> Option<Magnitudes> {
        let first = channels.first()?;
        let mut out = Magnitudes::zeros(first.num_bins, first.num_frames);
        for ch in channels {
            debug_assert_eq!(ch.data.len(), out.data.len());
            for (acc, &v) in out.data.iter_mut().zip(ch.data.iter()) {
                *acc += v * v;
            }
        }
        let scale = 1.0 / channels.len() as f32;
        out.data.iter_mut().for_each(|v| *v *= scale);
        Some(out)
    }

    /// Copies frames `[start, start + len)`; frames outside the matrix are zero.
    pub fn window(&self, start: isize, len: usize) -> Magnitudes {
        let mut out = Magnitudes::zeros(self.num_bins, len);
        for i in 0..len {
            let t = start + i as isize;
            if t >= 0 && (t as usize) < self.num_frames {
                out.frame_mut(i).copy_from_slice(self.frame(t as usize));
            }
        }
        out
    }
}
