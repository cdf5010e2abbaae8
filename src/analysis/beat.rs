//! Beat spectrum, beat spectrogram and repeating-period estimation.
//!
//! The beat spectrum is the autocorrelation of the (power) spectrogram along
//! time, averaged over frequency bins. Its peaks sit at the lags where the
//! spectrogram repeats itself; the highest peak inside the admissible range
//! is the repeating period.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::core::fft::COMPLEX_ZERO;
use crate::core::params::PeriodRange;
use crate::core::spectrogram::Magnitudes;

/// Unbiased autocorrelation via the Wiener–Khinchin theorem.
///
/// Plans one forward/inverse FFT pair of length `2 * len` and reuses it for
/// every series of that length.
pub struct Autocorrelator {
    len: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
}

impl Autocorrelator {
    /// Creates an autocorrelator for series of `len` points.
    pub fn new(len: usize) -> Self {
        let padded = (2 * len).max(1);
        let mut planner = FftPlanner::new();
        Self {
            len,
            forward: planner.plan_fft_forward(padded),
            inverse: planner.plan_fft_inverse(padded),
            buffer: vec![COMPLEX_ZERO; padded],
        }
    }

    /// Series length this autocorrelator was planned for.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds the autocorrelation of `series` for lags `0..len` into `acc`.
    ///
    /// Zero padding to `2 * len` keeps the circular correlation from wrapping;
    /// lag `k` is divided by `len - k` for an unbiased estimate.
    pub fn accumulate(&mut self, series: &[f32], acc: &mut [f32]) {
        let n = self.len;
        debug_assert_eq!(series.len(), n);
        for (slot, i) in self.buffer.iter_mut().zip(0..) {
            *slot = if i < n {
                Complex::new(series[i], 0.0)
            } else {
                COMPLEX_ZERO
            };
        }
        self.forward.process(&mut self.buffer);
        for c in self.buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.inverse.process(&mut self.buffer);

        let norm = 1.0 / self.buffer.len() as f32;
        for (lag, out) in acc.iter_mut().enumerate().take(n) {
            *out += self.buffer[lag].re * norm / (n - lag) as f32;
        }
    }

    /// Autocorrelation of a single series.
    pub fn compute(&mut self, series: &[f32]) -> Vec<f32> {
        let mut acc = vec![0.0; self.len];
        self.accumulate(series, &mut acc);
        acc
    }
}

/// Unbiased autocorrelation of one series (lags `0..series.len()`).
pub fn autocorrelation(series: &[f32]) -> Vec<f32> {
    Autocorrelator::new(series.len()).compute(series)
}

/// Beat spectrum of a (power) spectrogram: per-bin autocorrelation along
/// time, averaged over bins. Length equals the number of frames.
pub fn beat_spectrum(spectrogram: &Magnitudes) -> Vec<f32> {
    let num_frames = spectrogram.num_frames();
    let num_bins = spectrogram.num_bins();
    let mut beat = vec![0.0f32; num_frames];
    if num_frames == 0 || num_bins == 0 {
        return beat;
    }

    let mut ac = Autocorrelator::new(num_frames);
    let mut series = Vec::with_capacity(num_frames);
    for bin in 0..num_bins {
        spectrogram.bin_series_into(bin, &mut series);
        ac.accumulate(&series, &mut beat);
    }
    let scale = 1.0 / num_bins as f32;
    beat.iter_mut().for_each(|v| *v *= scale);
    beat
}

/// Time-localised beat spectra, one column per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatSpectrogram {
    num_lags: usize,
    num_frames: usize,
    data: Vec<f32>,
}

impl BeatSpectrogram {
    #[inline]
    pub fn num_lags(&self) -> usize {
        self.num_lags
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Beat spectrum in effect at frame `t`.
    #[inline]
    pub fn column(&self, t: usize) -> &[f32] {
        &self.data[t * self.num_lags..(t + 1) * self.num_lags]
    }
}

/// Beat spectrogram: every `segment_step` frames, the beat spectrum of the
/// `segment_length` frames centred there (zero frames beyond the edges),
/// held constant until the next sampling point.
pub fn beat_spectrogram(
    spectrogram: &Magnitudes,
    segment_length: usize,
    segment_step: usize,
) -> BeatSpectrogram {
    let num_frames = spectrogram.num_frames();
    let num_lags = segment_length.max(1);
    let step = segment_step.max(1);
    let lead = (num_lags / 2) as isize;
    let mut data = vec![0.0f32; num_lags * num_frames];

    for start in (0..num_frames).step_by(step) {
        let window = spectrogram.window(start as isize - lead, num_lags);
        let beat = beat_spectrum(&window);
        let end = (start + step).min(num_frames);
        for t in start..end {
            data[t * num_lags..(t + 1) * num_lags].copy_from_slice(&beat);
        }
    }

    log::debug!(
        "beat spectrogram: {} frames, window {} frames, hop {}",
        num_frames,
        num_lags,
        step
    );

    BeatSpectrogram {
        num_lags,
        num_frames,
        data,
    }
}

/// Picks the repeating period (in frames) from a beat spectrum.
///
/// Searches lags `[max(range.min, 1), min(range.max, len / 3)]`, so that at
/// least three repetitions fit in the analysed span; lag 0 is never a
/// candidate. When the interval is empty, returns the largest admissible lag.
pub fn pick_period(beat: &[f32], range: PeriodRange) -> usize {
    let upper = range.max.min(beat.len() / 3);
    let lower = range.min.max(1);
    if upper < lower {
        return upper.max(1);
    }

    let mut best = lower;
    for lag in lower + 1..=upper {
        if beat[lag] > beat[best] {
            best = lag;
        }
    }
    best
}

/// Picks one repeating period per frame from a beat spectrogram.
pub fn pick_periods(beat: &BeatSpectrogram, range: PeriodRange) -> Vec<usize> {
    (0..beat.num_frames())
        .map(|t| pick_period(beat.column(t), range))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_autocorrelation(series: &[f32]) -> Vec<f32> {
        let n = series.len();
        (0..n)
            .map(|lag| {
                let sum: f32 = (0..n - lag).map(|i| series[i] * series[i + lag]).sum();
                sum / (n - lag) as f32
            })
            .collect()
    }

    #[test]
    fn test_autocorrelation_matches_direct() {
        let series: Vec<f32> = (0..37).map(|i| ((i * 7) % 11) as f32 - 4.0).collect();
        let fast = autocorrelation(&series);
        let direct = direct_autocorrelation(&series);
        assert_eq!(fast.len(), series.len());
        for (lag, (a, b)) in fast.iter().zip(direct.iter()).enumerate() {
            assert!((a - b).abs() < 1e-3, "lag {}: {} vs {}", lag, a, b);
        }
    }

    #[test]
    fn test_autocorrelation_lag_zero_is_mean_square() {
        let series = vec![1.0, -2.0, 3.0];
        let ac = autocorrelation(&series);
        assert!((ac[0] - 14.0 / 3.0).abs() < 1e-4);
    }

    fn periodic_spectrogram(period: usize, num_frames: usize, num_bins: usize) -> Magnitudes {
        let frames: Vec<Vec<f32>> = (0..num_frames)
            .map(|t| {
                (0..num_bins)
                    .map(|b| if t % period == 0 { 1.0 + b as f32 * 0.1 } else { 0.05 })
                    .collect()
            })
            .collect();
        Magnitudes::from_frames(&frames)
    }

    #[test]
    fn test_beat_spectrum_peaks_at_period() {
        let spec = periodic_spectrogram(6, 60, 8);
        let beat = beat_spectrum(&spec);
        assert_eq!(beat.len(), 60);
        assert!(beat[6] > beat[5]);
        assert!(beat[6] > beat[7]);
    }

    #[test]
    fn test_pick_period_excludes_lag_zero() {
        let spec = periodic_spectrogram(6, 60, 8);
        let beat = beat_spectrum(&spec);
        let period = pick_period(&beat, PeriodRange { min: 0, max: 8 });
        assert_eq!(period, 6);
    }

    #[test]
    fn test_pick_period_respects_range() {
        let spec = periodic_spectrogram(4, 90, 4);
        let beat = beat_spectrum(&spec);
        // Range starts past the fundamental: picks a multiple
        let period = pick_period(&beat, PeriodRange { min: 5, max: 10 });
        assert_eq!(period, 8);
    }

    #[test]
    fn test_pick_period_clamps_to_third() {
        let beat = vec![10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 5.0];
        // len / 3 = 3, below the requested minimum: largest admissible lag
        assert_eq!(pick_period(&beat, PeriodRange { min: 5, max: 9 }), 3);
        assert_eq!(pick_period(&[1.0], PeriodRange { min: 1, max: 4 }), 1);
    }

    #[test]
    fn test_beat_spectrogram_holds_between_steps() {
        let spec = periodic_spectrogram(5, 40, 3);
        let bs = beat_spectrogram(&spec, 20, 7);
        assert_eq!(bs.num_lags(), 20);
        assert_eq!(bs.num_frames(), 40);
        for t in 1..7 {
            assert_eq!(bs.column(t), bs.column(0));
        }
        let periods = pick_periods(&bs, PeriodRange { min: 1, max: 10 });
        assert_eq!(periods.len(), 40);
        assert!(periods.iter().all(|&p| p == 5));
    }
}
