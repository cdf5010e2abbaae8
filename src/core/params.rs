//! Separation parameters and the frame-domain quantities derived from them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::window::WindowType;
use crate::error::SeparationError;

/// Processing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One global repeating period for the whole signal.
    #[default]
    Original,
    /// Original mode over overlapping segments, cross-faded.
    Extended,
    /// Per-frame repeating period from a beat spectrogram.
    Adaptive,
    /// Repeating frames found through self-similarity.
    Similarity,
    /// Causal, fixed-memory similarity mode.
    OnlineSimilarity,
}

/// Admissible repeating-period range in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub min: usize,
    pub max: usize,
}

/// Parameters controlling a separation.
///
/// All durations are in seconds and converted to samples or frames for a
/// given sample rate by [`FrameParams::derive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationParams {
    /// Processing mode (default: original).
    pub mode: Mode,
    /// Analysis window duration; rounded up to a power-of-two length (default: 0.04).
    pub window_seconds: f64,
    /// Analysis window shape (default: periodic Hamming).
    pub window_type: WindowType,
    /// Below this frequency everything is attributed to the background (default: 100 Hz).
    pub cutoff_hz: f64,
    /// Admissible repeating-period range (default: 1 to 10 s).
    pub period_range_seconds: (f64, f64),
    /// Extended mode segment length (default: 10 s).
    pub segment_seconds: f64,
    /// Extended mode segment hop (default: 5 s).
    pub segment_step_seconds: f64,
    /// Adaptive mode beat-spectrogram window (default: 10 s).
    pub adaptive_segment_seconds: f64,
    /// Adaptive mode beat-spectrogram hop (default: 5 s).
    pub adaptive_step_seconds: f64,
    /// Adaptive mode number of repeating frames in the median (default: 5).
    pub filter_order: usize,
    /// Minimum similarity for a frame to count as repeating (default: 0).
    pub similarity_threshold: f32,
    /// Minimum distance between two repeating frames (default: 1 s).
    pub similarity_distance_seconds: f64,
    /// Maximum number of repeating frames per frame (default: 100).
    pub similarity_number: usize,
    /// Online mode causal history length (default: 10 s).
    pub buffer_seconds: f64,
}

impl Default for SeparationParams {
    fn default() -> Self {
        Self {
            mode: Mode::Original,
            window_seconds: 0.04,
            window_type: WindowType::Hamming,
            cutoff_hz: 100.0,
            period_range_seconds: (1.0, 10.0),
            segment_seconds: 10.0,
            segment_step_seconds: 5.0,
            adaptive_segment_seconds: 10.0,
            adaptive_step_seconds: 5.0,
            filter_order: 5,
            similarity_threshold: 0.0,
            similarity_distance_seconds: 1.0,
            similarity_number: 100,
            buffer_seconds: 10.0,
        }
    }
}

impl SeparationParams {
    /// Default parameters for the given mode.
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the processing mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the analysis window duration.
    pub fn with_window_seconds(mut self, seconds: f64) -> Self {
        self.window_seconds = seconds;
        self
    }

    /// Set the analysis window shape.
    pub fn with_window_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    /// Set the high-pass cutoff.
    pub fn with_cutoff_hz(mut self, cutoff_hz: f64) -> Self {
        self.cutoff_hz = cutoff_hz;
        self
    }

    /// Set the repeating-period range.
    pub fn with_period_range(mut self, min_seconds: f64, max_seconds: f64) -> Self {
        self.period_range_seconds = (min_seconds, max_seconds);
        self
    }

    /// Set the extended mode segmentation.
    pub fn with_segments(mut self, length_seconds: f64, step_seconds: f64) -> Self {
        self.segment_seconds = length_seconds;
        self.segment_step_seconds = step_seconds;
        self
    }

    /// Set the adaptive mode beat-spectrogram window and hop.
    pub fn with_adaptive_segments(mut self, length_seconds: f64, step_seconds: f64) -> Self {
        self.adaptive_segment_seconds = length_seconds;
        self.adaptive_step_seconds = step_seconds;
        self
    }

    /// Set the adaptive median filter order.
    pub fn with_filter_order(mut self, order: usize) -> Self {
        self.filter_order = order;
        self
    }

    /// Set the similarity neighbour selection.
    pub fn with_similarity(mut self, threshold: f32, distance_seconds: f64, number: usize) -> Self {
        self.similarity_threshold = threshold;
        self.similarity_distance_seconds = distance_seconds;
        self.similarity_number = number;
        self
    }

    /// Set the online mode history length.
    pub fn with_buffer_seconds(mut self, seconds: f64) -> Self {
        self.buffer_seconds = seconds;
        self
    }

    /// Validate all sample-rate independent parameters.
    pub fn validate(&self) -> Result<(), SeparationError> {
        fn positive(name: &str, value: f64) -> Result<(), SeparationError> {
            if !value.is_finite() || value <= 0.0 {
                return Err(SeparationError::InvalidParams(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
            Ok(())
        }

        positive("window_seconds", self.window_seconds)?;
        positive("segment_seconds", self.segment_seconds)?;
        positive("segment_step_seconds", self.segment_step_seconds)?;
        positive("adaptive_segment_seconds", self.adaptive_segment_seconds)?;
        positive("adaptive_step_seconds", self.adaptive_step_seconds)?;
        positive("buffer_seconds", self.buffer_seconds)?;

        if !self.cutoff_hz.is_finite() || self.cutoff_hz < 0.0 {
            return Err(SeparationError::InvalidParams(format!(
                "cutoff_hz must be non-negative, got {}",
                self.cutoff_hz
            )));
        }
        let (min, max) = self.period_range_seconds;
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < min {
            return Err(SeparationError::InvalidParams(format!(
                "period range [{}, {}] s is not a valid interval",
                min, max
            )));
        }
        if self.segment_step_seconds > self.segment_seconds {
            return Err(SeparationError::InvalidParams(format!(
                "segment step {} s exceeds segment length {} s",
                self.segment_step_seconds, self.segment_seconds
            )));
        }
        if self.filter_order == 0 {
            return Err(SeparationError::InvalidParams(
                "filter_order must be at least 1".to_string(),
            ));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(SeparationError::InvalidParams(format!(
                "similarity_threshold must be finite, got {}",
                self.similarity_threshold
            )));
        }
        if !self.similarity_distance_seconds.is_finite() || self.similarity_distance_seconds < 0.0
        {
            return Err(SeparationError::InvalidParams(format!(
                "similarity_distance_seconds must be non-negative, got {}",
                self.similarity_distance_seconds
            )));
        }
        if self.similarity_number == 0 {
            return Err(SeparationError::InvalidParams(
                "similarity_number must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Longest analysis window, in samples.
pub const MAX_WINDOW_LENGTH: usize = 1 << 24;

/// Sample- and frame-domain quantities for one sample rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub sample_rate: u32,
    /// Power-of-two analysis window length in samples.
    pub window_length: usize,
    /// Hop in samples (half the window).
    pub step: usize,
    /// Highest bin forced to the background.
    pub cutoff_bin: usize,
    pub period_range: PeriodRange,
    /// Extended mode segment length in samples.
    pub segment_length: usize,
    /// Extended mode segment hop in samples.
    pub segment_step: usize,
    /// Adaptive mode beat-spectrogram window in frames.
    pub adaptive_segment_frames: usize,
    /// Adaptive mode beat-spectrogram hop in frames.
    pub adaptive_step_frames: usize,
    pub filter_order: usize,
    pub similarity_threshold: f32,
    /// Minimum distance between repeating frames, in frames.
    pub similarity_distance: usize,
    pub similarity_number: usize,
    /// Online mode history length in frames.
    pub buffer_frames: usize,
}

impl FrameParams {
    /// Converts `params` to sample and frame units at `sample_rate`.
    ///
    /// # Errors
    /// Fails on a zero sample rate or invalid parameters.
    pub fn derive(params: &SeparationParams, sample_rate: u32) -> Result<Self, SeparationError> {
        if sample_rate == 0 {
            return Err(SeparationError::InvalidSampleRate(sample_rate));
        }
        params.validate()?;

        let sr = sample_rate as f64;
        let window_length = ((params.window_seconds * sr).ceil() as usize)
            .max(2)
            .checked_next_power_of_two()
            .filter(|&len| len <= MAX_WINDOW_LENGTH)
            .ok_or_else(|| {
                SeparationError::InvalidParams(format!(
                    "window of {} s at {} Hz exceeds {} samples",
                    params.window_seconds, sample_rate, MAX_WINDOW_LENGTH
                ))
            })?;
        let step = window_length / 2;
        let to_frames = |seconds: f64| (seconds * sr / step as f64).round() as usize;

        let cutoff_bin = crate::mask::cutoff_bin(params.cutoff_hz, window_length, sample_rate);
        let period_range = PeriodRange {
            min: to_frames(params.period_range_seconds.0),
            max: to_frames(params.period_range_seconds.1),
        };
        let buffer_frames =
            ((params.buffer_seconds * sr - window_length as f64) / step as f64 + 1.0).round();

        Ok(Self {
            sample_rate,
            window_length,
            step,
            cutoff_bin,
            period_range,
            segment_length: (params.segment_seconds * sr).round().max(1.0) as usize,
            segment_step: (params.segment_step_seconds * sr).round().max(1.0) as usize,
            adaptive_segment_frames: to_frames(params.adaptive_segment_seconds).max(1),
            adaptive_step_frames: to_frames(params.adaptive_step_seconds).max(1),
            filter_order: params.filter_order,
            similarity_threshold: params.similarity_threshold,
            similarity_distance: to_frames(params.similarity_distance_seconds),
            similarity_number: params.similarity_number,
            buffer_frames: buffer_frames.max(1.0) as usize,
        })
    }
}

/// Writes separation parameters as JSON.
pub fn write_params_json(path: &Path, params: &SeparationParams) -> Result<(), SeparationError> {
    let json = serde_json::to_string_pretty(params)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads separation parameters from JSON. Missing fields take their defaults.
pub fn read_params_json(path: &Path) -> Result<SeparationParams, SeparationError> {
    let data = std::fs::read_to_string(path)?;
    let params: SeparationParams = serde_json::from_str(&data).map_err(|e| {
        SeparationError::Serialization(format!(
            "failed to parse separation parameters from {}: {}",
            path.display(),
            e
        ))
    })?;
    params.validate()?;
    Ok(params)
}
