#![forbid(unsafe_code)]
//! Repetition-based background/foreground separation.
//!
//! `repet` splits a signal into a repeating **background** (a loop, a groove,
//! an accompaniment) and a non-repeating **foreground** (typically a voice)
//! using nothing but the signal's own repetition structure. Repetitions are
//! found either as a period in the beat spectrum or as mutually similar
//! frames, the repeating part is estimated with a median over those
//! repetitions, and a soft time-frequency mask extracts it.
//!
//! # Quick Start
//!
//! ```
//! use repet::{AudioBuffer, Mode, SeparationParams};
//!
//! // 3 seconds of a 250 ms pulse at 8 kHz
//! let sr = 8000;
//! let data: Vec<f32> = (0..3 * sr as usize)
//!     .map(|i| if i % 2000 < 40 { 0.8 } else { 0.0 })
//!     .collect();
//! let input = AudioBuffer::new(data, 1, sr).unwrap();
//!
//! let params = SeparationParams::new(Mode::Original).with_period_range(0.1, 1.0);
//! let background = repet::separate(&input, &params).unwrap();
//! let foreground = repet::foreground(&input, &background).unwrap();
//! assert_eq!(background.data.len(), input.data.len());
//! assert_eq!(foreground.data.len(), input.data.len());
//! ```
//!
//! # Streaming
//!
//! For live input, feed chunks to a [`StreamSeparator`]. It only ever looks
//! at past frames:
//!
//! ```
//! use repet::{SeparationParams, StreamSeparator};
//!
//! let mut separator = StreamSeparator::new(&SeparationParams::default(), 44100, 2).unwrap();
//! let chunk = vec![0.0f32; 2 * 4096];
//! let mut background = separator.process(&chunk).unwrap();
//! background.extend(separator.flush().unwrap());
//! assert_eq!(background.len(), chunk.len());
//! ```

pub mod analysis;
pub mod core;
pub mod error;
pub mod mask;
pub mod progress;
pub mod separate;
pub mod stream;

pub use crate::core::params::{
    read_params_json, write_params_json, FrameParams, Mode, PeriodRange, SeparationParams,
};
pub use crate::core::spectrogram::{Magnitudes, Spectrogram};
pub use crate::core::stft::Stft;
pub use crate::core::types::{AudioBuffer, Sample};
pub use crate::core::window::WindowType;
pub use error::SeparationError;
pub use progress::{NoProgress, ProgressObserver, Stage};
pub use stream::StreamSeparator;

use crate::core::types::{deinterleave, interleave};

/// Validates that every channel is non-empty, equally long and finite.
fn validate_channels(channels: &[Vec<f32>]) -> Result<usize, SeparationError> {
    let first = channels.first().ok_or(SeparationError::InvalidChannels(0))?;
    let num_samples = first.len();
    if num_samples == 0 {
        return Err(SeparationError::EmptySignal);
    }
    for ch in channels {
        if ch.len() != num_samples {
            return Err(SeparationError::LengthMismatch {
                expected: num_samples,
                found: ch.len(),
            });
        }
        if ch.iter().any(|s| !s.is_finite()) {
            return Err(SeparationError::NonFiniteInput);
        }
    }
    Ok(num_samples)
}

/// Separates the repeating background of an interleaved buffer.
///
/// Returns a buffer of identical shape holding the background; the
/// foreground is `input - background` (see [`foreground`]).
pub fn separate(
    input: &AudioBuffer,
    params: &SeparationParams,
) -> Result<AudioBuffer, SeparationError> {
    separate_with_progress(input, params, &NoProgress)
}

/// [`separate`] with stage notifications sent to `progress`.
pub fn separate_with_progress(
    input: &AudioBuffer,
    params: &SeparationParams,
    progress: &dyn ProgressObserver,
) -> Result<AudioBuffer, SeparationError> {
    if input.channels == 0 {
        return Err(SeparationError::InvalidChannels(0));
    }
    let channels = deinterleave(&input.data, input.channels as usize);
    let background =
        separate_channels_with_progress(&channels, input.sample_rate, params, progress)?;
    AudioBuffer::new(interleave(&background), input.channels, input.sample_rate)
}

/// Separates the repeating background of deinterleaved channels.
///
/// Every channel must hold the same, non-zero number of samples.
pub fn separate_channels(
    channels: &[Vec<f32>],
    sample_rate: u32,
    params: &SeparationParams,
) -> Result<Vec<Vec<f32>>, SeparationError> {
    separate_channels_with_progress(channels, sample_rate, params, &NoProgress)
}

/// [`separate_channels`] with stage notifications sent to `progress`.
pub fn separate_channels_with_progress(
    channels: &[Vec<f32>],
    sample_rate: u32,
    params: &SeparationParams,
    progress: &dyn ProgressObserver,
) -> Result<Vec<Vec<f32>>, SeparationError> {
    let fp = FrameParams::derive(params, sample_rate)?;
    let num_samples = validate_channels(channels)?;
    let num_channels =
        u16::try_from(channels.len()).map_err(|_| SeparationError::InvalidChannels(u16::MAX))?;

    log::debug!(
        "separate: {:?} mode, {} channel(s) x {} samples at {} Hz, window {} / step {}",
        params.mode,
        num_channels,
        num_samples,
        sample_rate,
        fp.window_length,
        fp.step
    );

    if params.mode == Mode::OnlineSimilarity {
        let mut stream = StreamSeparator::new(params, sample_rate, num_channels)?;
        progress.on_stage(Stage::Synthesis);
        let mut output = stream.process(&interleave(channels))?;
        output.extend(stream.flush()?);
        return Ok(deinterleave(&output, channels.len()));
    }

    let stft = Stft::new(params.window_type, fp.window_length, fp.step)?;
    let background = match params.mode {
        Mode::Original => separate::original::separate(channels, &fp, &stft, progress),
        Mode::Extended => separate::extended::separate(channels, &fp, &stft, progress),
        Mode::Adaptive => separate::adaptive::separate(channels, &fp, &stft, progress),
        Mode::Similarity | Mode::OnlineSimilarity => {
            separate::similarity::separate(channels, &fp, &stft, progress)
        }
    };
    Ok(background)
}

/// Estimates the global repeating period of `input`, in frames.
pub fn estimate_period(
    input: &AudioBuffer,
    params: &SeparationParams,
) -> Result<usize, SeparationError> {
    if input.channels == 0 {
        return Err(SeparationError::InvalidChannels(0));
    }
    let fp = FrameParams::derive(params, input.sample_rate)?;
    let channels = deinterleave(&input.data, input.channels as usize);
    validate_channels(&channels)?;
    let stft = Stft::new(params.window_type, fp.window_length, fp.step)?;
    Ok(separate::original::estimate_period(&channels, &fp, &stft))
}

/// Foreground as the sample-wise difference `input - background`.
///
/// # Errors
/// Fails when the two buffers differ in channel count or length.
pub fn foreground(
    input: &AudioBuffer,
    background: &AudioBuffer,
) -> Result<AudioBuffer, SeparationError> {
    if input.channels != background.channels {
        return Err(SeparationError::ChannelMismatch {
            expected: input.channels as usize,
            found: background.channels as usize,
        });
    }
    if input.data.len() != background.data.len() {
        return Err(SeparationError::LengthMismatch {
            expected: input.data.len(),
            found: background.data.len(),
        });
    }
    let data = input
        .data
        .iter()
        .zip(background.data.iter())
        .map(|(&x, &b)| x - b)
        .collect();
    AudioBuffer::new(data, input.channels, input.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_channels() {
        assert_eq!(validate_channels(&[vec![0.0; 4], vec![1.0; 4]]), Ok(4));
        assert_eq!(
            validate_channels(&[vec![]]),
            Err(SeparationError::EmptySignal)
        );
        assert_eq!(
            validate_channels(&[]),
            Err(SeparationError::InvalidChannels(0))
        );
        assert_eq!(
            validate_channels(&[vec![0.0; 4], vec![0.0; 3]]),
            Err(SeparationError::LengthMismatch {
                expected: 4,
                found: 3
            })
        );
        assert_eq!(
            validate_channels(&[vec![0.0, f32::INFINITY]]),
            Err(SeparationError::NonFiniteInput)
        );
    }

    #[test]
    fn test_foreground_subtracts() {
        let input = AudioBuffer::new(vec![1.0, 2.0, 3.0, 4.0], 2, 8000).unwrap();
        let bg = AudioBuffer::new(vec![0.5, 2.0, 1.0, 0.0], 2, 8000).unwrap();
        let fg = foreground(&input, &bg).unwrap();
        assert_eq!(fg.data, vec![0.5, 0.0, 2.0, 4.0]);
        assert_eq!(fg.channels, 2);
    }

    #[test]
    fn test_foreground_shape_mismatch() {
        let input = AudioBuffer::new(vec![0.0; 4], 2, 8000).unwrap();
        let mono = AudioBuffer::new(vec![0.0; 4], 1, 8000).unwrap();
        let short = AudioBuffer::new(vec![0.0; 2], 2, 8000).unwrap();
        assert_eq!(
            foreground(&input, &mono).unwrap_err(),
            SeparationError::ChannelMismatch {
                expected: 2,
                found: 1
            }
        );
        assert_eq!(
            foreground(&input, &short).unwrap_err(),
            SeparationError::LengthMismatch {
                expected: 4,
                found: 2
            }
        );
    }
}
