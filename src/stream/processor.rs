use rustfft::num_complex::Complex;

use crate::analysis::similarity::{cross_similarity_into, local_maxima_into};
use crate::core::fft::COMPLEX_ZERO;
use crate::core::params::{FrameParams, SeparationParams};
use crate::core::stats::median_across;
use crate::core::stft::Stft;
use crate::error::SeparationError;
use crate::mask::{apply_cutoff_frame, apply_mask_frame, finalize_frame};
use crate::stream::history::SpectrumHistory;

/// Causal chunk-based separator using online similarity.
///
/// Accepts interleaved audio of any chunk size. Each analysis frame is
/// masked using only itself and the frames before it (up to the configured
/// history length), so output never depends on future input. Output is
/// emitted as soon as the overlap-add of a hop is complete.
pub struct StreamSeparator {
    fp: FrameParams,
    stft: Stft,
    channels: usize,
    history: SpectrumHistory,
    /// Unprocessed input per channel, head-padded with `window - step` zeros.
    pending: Vec<Vec<f32>>,
    /// Overlap-add accumulator per channel, one window long.
    overlap: Vec<Vec<f32>>,
    /// Output samples still to drop to cancel the head padding.
    skip: usize,
    /// Per-channel samples received / emitted.
    received: usize,
    emitted: usize,
    // Per-frame scratch
    spectra: Vec<Vec<Complex<f32>>>,
    magnitudes: Vec<Vec<f32>>,
    mask: Vec<f32>,
    similarities: Vec<f32>,
    peaks: Vec<usize>,
    slots: Vec<usize>,
    median_scratch: Vec<f32>,
    out_frames: Vec<Vec<f32>>,
}

impl std::fmt::Debug for StreamSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSeparator")
            .field("channels", &self.channels)
            .field("window_length", &self.fp.window_length)
            .field("buffer_frames", &self.fp.buffer_frames)
            .field("received", &self.received)
            .field("emitted", &self.emitted)
            .finish()
    }
}

impl StreamSeparator {
    /// Creates a separator for `channels` interleaved channels at `sample_rate`.
    ///
    /// The separation mode in `params` is ignored: a stream always uses
    /// online similarity.
    pub fn new(
        params: &SeparationParams,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Self, SeparationError> {
        if channels == 0 {
            return Err(SeparationError::InvalidChannels(channels));
        }
        let fp = FrameParams::derive(params, sample_rate)?;
        let stft = Stft::new(params.window_type, fp.window_length, fp.step)?;
        let nc = channels as usize;
        let bins = stft.num_bins();
        let window = fp.window_length;

        log::debug!(
            "stream: {} Hz, {} channel(s), window {}, history {} frames",
            sample_rate,
            nc,
            window,
            fp.buffer_frames
        );

        let mut separator = Self {
            history: SpectrumHistory::new(fp.buffer_frames, nc, bins),
            pending: vec![Vec::with_capacity(2 * window); nc],
            overlap: vec![vec![0.0; window]; nc],
            skip: 0,
            received: 0,
            emitted: 0,
            spectra: vec![vec![COMPLEX_ZERO; window]; nc],
            magnitudes: vec![vec![0.0; bins]; nc],
            mask: vec![0.0; bins],
            similarities: Vec::with_capacity(fp.buffer_frames),
            peaks: Vec::with_capacity(fp.buffer_frames),
            slots: Vec::with_capacity(fp.buffer_frames),
            median_scratch: Vec::with_capacity(fp.buffer_frames),
            out_frames: vec![Vec::new(); nc],
            channels: nc,
            fp,
            stft,
        };
        separator.reset();
        Ok(separator)
    }

    /// Processes a chunk of interleaved samples and returns the interleaved
    /// background completed so far. May return an empty vector.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, SeparationError> {
        if input.len() % self.channels != 0 {
            return Err(SeparationError::MisalignedChunk {
                len: input.len(),
                channels: self.channels,
            });
        }
        if input.iter().any(|s| !s.is_finite()) {
            return Err(SeparationError::NonFiniteInput);
        }

        for (ch, pending) in self.pending.iter_mut().enumerate() {
            pending.extend(input.iter().skip(ch).step_by(self.channels).copied());
        }
        self.received += input.len() / self.channels;

        while self.pending[0].len() >= self.fp.window_length {
            self.process_frame();
        }
        Ok(self.take_output(usize::MAX))
    }

    /// Zero-pads the remaining input, emits the rest of the background and
    /// resets the separator for a new stream.
    ///
    /// Over a whole stream, `process` plus `flush` return exactly as many
    /// samples per channel as were received.
    pub fn flush(&mut self) -> Result<Vec<f32>, SeparationError> {
        let window = self.fp.window_length;
        while self.emitted + self.pending_output() < self.received {
            for pending in self.pending.iter_mut() {
                if pending.len() < window {
                    pending.resize(window, 0.0);
                }
            }
            self.process_frame();
        }
        let remaining = self.received.saturating_sub(self.emitted);
        let output = self.take_output(remaining);
        log::debug!(
            "stream: flushed after {} frames, {} samples per channel",
            self.history.frames_pushed(),
            self.received
        );
        self.reset();
        Ok(output)
    }

    /// Clears all buffered audio and history.
    pub fn reset(&mut self) {
        let pad = self.stft.padding();
        for pending in self.pending.iter_mut() {
            pending.clear();
            pending.resize(pad, 0.0);
        }
        for acc in self.overlap.iter_mut() {
            acc.iter_mut().for_each(|s| *s = 0.0);
        }
        for out in self.out_frames.iter_mut() {
            out.clear();
        }
        self.history.clear();
        self.skip = pad;
        self.received = 0;
        self.emitted = 0;
    }

    /// Input-to-output delay in samples.
    pub fn latency_samples(&self) -> usize {
        self.fp.window_length
    }

    pub fn latency_secs(&self) -> f64 {
        self.latency_samples() as f64 / self.fp.sample_rate as f64
    }

    /// Maximum number of past frames searched for repetitions.
    pub fn buffer_frames(&self) -> usize {
        self.history.capacity()
    }

    /// Analysis frames processed since the last reset.
    pub fn frames_processed(&self) -> usize {
        self.history.frames_pushed()
    }

    pub fn frame_params(&self) -> &FrameParams {
        &self.fp
    }

    #[inline]
    fn pending_output(&self) -> usize {
        self.out_frames[0].len()
    }

    /// Analyses, masks and overlap-adds the frame at the head of `pending`.
    fn process_frame(&mut self) {
        let window = self.fp.window_length;
        let step = self.fp.step;
        let bins = self.stft.num_bins();

        for ((pending, spectrum), mags) in self
            .pending
            .iter()
            .zip(self.spectra.iter_mut())
            .zip(self.magnitudes.iter_mut())
        {
            self.stft.forward_frame(&pending[..window], spectrum);
            for (m, c) in mags.iter_mut().zip(spectrum.iter()) {
                *m = c.norm();
            }
        }
        self.history.push(&self.magnitudes);

        // Repeating frames: local maxima of the newest frame's similarity to
        // the history, itself included.
        let history = &self.history;
        if let Some(newest) = history.newest_power() {
            cross_similarity_into(history.power_frames(), newest, &mut self.similarities);
        }
        local_maxima_into(
            &self.similarities,
            self.fp.similarity_threshold,
            self.fp.similarity_distance,
            self.fp.similarity_number,
            &mut self.peaks,
        );
        if self.peaks.is_empty() {
            self.peaks.push(history.len() - 1);
        }
        self.slots.clear();
        self.slots.extend(self.peaks.iter().map(|&p| history.slot(p)));
        log::trace!(
            "stream: frame {}, {} repeating frames of {}",
            history.frames_pushed() - 1,
            self.slots.len(),
            history.len()
        );

        let inv_gain = if self.stft.gain() > 0.0 {
            1.0 / self.stft.gain()
        } else {
            0.0
        };
        let skip = self.skip.min(step);
        for ch in 0..self.channels {
            let frames = self.slots.iter().map(|&s| history.magnitudes(s, ch));
            median_across(frames, bins, &mut self.median_scratch, &mut self.mask);
            finalize_frame(&self.magnitudes[ch], &mut self.mask);
            apply_cutoff_frame(&mut self.mask, self.fp.cutoff_bin);

            let spectrum = &mut self.spectra[ch];
            apply_mask_frame(spectrum, &self.mask);
            self.stft.inverse_frame(spectrum);

            let acc = &mut self.overlap[ch];
            for (a, c) in acc.iter_mut().zip(spectrum.iter()) {
                *a += c.re;
            }
            self.out_frames[ch].extend(acc[skip..step].iter().map(|&s| s * inv_gain));
            acc.copy_within(step.., 0);
            acc[window - step..].iter_mut().for_each(|s| *s = 0.0);

            self.pending[ch].drain(..step);
        }
        self.skip -= skip;
    }

    /// Interleaves and drains up to `max` buffered output samples per channel.
    fn take_output(&mut self, max: usize) -> Vec<f32> {
        let n = self.pending_output().min(max);
        let mut output = Vec::with_capacity(n * self.channels);
        for i in 0..n {
            for ch in &self.out_frames {
                output.push(ch[i]);
            }
        }
        for ch in self.out_frames.iter_mut() {
            ch.clear();
        }
        self.emitted += n;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn params() -> SeparationParams {
        SeparationParams::default()
            .with_window_seconds(0.032)
            .with_buffer_seconds(2.0)
    }

    #[test]
    fn test_stream_separator_basic() {
        let mut sep = StreamSeparator::new(&params(), 16000, 1).unwrap();
        assert_eq!(sep.latency_samples(), 512);

        let signal: Vec<f32> = (0..16000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 16000.0).sin() * 0.5)
            .collect();

        let mut output = Vec::new();
        for chunk in signal.chunks(1000) {
            output.extend(sep.process(chunk).unwrap());
        }
        assert!(!output.is_empty());
        output.extend(sep.flush().unwrap());
        assert_eq!(output.len(), signal.len());
        assert!(output.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_stereo_interleaving() {
        let mut sep = StreamSeparator::new(&params(), 16000, 2).unwrap();
        let mut input = Vec::new();
        for i in 0..4000 {
            let s = (i as f32 * 0.05).sin();
            input.push(s);
            input.push(0.0);
        }
        let mut output = sep.process(&input).unwrap();
        output.extend(sep.flush().unwrap());
        assert_eq!(output.len(), input.len());
        // The silent right channel stays silent
        assert!(output.iter().skip(1).step_by(2).all(|&s| s == 0.0));
    }

    #[test]
    fn test_misaligned_chunk() {
        let mut sep = StreamSeparator::new(&params(), 16000, 2).unwrap();
        assert_eq!(
            sep.process(&[0.0; 3]),
            Err(SeparationError::MisalignedChunk { len: 3, channels: 2 })
        );
        assert_eq!(
            sep.process(&[f32::NAN, 0.0]),
            Err(SeparationError::NonFiniteInput)
        );
    }

    #[test]
    fn test_zero_channels_rejected() {
        assert_eq!(
            StreamSeparator::new(&params(), 16000, 0).unwrap_err(),
            SeparationError::InvalidChannels(0)
        );
    }

    #[test]
    fn test_flush_without_input() {
        let mut sep = StreamSeparator::new(&params(), 16000, 1).unwrap();
        assert!(sep.flush().unwrap().is_empty());
        assert_eq!(sep.frames_processed(), 0);
    }

    #[test]
    fn test_history_capacity() {
        let sep = StreamSeparator::new(&params(), 16000, 1).unwrap();
        // round((2 * 16000 - 512) / 256 + 1) = 124
        assert_eq!(sep.buffer_frames(), 124);
    }

    #[test]
    fn test_reset_restarts_stream() {
        let mut sep = StreamSeparator::new(&params(), 16000, 1).unwrap();
        let signal: Vec<f32> = (0..3000).map(|i| (i as f32 * 0.01).sin()).collect();
        let first = sep.process(&signal).unwrap();
        sep.reset();
        let second = sep.process(&signal).unwrap();
        assert_eq!(first, second);
    }
}
