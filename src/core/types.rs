use crate::error::SeparationError;

/// A single audio sample (32-bit float, nominal range -1.0 to 1.0).
pub type Sample = f32;

/// Buffer holding audio samples in interleaved format.
///
/// For mono audio, samples are stored sequentially: `[s0, s1, s2, ...]`
/// For multichannel audio, samples are interleaved: `[L0, R0, L1, R1, ...]`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Raw interleaved sample data.
    pub data: Vec<Sample>,
    /// Number of channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a new audio buffer.
    ///
    /// # Errors
    /// Returns `SeparationError::InvalidChannels` if channels is 0,
    /// `SeparationError::InvalidSampleRate` if sample_rate is 0, and
    /// `SeparationError::MisalignedChunk` if `data` does not hold a whole
    /// number of frames.
    pub fn new(
        data: Vec<Sample>,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, SeparationError> {
        if channels == 0 {
            return Err(SeparationError::InvalidChannels(channels));
        }
        if sample_rate == 0 {
            return Err(SeparationError::InvalidSampleRate(sample_rate));
        }
        if data.len() % channels as usize != 0 {
            return Err(SeparationError::MisalignedChunk {
                len: data.len(),
                channels: channels as usize,
            });
        }
        Ok(Self {
            data,
            channels,
            sample_rate,
        })
    }

    /// Number of samples per channel.
    pub fn num_samples(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.data.len() / self.channels as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.num_samples() as f64 / self.sample_rate as f64
    }

    /// Returns true if the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get a single channel's data as a new vector.
    pub fn channel_data(&self, channel: u16) -> Vec<Sample> {
        if channel >= self.channels {
            return Vec::new();
        }
        self.data
            .iter()
            .skip(channel as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Splits the buffer into one vector per channel.
    pub fn to_channels(&self) -> Vec<Vec<Sample>> {
        deinterleave(&self.data, self.channels as usize)
    }

    /// Create an `AudioBuffer` from separate channel vectors.
    ///
    /// # Errors
    /// Returns an error if no channels are given or the channels have
    /// different lengths.
    pub fn from_channels(
        channels_data: &[Vec<Sample>],
        sample_rate: u32,
    ) -> Result<Self, SeparationError> {
        if channels_data.is_empty() || channels_data.len() > u16::MAX as usize {
            return Err(SeparationError::InvalidChannels(
                channels_data.len().min(u16::MAX as usize) as u16,
            ));
        }
        let num_samples = channels_data[0].len();
        for ch in channels_data {
            if ch.len() != num_samples {
                return Err(SeparationError::LengthMismatch {
                    expected: num_samples,
                    found: ch.len(),
                });
            }
        }
        AudioBuffer::new(
            interleave(channels_data),
            channels_data.len() as u16,
            sample_rate,
        )
    }
}

/// Deinterleaves multi-channel audio into separate per-channel vectors.
#[inline]
pub fn deinterleave(input: &[Sample], num_channels: usize) -> Vec<Vec<Sample>> {
    (0..num_channels)
        .map(|ch| {
            input
                .iter()
                .skip(ch)
                .step_by(num_channels)
                .copied()
                .collect()
        })
        .collect()
}

/// Interleaves per-channel vectors into a single buffer, truncating to the shortest channel.
#[inline]
pub fn interleave(channels: &[Vec<Sample>]) -> Vec<Sample> {
    let min_len = channels.iter().map(|c| c.len()).min().unwrap_or(0);
    (0..min_len)
        .flat_map(|i| channels.iter().map(move |ch| ch[i]))
        .collect()
}
