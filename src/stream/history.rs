//! Fixed-capacity history of recent magnitude frames.

/// Circular store of the last `capacity` analysed frames.
///
/// Each slot keeps the magnitude frame of every channel plus the channel
/// mean of squared magnitudes used for similarity. Storage is allocated once;
/// pushing overwrites the oldest slot when full.
#[derive(Debug, Clone)]
pub struct SpectrumHistory {
    capacity: usize,
    channels: usize,
    num_bins: usize,
    /// `[slot][channel][bin]`.
    magnitudes: Vec<f32>,
    /// `[slot][bin]`.
    power: Vec<f32>,
    pushed: usize,
}

impl SpectrumHistory {
    pub fn new(capacity: usize, channels: usize, num_bins: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            channels,
            num_bins,
            magnitudes: vec![0.0; capacity * channels * num_bins],
            power: vec![0.0; capacity * num_bins],
            pushed: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of frames currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.pushed.min(self.capacity)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    /// Total frames pushed since construction or the last [`clear`](Self::clear).
    #[inline]
    pub fn frames_pushed(&self) -> usize {
        self.pushed
    }

    pub fn clear(&mut self) {
        self.pushed = 0;
    }

    /// Stores one frame, given as one magnitude slice per channel.
    pub fn push(&mut self, frame: &[Vec<f32>]) {
        debug_assert_eq!(frame.len(), self.channels);
        let slot = self.pushed % self.capacity;
        let bins = self.num_bins;

        let mags = &mut self.magnitudes
            [slot * self.channels * bins..(slot + 1) * self.channels * bins];
        for (dst, src) in mags.chunks_exact_mut(bins.max(1)).zip(frame.iter()) {
            dst.copy_from_slice(&src[..bins]);
        }

        let power = &mut self.power[slot * bins..(slot + 1) * bins];
        power.iter_mut().for_each(|p| *p = 0.0);
        for src in frame {
            for (p, &v) in power.iter_mut().zip(src.iter()) {
                *p += v * v;
            }
        }
        let scale = 1.0 / self.channels.max(1) as f32;
        power.iter_mut().for_each(|p| *p *= scale);

        self.pushed += 1;
    }

    /// Storage slot of the `position`-th held frame, oldest first.
    #[inline]
    pub fn slot(&self, position: usize) -> usize {
        debug_assert!(position < self.len());
        let oldest = if self.pushed > self.capacity {
            self.pushed % self.capacity
        } else {
            0
        };
        (oldest + position) % self.capacity
    }

    #[inline]
    pub fn power(&self, slot: usize) -> &[f32] {
        &self.power[slot * self.num_bins..(slot + 1) * self.num_bins]
    }

    #[inline]
    pub fn magnitudes(&self, slot: usize, channel: usize) -> &[f32] {
        let start = (slot * self.channels + channel) * self.num_bins;
        &self.magnitudes[start..start + self.num_bins]
    }

    /// Power frames in chronological order.
    pub fn power_frames(&self) -> impl Iterator<Item = &[f32]> + Clone + '_ {
        (0..self.len()).map(move |i| self.power(self.slot(i)))
    }

    /// Power frame of the most recent push.
    pub fn newest_power(&self) -> Option<&[f32]> {
        let len = self.len();
        (len > 0).then(|| self.power(self.slot(len - 1)))
    }
}
