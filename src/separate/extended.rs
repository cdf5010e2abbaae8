//! Extended mode: the original algorithm on overlapping segments.
//!
//! Long recordings rarely keep one repeating period, so the signal is cut
//! into fixed-length segments hopping by a shorter step. Each segment gets
//! its own period; neighbouring backgrounds are joined with a triangular
//! cross-fade over their overlap.

use std::ops::Range;

use crate::core::params::FrameParams;
use crate::core::stft::Stft;
use crate::core::window::triangular_window;
use crate::progress::{NoProgress, ProgressObserver, Stage};
use crate::separate::original;

/// Segment layout for a signal of `num_samples` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    num_samples: usize,
    length: usize,
    step: usize,
    count: usize,
}

impl SegmentPlan {
    /// Lays out segments of `length` samples every `step` samples.
    ///
    /// A signal shorter than `length + step` is a single segment. Otherwise
    /// there are `1 + (num_samples - length) / step` segments, the last one
    /// stretched to the end of the signal.
    pub fn new(num_samples: usize, length: usize, step: usize) -> Self {
        let length = length.max(1);
        let step = step.clamp(1, length);
        let count = if num_samples < length + step {
            1
        } else {
            1 + (num_samples - length) / step
        };
        Self {
            num_samples,
            length,
            step,
            count,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Samples shared by two consecutive segments.
    #[inline]
    pub fn overlap(&self) -> usize {
        self.length - self.step
    }

    /// Sample range of segment `index`.
    pub fn segment(&self, index: usize) -> Range<usize> {
        if self.count == 1 {
            return 0..self.num_samples;
        }
        let start = index * self.step;
        let end = if index + 1 == self.count {
            self.num_samples
        } else {
            start + self.length
        };
        start..end
    }

    pub fn segments(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count).map(move |i| self.segment(i))
    }
}

/// Writes `segment` into `dst` at `start`, cross-fading its first `overlap`
/// samples with what `dst` already holds there.
///
/// `fade` is a triangular window of length `2 * overlap`: the new segment
/// rises along its first half while the existing samples fall along its
/// second half, and the two weights sum to one at every sample.
pub fn crossfade_into(
    dst: &mut [f32],
    start: usize,
    segment: &[f32],
    overlap: usize,
    fade: &[f32],
) {
    debug_assert!(fade.len() >= 2 * overlap);
    let dst = &mut dst[start..start + segment.len()];
    let overlap = overlap.min(segment.len());
    for i in 0..overlap {
        dst[i] = dst[i] * fade[overlap + i] + segment[i] * fade[i];
    }
    dst[overlap..].copy_from_slice(&segment[overlap..]);
}

/// Background of `channels`, one repeating period per segment.
pub fn separate(
    channels: &[Vec<f32>],
    fp: &FrameParams,
    stft: &Stft,
    progress: &dyn ProgressObserver,
) -> Vec<Vec<f32>> {
    let num_samples = channels.first().map_or(0, |c| c.len());
    let plan = SegmentPlan::new(num_samples, fp.segment_length, fp.segment_step);
    let overlap = plan.overlap();
    let fade = triangular_window(2 * overlap);
    log::debug!(
        "extended: {} samples in {} segment(s) of {} samples, overlap {}",
        num_samples,
        plan.len(),
        fp.segment_length,
        overlap
    );

    let mut background = vec![vec![0.0f32; num_samples]; channels.len()];
    let mut segment: Vec<Vec<f32>> = vec![Vec::new(); channels.len()];
    for (index, range) in plan.segments().enumerate() {
        progress.on_stage(Stage::Segment {
            index,
            total: plan.len(),
        });
        for (dst, ch) in segment.iter_mut().zip(channels.iter()) {
            dst.clear();
            dst.extend_from_slice(&ch[range.clone()]);
        }

        let separated = original::separate(&segment, fp, stft, &NoProgress);
        let fade_len = if index == 0 { 0 } else { overlap };
        for (bg, seg) in background.iter_mut().zip(separated.iter()) {
            crossfade_into(bg, range.start, seg, fade_len, &fade);
        }
    }

    background
}
