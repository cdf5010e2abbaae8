//! Batch separation modes and the analysis/resynthesis pipeline they share.
//!
//! Every mode transforms each channel independently, estimates the repetition
//! structure once from the channel-averaged power spectrogram, builds one
//! mask per channel from that channel's own magnitudes, and resynthesises
//! each channel with its mask.

pub mod adaptive;
pub mod extended;
pub mod original;
pub mod similarity;

use rayon::prelude::*;

use crate::core::spectrogram::{Magnitudes, Spectrogram};
use crate::core::stft::Stft;
use crate::mask::{apply_cutoff, apply_mask};

pub use extended::{crossfade_into, SegmentPlan};

/// Per-channel spectra plus the shared estimation input.
pub(crate) struct Analysis {
    pub spectrograms: Vec<Spectrogram>,
    pub magnitudes: Vec<Magnitudes>,
    /// Channel mean of squared magnitudes.
    pub power: Magnitudes,
}

impl Analysis {
    /// Forward-transforms every channel in parallel.
    pub fn new(channels: &[Vec<f32>], stft: &Stft) -> Self {
        let spectrograms: Vec<Spectrogram> =
            channels.par_iter().map(|ch| stft.forward(ch)).collect();
        let magnitudes: Vec<Magnitudes> =
            spectrograms.par_iter().map(|s| s.magnitudes()).collect();
        let power = Magnitudes::power_mean(&magnitudes)
            .unwrap_or_else(|| Magnitudes::zeros(stft.num_bins(), 0));
        Self {
            spectrograms,
            magnitudes,
            power,
        }
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.power.num_frames()
    }

    /// Applies the high-pass override and each channel's mask, then inverts
    /// and truncates every channel to `num_samples`.
    pub fn resynthesize(
        self,
        masks: Vec<Magnitudes>,
        stft: &Stft,
        cutoff_bin: usize,
        num_samples: usize,
    ) -> Vec<Vec<f32>> {
        debug_assert_eq!(masks.len(), self.spectrograms.len());
        self.spectrograms
            .into_par_iter()
            .zip(masks.into_par_iter())
            .map(|(mut spec, mut mask)| {
                apply_cutoff(&mut mask, cutoff_bin);
                apply_mask(&mut spec, &mask);
                let mut out = stft.inverse(&spec);
                out.resize(num_samples, 0.0);
                out
            })
            .collect()
    }
}
