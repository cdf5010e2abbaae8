//! Adaptive mode: a repeating period per frame from a beat spectrogram.

use rayon::prelude::*;

use crate::analysis::beat::{beat_spectrogram, pick_periods};
use crate::core::params::FrameParams;
use crate::core::stft::Stft;
use crate::mask::adaptive_mask;
use crate::progress::{ProgressObserver, Stage};
use crate::separate::Analysis;

/// Background of `channels` under a slowly varying repeating period.
pub fn separate(
    channels: &[Vec<f32>],
    fp: &FrameParams,
    stft: &Stft,
    progress: &dyn ProgressObserver,
) -> Vec<Vec<f32>> {
    let num_samples = channels.first().map_or(0, |c| c.len());

    progress.on_stage(Stage::Transform);
    let analysis = Analysis::new(channels, stft);

    progress.on_stage(Stage::Estimation);
    let beat = beat_spectrogram(
        &analysis.power,
        fp.adaptive_segment_frames,
        fp.adaptive_step_frames,
    );
    if fp.period_range.min.max(1) > beat.num_lags() / 3 {
        log::warn!(
            "adaptive: beat spectrogram window of {} frames is too short for a period of at least {} frames",
            beat.num_lags(),
            fp.period_range.min
        );
    }
    let periods = pick_periods(&beat, fp.period_range);
    if let (Some(min), Some(max)) = (periods.iter().min(), periods.iter().max()) {
        log::debug!(
            "adaptive: {} frames, repeating periods {}..={} frames",
            periods.len(),
            min,
            max
        );
    }

    progress.on_stage(Stage::Masking);
    let masks = analysis
        .magnitudes
        .par_iter()
        .map(|m| adaptive_mask(m, &periods, fp.filter_order))
        .collect();

    progress.on_stage(Stage::Synthesis);
    analysis.resynthesize(masks, stft, fp.cutoff_bin, num_samples)
}
