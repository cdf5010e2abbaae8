//! Original mode: one repeating period for the whole signal.

use rayon::prelude::*;

use crate::analysis::beat::{beat_spectrum, pick_period};
use crate::core::params::FrameParams;
use crate::core::stft::Stft;
use crate::mask::fixed_mask;
use crate::progress::{ProgressObserver, Stage};
use crate::separate::Analysis;

/// Estimates the global repeating period of `channels` in frames.
pub fn estimate_period(channels: &[Vec<f32>], fp: &FrameParams, stft: &Stft) -> usize {
    let analysis = Analysis::new(channels, stft);
    pick_period(&beat_spectrum(&analysis.power), fp.period_range)
}

/// Background of `channels` under a single repeating period.
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
    let beat = beat_spectrum(&analysis.power);
    if fp.period_range.min.max(1) > beat.len() / 3 {
        log::warn!(
            "original: {} frames too short for a period of at least {} frames with three repetitions",
            beat.len(),
            fp.period_range.min
        );
    }
    let period = pick_period(&beat, fp.period_range);
    log::debug!(
        "original: {} frames, repeating period {} frames ({:.3} s)",
        analysis.num_frames(),
        period,
        (period * fp.step) as f64 / fp.sample_rate as f64
    );

    progress.on_stage(Stage::Masking);
    let masks = analysis
        .magnitudes
        .par_iter()
        .map(|m| fixed_mask(m, period))
        .collect();

    progress.on_stage(Stage::Synthesis);
    analysis.resynthesize(masks, stft, fp.cutoff_bin, num_samples)
}
