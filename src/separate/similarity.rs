//! Similarity mode: repeating frames found through cosine self-similarity.

use rayon::prelude::*;

use crate::analysis::similarity::{self_similarity, similarity_indices};
use crate::core::params::FrameParams;
use crate::core::stft::Stft;
use crate::mask::similarity_mask;
use crate::progress::{ProgressObserver, Stage};
use crate::separate::Analysis;

/// Background of `channels` estimated from their most similar frames.
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
    let matrix = self_similarity(&analysis.power);
    let indices = similarity_indices(
        &matrix,
        fp.similarity_threshold,
        fp.similarity_distance,
        fp.similarity_number,
    );
    log::debug!(
        "similarity: {} frames, {} repeating frames selected",
        indices.len(),
        indices.total()
    );

    progress.on_stage(Stage::Masking);
    let masks = analysis
        .magnitudes
        .par_iter()
        .map(|m| similarity_mask(m, &indices))
        .collect();

    progress.on_stage(Stage::Synthesis);
    analysis.resynthesize(masks, stft, fp.cutoff_bin, num_samples)
}
