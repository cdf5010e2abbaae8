//! Mask from self-similar (not necessarily periodic) frames.

use rayon::prelude::*;

use crate::analysis::similarity::SimilarityIndices;
use crate::core::spectrogram::Magnitudes;
use crate::core::stats::median_across;
use crate::mask::finalize_frame;

/// Repeating mask where frame `t` is estimated by the per-bin median of its
/// most similar frames.
pub fn similarity_mask(spectrogram: &Magnitudes, indices: &SimilarityIndices) -> Magnitudes {
    let num_bins = spectrogram.num_bins();
    let num_frames = spectrogram.num_frames();
    debug_assert_eq!(indices.len(), num_frames);
    let mut mask = Magnitudes::zeros(num_bins, num_frames);
    if num_bins == 0 {
        return mask;
    }

    mask.as_mut_slice()
        .par_chunks_mut(num_bins)
        .enumerate()
        .for_each_init(Vec::new, |scratch, (t, out)| {
            let frames = indices.frame(t).iter().map(|&n| spectrogram.frame(n));
            median_across(frames, num_bins, scratch, out);
            finalize_frame(spectrogram.frame(t), out);
        });
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::similarity::{self_similarity, similarity_indices};

    #[test]
    fn test_similarity_mask_removes_unique_event() {
        // Two alternating patterns plus one frame where a foreground event lands on pattern A
        let a = vec![1.0, 0.1, 0.1];
        let b = vec![0.1, 1.0, 0.1];
        let mut frames: Vec<Vec<f32>> = (0..16)
            .map(|t| if t % 2 == 0 { a.clone() } else { b.clone() })
            .collect();
        frames[8] = vec![1.0, 0.1, 0.8];
        let spec = Magnitudes::from_frames(&frames);
        let sim = self_similarity(&spec);
        let idx = similarity_indices(&sim, 0.0, 1, 5);
        let mask = similarity_mask(&spec, &idx);

        // Bin 2 of the event frame is mostly foreground
        assert!(mask.get(2, 8) < 0.3, "mask = {}", mask.get(2, 8));
        // Bins of the repeating pattern stay in the background
        assert!(mask.get(0, 8) > 0.99);
        assert!(mask.get(0, 4) > 0.99);
        assert!(mask.as_slice().iter().all(|&m| m > 0.0 && m <= 1.0));
    }

    #[test]
    fn test_similarity_mask_silence_is_finite() {
        let spec = Magnitudes::from_frames(&vec![vec![0.0; 4]; 6]);
        let idx = similarity_indices(&self_similarity(&spec), 0.0, 1, 10);
        let mask = similarity_mask(&spec, &idx);
        assert!(mask.as_slice().iter().all(|&m| m == 1.0));
    }
}
