//! Mask from one global repeating period.

use rayon::prelude::*;

use crate::core::spectrogram::Magnitudes;
use crate::core::stats::median_in_place;
use crate::mask::finalize_frame;

/// Repeating segment of `period` frames: the per-bin median across every
/// period-long segment of the spectrogram.
///
/// The last segment may be partial; each position only takes the median over
/// the segments that actually cover it.
pub fn repeating_segment(spectrogram: &Magnitudes, period: usize) -> Magnitudes {
    let num_bins = spectrogram.num_bins();
    let num_frames = spectrogram.num_frames();
    let period = period.clamp(1, num_frames.max(1));
    let mut segment = Magnitudes::zeros(num_bins, period);
    if num_bins == 0 || num_frames == 0 {
        return segment;
    }

    segment
        .as_mut_slice()
        .par_chunks_mut(num_bins)
        .enumerate()
        .for_each_init(Vec::new, |scratch, (position, out)| {
            for (bin, slot) in out.iter_mut().enumerate() {
                scratch.clear();
                scratch.extend(
                    (position..num_frames)
                        .step_by(period)
                        .map(|t| spectrogram.get(bin, t)),
                );
                *slot = median_in_place(scratch);
            }
        });
    segment
}

/// Repeating mask for a signal that repeats every `period` frames.
pub fn fixed_mask(spectrogram: &Magnitudes, period: usize) -> Magnitudes {
    let num_bins = spectrogram.num_bins();
    let segment = repeating_segment(spectrogram, period);
    let period = segment.num_frames().max(1);
    let mut mask = Magnitudes::zeros(num_bins, spectrogram.num_frames());
    if num_bins == 0 {
        return mask;
    }

    mask.as_mut_slice()
        .par_chunks_mut(num_bins)
        .enumerate()
        .for_each(|(t, out)| {
            out.copy_from_slice(segment.frame(t % period));
            finalize_frame(spectrogram.frame(t), out);
        });
    mask
}
