//! Mask from a time-varying repeating period.

use rayon::prelude::*;

use crate::core::spectrogram::Magnitudes;
use crate::core::stats::median_across;
use crate::mask::finalize_frame;

/// Repeating mask where frame `t` repeats every `periods[t]` frames.
///
/// The repeating estimate of frame `t` is the per-bin median of the frames at
/// offsets `(i - ceil(order/2)) * periods[t]` for `i = 1..=order`, dropping
/// offsets that fall outside the spectrogram.
pub fn adaptive_mask(
    spectrogram: &Magnitudes,
    periods: &[usize],
    filter_order: usize,
) -> Magnitudes {
    let num_bins = spectrogram.num_bins();
    let num_frames = spectrogram.num_frames();
    debug_assert_eq!(periods.len(), num_frames);
    let mut mask = Magnitudes::zeros(num_bins, num_frames);
    if num_bins == 0 {
        return mask;
    }

    let order = filter_order.max(1) as isize;
    let centre = (order + 1) / 2;

    mask.as_mut_slice()
        .par_chunks_mut(num_bins)
        .enumerate()
        .for_each_init(
            || (Vec::new(), Vec::new()),
            |(neighbours, scratch), (t, out)| {
                let period = periods[t] as isize;
                neighbours.clear();
                neighbours.extend(
                    (1..=order)
                        .map(|i| t as isize + (i - centre) * period)
                        .filter(|&n| n >= 0 && (n as usize) < num_frames)
                        .map(|n| n as usize),
                );
                let frames = neighbours.iter().map(|&n| spectrogram.frame(n));
                median_across(frames, num_bins, scratch, out);
                finalize_frame(spectrogram.frame(t), out);
            },
        );
    mask
}
