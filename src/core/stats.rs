//! Order statistics over a known number of valid values.

use std::cmp::Ordering;

/// Median of `values`, reordering the slice in place.
///
/// Even counts average the two middle values. An empty slice yields 0.
pub fn median_in_place(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    }
}

/// Per-bin median over a set of equally long spectra.
///
/// `scratch` is reused between bins and calls; `out` receives one value per bin.
pub fn median_across<'a, I>(
    spectra: I,
    num_bins: usize,
    scratch: &mut Vec<f32>,
    out: &mut [f32],
) where
    I: Iterator<Item = &'a [f32]> + Clone,
{
    for (bin, slot) in out.iter_mut().enumerate().take(num_bins) {
        scratch.clear();
        scratch.extend(spectra.clone().map(|s| s[bin]));
        *slot = median_in_place(scratch);
    }
}
