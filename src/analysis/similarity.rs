//! Cosine self-similarity and local-maxima neighbour selection.
//!
//! Frames whose spectra look alike are treated as repetitions of each other,
//! regardless of whether they recur at a fixed period.

use rayon::prelude::*;

use crate::core::fft::EPSILON;
use crate::core::spectrogram::Magnitudes;

/// Square frame-by-frame cosine similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    data: Vec<f32>,
}

impl SimilarityMatrix {
    /// Number of frames (rows and columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.size + j]
    }

    /// Similarities of frame `i` to every frame.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.size..(i + 1) * self.size]
    }
}

/// L2 norm of a frame, or `None` when the frame carries no energy.
#[inline]
fn frame_norm(frame: &[f32]) -> Option<f32> {
    let norm = frame.iter().map(|v| v * v).sum::<f32>().sqrt();
    (norm > EPSILON).then_some(norm)
}

/// Scales `frame` to unit length into `out`; silent frames become all zeros.
#[inline]
pub fn normalize_into(frame: &[f32], out: &mut [f32]) {
    match frame_norm(frame) {
        Some(norm) => {
            for (o, &v) in out.iter_mut().zip(frame.iter()) {
                *o = v / norm;
            }
        }
        None => out.iter_mut().for_each(|o| *o = 0.0),
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine self-similarity of every pair of frames.
///
/// The diagonal is exactly 1 for every frame with non-zero energy; silent
/// frames are similar to nothing (0 everywhere, including the diagonal).
pub fn self_similarity(spectrogram: &Magnitudes) -> SimilarityMatrix {
    let size = spectrogram.num_frames();
    let bins = spectrogram.num_bins();
    let mut normalized = Magnitudes::zeros(bins, size);
    let mut energetic = vec![false; size];
    for (t, frame) in spectrogram.frames().enumerate() {
        normalize_into(frame, normalized.frame_mut(t));
        energetic[t] = frame_norm(frame).is_some();
    }

    let mut data = vec![0.0f32; size * size];
    if size > 0 {
        data.par_chunks_mut(size).enumerate().for_each(|(i, row)| {
            let a = normalized.frame(i);
            for (j, value) in row.iter_mut().enumerate() {
                *value = if i == j {
                    if energetic[i] {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    dot(a, normalized.frame(j)).clamp(-1.0, 1.0)
                };
            }
        });
    }

    SimilarityMatrix { size, data }
}

/// Cosine similarity of `query` against each frame of `history`, written into `out`.
pub fn cross_similarity_into<'a, I>(history: I, query: &[f32], out: &mut Vec<f32>)
where
    I: IntoIterator<Item = &'a [f32]>,
{
    out.clear();
    let query_norm = frame_norm(query);
    for frame in history {
        let value = match (query_norm, frame_norm(frame)) {
            (Some(qn), Some(fn_)) => dot(query, frame) / (qn * fn_),
            _ => 0.0,
        };
        out.push(value);
    }
}

/// Cosine similarity of `query` against each frame of `history`.
pub fn cross_similarity<'a, I>(history: I, query: &[f32]) -> Vec<f32>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut out = Vec::new();
    cross_similarity_into(history, query, &mut out);
    out
}

/// Local maxima of `values`, written into `out` in descending value order.
///
/// Index `i` qualifies when `values[i] >= min_value` and it is strictly
/// greater than every other value within `±min_distance` (at least 1,
/// clamped at the ends). At most `max_count` indices are kept; equal values
/// keep their index order.
pub fn local_maxima_into(
    values: &[f32],
    min_value: f32,
    min_distance: usize,
    max_count: usize,
    out: &mut Vec<usize>,
) {
    out.clear();
    let n = values.len();
    let distance = min_distance.max(1);
    for (i, &v) in values.iter().enumerate() {
        if v < min_value {
            continue;
        }
        let start = i.saturating_sub(distance);
        let end = (i + distance + 1).min(n);
        let dominates = values[start..i]
            .iter()
            .chain(values[i + 1..end].iter())
            .all(|&other| v > other);
        if dominates {
            out.push(i);
        }
    }
    out.sort_by(|&a, &b| {
        values[b]
            .partial_cmp(&values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    out.truncate(max_count);
}

/// Local maxima of `values` (see [`local_maxima_into`]).
pub fn local_maxima(
    values: &[f32],
    min_value: f32,
    min_distance: usize,
    max_count: usize,
) -> Vec<usize> {
    let mut out = Vec::new();
    local_maxima_into(values, min_value, min_distance, max_count, &mut out);
    out
}

/// Per-frame repeating-frame sets stored in one flat arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarityIndices {
    arena: Vec<usize>,
    /// `(offset, len)` into `arena` for each frame.
    spans: Vec<(usize, usize)>,
}

impl SimilarityIndices {
    /// Number of frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Repeating frames for frame `t`, most similar first. Never empty.
    #[inline]
    pub fn frame(&self, t: usize) -> &[usize] {
        let (offset, len) = self.spans[t];
        &self.arena[offset..offset + len]
    }

    /// Total number of stored indices.
    #[inline]
    pub fn total(&self) -> usize {
        self.arena.len()
    }
}

/// Selects the repeating frames of every frame from its similarity row.
///
/// A frame whose row yields no local maximum falls back to itself, so every
/// set is non-empty and the repeating estimate stays defined.
pub fn similarity_indices(
    matrix: &SimilarityMatrix,
    threshold: f32,
    distance: usize,
    number: usize,
) -> SimilarityIndices {
    let size = matrix.size();
    let mut arena = Vec::with_capacity(size * number.min(size).max(1));
    let mut spans = Vec::with_capacity(size);
    let mut peaks = Vec::new();
    let mut fallbacks = 0usize;

    for t in 0..size {
        local_maxima_into(matrix.row(t), threshold, distance, number, &mut peaks);
        if peaks.is_empty() {
            peaks.push(t);
            fallbacks += 1;
        }
        spans.push((arena.len(), peaks.len()));
        arena.extend_from_slice(&peaks);
    }

    if fallbacks > 0 {
        log::debug!(
            "similarity: {} of {} frames had no repeating neighbours, using the frame itself",
            fallbacks,
            size
        );
    }

    SimilarityIndices { arena, spans }
}
