//! Repetition analysis: periodicity (beat spectrum) and self-similarity.

pub mod beat;
pub mod similarity;

pub use beat::{
    autocorrelation, beat_spectrogram, beat_spectrum, pick_period, pick_periods,
    BeatSpectrogram,
};
pub use similarity::{
    cross_similarity, local_maxima, self_similarity, similarity_indices, SimilarityIndices,
    SimilarityMatrix,
};
