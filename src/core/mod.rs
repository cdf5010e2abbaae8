//! Core types, parameters, window functions and the STFT engine.

pub mod fft;
pub mod params;
pub mod spectrogram;
pub mod stats;
pub mod stft;
pub mod types;
pub mod window;

pub use params::{
    read_params_json, write_params_json, FrameParams, Mode, PeriodRange, SeparationParams,
};
pub use spectrogram::{Magnitudes, Spectrogram};
pub use stft::Stft;
pub use types::*;
pub use window::{generate_window, triangular_window, WindowType};
