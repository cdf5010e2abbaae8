//! Optional progress reporting at component boundaries.

/// Pipeline stage reached by a batch separation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Forward STFT of every channel.
    Transform,
    /// Period or similarity estimation on the channel-averaged spectrogram.
    Estimation,
    /// Per-channel mask synthesis.
    Masking,
    /// Masking and inverse STFT of every channel.
    Synthesis,
    /// Extended mode started segment `index` of `total`.
    Segment { index: usize, total: usize },
}

/// Receives stage notifications from a batch separation.
pub trait ProgressObserver {
    fn on_stage(&self, stage: Stage);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    #[inline]
    fn on_stage(&self, _stage: Stage) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(Stage),
{
    #[inline]
    fn on_stage(&self, stage: Stage) {
        self(stage)
    }
}
