use serde::{Deserialize, Serialize};

/// Two synchronized PPG channels sampled at a shared fixed rate.
///
/// Sample `i` of each channel was captured at the same instant,
/// `i / fs` seconds after the start of the recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpgRecording {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Red LED channel samples
    pub red: Vec<f64>,
    /// Infrared LED channel samples
    pub ir: Vec<f64>,
}

impl PpgRecording {
    pub fn len(&self) -> usize {
        self.red.len()
    }
    pub fn is_empty(&self) -> bool {
        self.red.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.red.len() as f64 / self.fs
    }
    /// Convert an analysis window length in seconds to a sample count.
    ///
    /// The window must span at least one full pulsatile period, so callers
    /// should keep `window_s >= 60 / minimum_expected_bpm`.
    pub fn window_samples(&self, window_s: f64) -> usize {
        ((window_s * self.fs).round() as usize).max(1)
    }
}
