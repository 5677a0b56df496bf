use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How [`compute_absorption`] treats a window whose AC/DC ratio cannot be
/// formed (zero AC or zero DC in either channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegeneratePolicy {
    /// Abort the whole computation at the first degenerate window.
    Fail,
    /// Drop the window from the AR sequence and the mean, recording its index.
    Skip,
}

#[derive(Debug, Error)]
pub enum AbsorptionError {
    #[error("red and infrared streams differ in length ({red} vs {ir})")]
    LengthMismatch { red: usize, ir: usize },
    #[error("window size must be at least one sample")]
    InvalidWindowSize,
    #[error("input streams are empty")]
    EmptyInput,
    #[error("window {index} is degenerate (zero AC or DC component)")]
    DegenerateWindow { index: usize },
}

/// Per-channel statistics from one window's accumulation pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelWindow {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Pulsatile component: max - min.
    pub ac: f64,
    /// Baseline component: mean - ac / 2.
    pub dc: f64,
}

/// One window's measurements and its absorption ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowAbsorption {
    pub index: usize,
    pub start: usize,
    pub samples: usize,
    pub red: ChannelWindow,
    pub ir: ChannelWindow,
    pub ar: f64,
}

/// Min/max bounds per window. Kept for every window, skipped ones included,
/// so envelope overlays cover the whole stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowEnvelope {
    pub start: usize,
    pub samples: usize,
    pub red_min: f64,
    pub red_max: f64,
    pub ir_min: f64,
    pub ir_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsorptionResult {
    pub window_size: usize,
    /// Total number of windows, ceil(N / window_size), skipped ones included.
    pub window_count: usize,
    pub windows: Vec<WindowAbsorption>,
    pub envelopes: Vec<WindowEnvelope>,
    /// Indices of windows excluded under [`DegeneratePolicy::Skip`].
    pub skipped: Vec<usize>,
    /// Arithmetic mean over the surviving window ARs; `None` when every
    /// window was skipped.
    pub mean_ar: Option<f64>,
}

/// Split the two channels into contiguous `window_size` windows (the final
/// one possibly truncated), compute per-window AC/DC components and the
/// absorption ratio `(red_ac/red_dc) / (ir_ac/ir_dc)`, and average the
/// ratios across windows.
///
/// Input validation happens before any window is processed; degenerate
/// windows are handled per `policy` and never corrupt earlier windows.
pub fn compute_absorption(
    red: &[f64],
    ir: &[f64],
    window_size: usize,
    policy: DegeneratePolicy,
) -> Result<AbsorptionResult, AbsorptionError> {
    if red.len() != ir.len() {
        return Err(AbsorptionError::LengthMismatch {
            red: red.len(),
            ir: ir.len(),
        });
    }
    if window_size == 0 {
        return Err(AbsorptionError::InvalidWindowSize);
    }
    if red.is_empty() {
        return Err(AbsorptionError::EmptyInput);
    }

    let n = red.len();
    let window_count = (n + window_size - 1) / window_size;
    let mut windows = Vec::with_capacity(window_count);
    let mut envelopes = Vec::with_capacity(window_count);
    let mut skipped = Vec::new();
    let mut ar_total = 0.0;

    for (index, start) in (0..n).step_by(window_size).enumerate() {
        let end = (start + window_size).min(n);
        let red_win = accumulate(&red[start..end]);
        let ir_win = accumulate(&ir[start..end]);
        envelopes.push(WindowEnvelope {
            start,
            samples: end - start,
            red_min: red_win.min,
            red_max: red_win.max,
            ir_min: ir_win.min,
            ir_max: ir_win.max,
        });

        if red_win.ac == 0.0 || red_win.dc == 0.0 || ir_win.ac == 0.0 || ir_win.dc == 0.0 {
            match policy {
                DegeneratePolicy::Fail => {
                    return Err(AbsorptionError::DegenerateWindow { index })
                }
                DegeneratePolicy::Skip => {
                    log::warn!("skipping degenerate window {index} (start sample {start})");
                    skipped.push(index);
                    continue;
                }
            }
        }

        let ar = (red_win.ac / red_win.dc) / (ir_win.ac / ir_win.dc);
        ar_total += ar;
        windows.push(WindowAbsorption {
            index,
            start,
            samples: end - start,
            red: red_win,
            ir: ir_win,
            ar,
        });
    }

    let mean_ar = if windows.is_empty() {
        None
    } else {
        Some(ar_total / windows.len() as f64)
    };

    Ok(AbsorptionResult {
        window_size,
        window_count,
        windows,
        envelopes,
        skipped,
        mean_ar,
    })
}

// Single left-to-right pass; the truncated final window divides by its
// actual sample count, not the nominal window size.
fn accumulate(samples: &[f64]) -> ChannelWindow {
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in samples {
        sum += value;
        if value < min {
            min = value;
        }
        if value > max {
            max = value;
        }
    }
    let mean = sum / samples.len() as f64;
    let ac = max - min;
    let dc = mean - ac / 2.0;
    ChannelWindow {
        min,
        max,
        mean,
        ac,
        dc,
    }
}
