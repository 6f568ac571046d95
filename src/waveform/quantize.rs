//! Quantizers — reconcile continuous parameters with the generator's step sizes.
//!
//! Burst frequencies are rounded *down* so the buffer covers at least the
//! requested span; a value within 1e-9 of a step below a grid point is
//! treated as on that point. Manual-mode attributes snap to the nearest step.

use serde::{Deserialize, Serialize};

use crate::sequence::ScheduleError;

/// Frequency resolution of the generator's phase accumulator, in Hz.
pub const FREQ_STEP: f64 = 1.16415e-1;

/// Amplitude and offset resolution, in generator units.
pub const AMPLITUDE_STEP: f64 = 1.22070e-4;

/// Offset resolution, in generator units.
pub const OFFSET_STEP: f64 = 1.22070e-4;

/// Fraction of a step below a grid point that still counts as on the grid.
const GRID_SLACK: f64 = 1e-9;

/// A burst frequency that the generator can represent exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedFrequency {
    frequency: f64,
}

impl QuantizedFrequency {
    pub fn hz(&self) -> f64 {
        self.frequency
    }

    /// Burst period recomputed from the quantized frequency.
    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }
}

/// Round a burst frequency down to a multiple of `step`.
///
/// Values less than `GRID_SLACK` steps below a grid point land on that point,
/// so a frequency that went through floating-point arithmetic after an
/// earlier quantization does not drop a whole step. The result exceeds `raw`
/// by at most `GRID_SLACK * step`.
///
/// Returns `None` when the result would be zero.
pub fn floor_frequency(raw: f64, step: f64) -> Option<QuantizedFrequency> {
    let steps = (raw / step + GRID_SLACK).floor();
    if steps < 1.0 {
        return None;
    }
    Some(QuantizedFrequency {
        frequency: steps * step,
    })
}

/// Quantize the burst frequency for a requested span.
pub fn quantize_span(span: f64, step: f64) -> Result<QuantizedFrequency, ScheduleError> {
    floor_frequency(1.0 / span, step).ok_or(ScheduleError::SpanTooLong { span })
}

/// Snap `raw` to the nearest multiple of `step`.
pub fn snap(raw: f64, step: f64) -> f64 {
    step * (raw / step).round()
}

/// Step sizes for the manual-mode attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareSteps {
    #[serde(default = "default_amplitude_step")]
    pub amplitude: f64,
    #[serde(default = "default_offset_step")]
    pub offset: f64,
    #[serde(default = "default_frequency_step")]
    pub frequency: f64,
}

fn default_amplitude_step() -> f64 {
    AMPLITUDE_STEP
}

fn default_offset_step() -> f64 {
    OFFSET_STEP
}

fn default_frequency_step() -> f64 {
    FREQ_STEP
}

impl Default for HardwareSteps {
    fn default() -> Self {
        Self {
            amplitude: AMPLITUDE_STEP,
            offset: OFFSET_STEP,
            frequency: FREQ_STEP,
        }
    }
}

impl HardwareSteps {
    pub fn amplitude(&self, raw: f64) -> f64 {
        snap(raw, self.amplitude)
    }

    pub fn offset(&self, raw: f64) -> f64 {
        snap(raw, self.offset)
    }

    pub fn frequency(&self, raw: f64) -> f64 {
        snap(raw, self.frequency)
    }
}
