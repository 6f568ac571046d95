//! Output calibration — maps physical volts at the amplifier to generator units.
//!
//! The generator speaks in `[-1, 1]`; an external amplifier scales that to
//! `[-peak_volt, peak_volt]`. Boards wired with an inverting stage set
//! `invert`, and `offset_calib` trims the DC offset of the analog output.

use serde::{Deserialize, Serialize};

use super::error::ConfigurationError;

fn default_peak_volt() -> f64 {
    10.0
}

/// Per-device calibration constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Amplifier output at a generator value of 1.0.
    #[serde(default = "default_peak_volt")]
    pub peak_volt: f64,
    /// Added to every offset sent to the generator, in generator units.
    #[serde(default)]
    pub offset_calib: f64,
    /// Flip the sign of samples and offsets.
    #[serde(default)]
    pub invert: bool,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            peak_volt: default_peak_volt(),
            offset_calib: 0.0,
            invert: false,
        }
    }
}

impl Calibration {
    /// Unity gain, no offset, no inversion.
    pub fn identity() -> Self {
        Self {
            peak_volt: 1.0,
            offset_calib: 0.0,
            invert: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.peak_volt.is_finite() && self.peak_volt > 0.0) {
            return Err(ConfigurationError::PeakVolt(self.peak_volt));
        }
        if !self.offset_calib.is_finite() {
            return Err(ConfigurationError::OffsetCalib(self.offset_calib));
        }
        Ok(())
    }

    fn sign(&self) -> f64 {
        if self.invert {
            -1.0
        } else {
            1.0
        }
    }

    /// Convert a sample in volts to generator units.
    pub fn sample(&self, volts: f64) -> f64 {
        self.sign() * volts / self.peak_volt
    }

    /// Generator amplitude for a peak output of `volts`.
    pub fn amplitude(&self, volts: f64) -> f64 {
        volts / self.peak_volt
    }

    /// Generator offset for a DC output of `volts`, including the trim.
    pub fn offset(&self, volts: f64) -> f64 {
        self.sample(volts) + self.offset_calib
    }
}
