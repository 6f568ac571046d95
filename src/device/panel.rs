//! Manual front panel — the four editable attributes and their updates.

use super::config::Waveform;
use crate::waveform::HardwareSteps;

/// Which front-panel field an update targets. Also the deduplication key for
/// the update queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Waveform,
    Amplitude,
    Offset,
    Frequency,
}

/// A requested change to one front-panel field, in panel units (volts, Hz).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeUpdate {
    Waveform(Waveform),
    Amplitude(f64),
    Offset(f64),
    Frequency(f64),
}

impl AttributeUpdate {
    pub fn attribute(&self) -> Attribute {
        match self {
            AttributeUpdate::Waveform(_) => Attribute::Waveform,
            AttributeUpdate::Amplitude(_) => Attribute::Amplitude,
            AttributeUpdate::Offset(_) => Attribute::Offset,
            AttributeUpdate::Frequency(_) => Attribute::Frequency,
        }
    }

    /// Snap scalar values to the hardware grid. Waveform selections pass
    /// through unchanged.
    pub fn quantized(self, steps: &HardwareSteps) -> Self {
        match self {
            AttributeUpdate::Waveform(w) => AttributeUpdate::Waveform(w),
            AttributeUpdate::Amplitude(v) => AttributeUpdate::Amplitude(steps.amplitude(v)),
            AttributeUpdate::Offset(v) => AttributeUpdate::Offset(steps.offset(v)),
            AttributeUpdate::Frequency(v) => AttributeUpdate::Frequency(steps.frequency(v)),
        }
    }
}

/// What the front panel currently shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontPanel {
    pub waveform: Waveform,
    pub amplitude: f64,
    pub offset: f64,
    pub frequency: f64,
}

impl Default for FrontPanel {
    fn default() -> Self {
        Self {
            waveform: Waveform::Dc,
            amplitude: 0.0,
            offset: 0.0,
            frequency: 0.0,
        }
    }
}

impl FrontPanel {
    pub fn apply(&mut self, update: AttributeUpdate) {
        match update {
            AttributeUpdate::Waveform(w) => self.waveform = w,
            AttributeUpdate::Amplitude(v) => self.amplitude = v,
            AttributeUpdate::Offset(v) => self.offset = v,
            AttributeUpdate::Frequency(v) => self.frequency = v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::{AMPLITUDE_STEP, FREQ_STEP};

    #[test]
    fn quantized_snaps_scalars() {
        let steps = HardwareSteps::default();
        match AttributeUpdate::Amplitude(0.30001).quantized(&steps) {
            AttributeUpdate::Amplitude(v) => {
                assert!((v / AMPLITUDE_STEP - (v / AMPLITUDE_STEP).round()).abs() < 1e-9);
                assert!((v - 0.30001).abs() <= AMPLITUDE_STEP / 2.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            AttributeUpdate::Frequency(1.0).quantized(&steps),
            AttributeUpdate::Frequency(9.0 * FREQ_STEP)
        );
    }

    #[test]
    fn waveform_passes_through() {
        let steps = HardwareSteps::default();
        assert_eq!(
            AttributeUpdate::Waveform(Waveform::Square).quantized(&steps),
            AttributeUpdate::Waveform(Waveform::Square)
        );
    }

    #[test]
    fn apply_sets_one_field() {
        let mut panel = FrontPanel::default();
        panel.apply(AttributeUpdate::Offset(0.25));
        assert_eq!(panel.offset, 0.25);
        assert_eq!(panel.amplitude, 0.0);
        assert_eq!(panel.waveform, Waveform::Dc);
    }

    #[test]
    fn attribute_keys() {
        assert_eq!(AttributeUpdate::Amplitude(0.1).attribute(), Attribute::Amplitude);
        assert_eq!(
            AttributeUpdate::Waveform(Waveform::Sin).attribute(),
            Attribute::Waveform
        );
    }
}
