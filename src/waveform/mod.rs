//! Waveform compiler — timeline → quantized burst frequency + sample buffer.
//!
//! Compilation runs in three steps:
//! 1. resolve open durations on the [`Timeline`],
//! 2. round the burst frequency down to the generator's frequency step and
//!    recompute the period from it,
//! 3. render every command into a [`BUFFER_LEN`]-sample buffer spanning that
//!    period.

pub mod preview;
pub mod quantize;
pub mod synth;

pub use preview::write_preview;
pub use quantize::{
    floor_frequency, quantize_span, snap, HardwareSteps, QuantizedFrequency, AMPLITUDE_STEP,
    FREQ_STEP, OFFSET_STEP,
};
pub use synth::{evaporation_curve, sample_index, synthesize, SampleBuffer, BUFFER_LEN};

use crate::device::{Calibration, ConfigurationError, DeviceConfig};
use crate::sequence::{ScheduleError, Timeline};

/// The compiled artifact handed to the upload path.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWaveform {
    frequency: QuantizedFrequency,
    samples: SampleBuffer,
}

impl CompiledWaveform {
    /// Burst frequency the generator should be programmed with.
    pub fn quantized_frequency(&self) -> f64 {
        self.frequency.hz()
    }

    /// Burst period, `1 / quantized_frequency`.
    pub fn total_duration(&self) -> f64 {
        self.frequency.period()
    }

    /// Samples in generator units.
    pub fn samples(&self) -> &[f64; BUFFER_LEN] {
        &self.samples
    }

    /// Playback rate of the buffer in samples per second.
    pub fn sample_rate(&self) -> f64 {
        BUFFER_LEN as f64 * self.frequency.hz()
    }

}

/// Compiles timelines for one device.
#[derive(Debug, Clone, Copy)]
pub struct Compiler {
    calibration: Calibration,
    frequency_step: f64,
}

impl Compiler {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            frequency_step: FREQ_STEP,
        }
    }

    /// Compiler for a device's calibration and frequency step.
    pub fn for_device(config: &DeviceConfig) -> Result<Self, ConfigurationError> {
        config.calibration.validate()?;
        Self::new(config.calibration).with_frequency_step(config.steps.frequency)
    }

    /// Use a different frequency resolution than the default generator's.
    pub fn with_frequency_step(mut self, step: f64) -> Result<Self, ConfigurationError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(ConfigurationError::Step {
                attribute: "frequency",
                value: step,
            });
        }
        self.frequency_step = step;
        Ok(self)
    }

    pub fn frequency_step(&self) -> f64 {
        self.frequency_step
    }

    pub fn compile(&self, timeline: &Timeline) -> Result<CompiledWaveform, ScheduleError> {
        let resolved = timeline.resolve()?;
        let requested = resolved.total_span();
        let frequency = quantize_span(requested, self.frequency_step)?;
        let samples = synthesize(&resolved, frequency.period(), &self.calibration);

        tracing::info!(
            commands = resolved.commands().len(),
            requested_span = requested,
            total_duration = frequency.period(),
            frequency = frequency.hz(),
            "compiled timeline"
        );

        Ok(CompiledWaveform { frequency, samples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::{Command, CommandKind};
    use assert_approx_eq::assert_approx_eq;

    fn timeline(commands: &[Command]) -> Timeline {
        let mut tl = Timeline::new();
        for c in commands {
            tl.push(*c).unwrap();
        }
        tl
    }

    #[test]
    fn hold_then_ramp_scenario() {
        let tl = timeline(&[
            Command::new(0.0, 0.0, CommandKind::Hold { value: 0.5 }),
            Command::new(
                0.5,
                0.5,
                CommandKind::LinearRamp {
                    init: 0.5,
                    target: 0.1,
                },
            ),
        ]);
        let resolved = tl.resolve().unwrap();
        assert_approx_eq!(resolved.total_span(), 1.0);

        let compiled = Compiler::new(Calibration::identity()).compile(&tl).unwrap();
        assert!(compiled.quantized_frequency() <= 1.0);
        assert!(compiled.total_duration() >= 1.0);
        assert_approx_eq!(compiled.quantized_frequency() * compiled.total_duration(), 1.0, 1e-12);

        let dt = compiled.total_duration() / (BUFFER_LEN - 1) as f64;
        let mid = sample_index(0.5, dt);
        let end = sample_index(1.0, dt);
        assert!(compiled.samples()[..mid].iter().all(|&s| s == 0.5));
        assert_approx_eq!(compiled.samples()[mid], 0.5);
        assert_approx_eq!(compiled.samples()[end - 1], 0.1, 1e-3);
        assert!(compiled.samples()[end..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn buffer_length_fixed() {
        let tl = timeline(&[Command::new(0.0, 0.01, CommandKind::Hold { value: 0.1 })]);
        let compiled = Compiler::new(Calibration::identity()).compile(&tl).unwrap();
        assert_eq!(compiled.samples().len(), 16384);
    }

    #[test]
    fn invalid_power_ramp_fails_before_synthesis() {
        let mut tl = Timeline::new();
        tl.push(Command::new(0.0, 0.0, CommandKind::Hold { value: 0.5 }))
            .unwrap();
        tl.push(Command::new(
            0.1,
            0.0,
            CommandKind::PowerRamp {
                time_const: 0.2,
                init: 0.5,
                target: 0.1,
                shape_param: 10.0,
            },
        ))
        .unwrap();
        tl.push(Command::new(0.5, 0.1, CommandKind::Hold { value: 0.1 }))
            .unwrap();

        let err = Compiler::new(Calibration::identity())
            .compile(&tl)
            .unwrap_err();
        assert!(matches!(err, ScheduleError::PowerRampTimeConst { index: 1, .. }));
    }

    #[test]
    fn custom_frequency_step() {
        let tl = timeline(&[Command::new(0.0, 0.3, CommandKind::Hold { value: 0.1 })]);
        let compiled = Compiler::new(Calibration::identity())
            .with_frequency_step(1.0)
            .unwrap()
            .compile(&tl)
            .unwrap();
        assert_eq!(compiled.quantized_frequency(), 3.0);
    }

    #[test]
    fn device_frequency_step_is_used() {
        let tl = timeline(&[Command::new(0.0, 0.3, CommandKind::Hold { value: 0.1 })]);
        let mut config = DeviceConfig::default();
        config.steps.frequency = 0.5;
        let compiled = Compiler::for_device(&config).unwrap().compile(&tl).unwrap();
        assert_eq!(compiled.quantized_frequency(), 3.0);

        config.steps.frequency = FREQ_STEP;
        let default_grid = Compiler::for_device(&config).unwrap().compile(&tl).unwrap();
        assert_approx_eq!(default_grid.quantized_frequency(), 28.0 * FREQ_STEP, 1e-12);
    }

    #[test]
    fn invalid_frequency_step_rejected() {
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Compiler::new(Calibration::identity()).with_frequency_step(step),
                Err(ConfigurationError::Step { attribute: "frequency", .. })
            ));
        }
        let mut config = DeviceConfig::default();
        config.calibration.peak_volt = 0.0;
        assert!(matches!(
            Compiler::for_device(&config),
            Err(ConfigurationError::PeakVolt(_))
        ));
    }
}
