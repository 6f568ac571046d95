//! Hardware worker — the only code that talks to the generator.
//!
//! The worker keeps the generator's current output parameters, arms it with a
//! compiled burst for buffered runs, and returns it to a quiet DC output for
//! manual control. All values it sends are in generator units; the
//! [`Calibration`] converts from panel volts.

use super::calibration::Calibration;
use super::config::{DeviceConfig, OutChannel, OutputShape, StandardOutput, Waveform};
use super::error::HardwareError;
use super::hardware::{GeneratorSetup, Indicator, SignalGenerator, TriggerSource};
use super::panel::{AttributeUpdate, FrontPanel};
use crate::waveform::{evaporation_curve, CompiledWaveform};

/// What to play during a buffered run.
#[derive(Debug, Clone, PartialEq)]
pub enum BufferedProgram {
    /// A compiled timeline, played once per external trigger.
    Arbitrary(CompiledWaveform),
    /// A built-in waveform or the legacy evaporation curve.
    Standard(StandardOutput),
}

/// Front-panel values reported after a reset, in panel units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeSnapshot {
    pub waveform: Waveform,
    pub frequency: f64,
    pub amplitude: f64,
    pub offset: f64,
}

impl From<AttributeSnapshot> for FrontPanel {
    fn from(snapshot: AttributeSnapshot) -> Self {
        FrontPanel {
            waveform: snapshot.waveform,
            amplitude: snapshot.amplitude,
            offset: snapshot.offset,
            frequency: snapshot.frequency,
        }
    }
}

/// A secondary worker that must also return to manual with the device.
pub trait SubDevice {
    fn name(&self) -> &str;

    /// Reset to manual operation. Returns `false` on failure.
    fn transition_to_manual(&mut self) -> bool;
}

/// Output parameters last sent to the generator, in generator units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OutputState {
    waveform: Waveform,
    frequency: f64,
    amplitude: f64,
    offset: f64,
    cycles_per_burst: u32,
}

/// Owns the generator handle for one device.
pub struct GeneratorWorker<G: SignalGenerator> {
    name: String,
    generator: G,
    calibration: Calibration,
    out_channel: OutChannel,
    state: OutputState,
    armed: bool,
}

impl<G: SignalGenerator> GeneratorWorker<G> {
    pub fn new(generator: G, config: &DeviceConfig) -> Self {
        let calibration = config.calibration;
        Self {
            name: format!("{}_worker", config.name),
            generator,
            calibration,
            out_channel: config.out_channel,
            state: Self::manual_defaults(&calibration),
            armed: false,
        }
    }

    /// DC output at 0 V, continuous, free-running.
    fn manual_defaults(calibration: &Calibration) -> OutputState {
        OutputState {
            waveform: Waveform::Dc,
            frequency: 0.0,
            amplitude: calibration.amplitude(0.0),
            offset: calibration.offset(0.0),
            cycles_per_burst: 0,
        }
    }

    fn manual_setup(&self) -> GeneratorSetup {
        GeneratorSetup {
            waveform: Some(self.state.waveform),
            frequency: self.state.frequency,
            amplitude: self.state.amplitude,
            offset: self.state.offset,
            trigger_source: Some(TriggerSource::Immediately),
            cycles_per_burst: Some(self.state.cycles_per_burst),
        }
    }

    /// Connect the output and put the generator into its default state.
    pub fn init(&mut self) -> Result<(), HardwareError> {
        self.generator.select_output(self.out_channel)?;
        self.state = Self::manual_defaults(&self.calibration);
        self.generator.setup(&self.manual_setup())?;
        self.armed = false;
        self.generator.set_indicator(Indicator::Ready);
        tracing::info!(worker = %self.name, output = ?self.out_channel, "generator initialised");
        Ok(())
    }

    /// Arm the generator for a buffered run.
    pub fn transition_to_buffered(
        &mut self,
        program: &BufferedProgram,
    ) -> Result<(), HardwareError> {
        self.generator.set_indicator(Indicator::TransitionToBuffered);
        match program {
            BufferedProgram::Arbitrary(compiled) => self.arm_arbitrary(compiled)?,
            BufferedProgram::Standard(output) => self.arm_standard(output)?,
        }
        self.armed = true;
        Ok(())
    }

    fn arm_arbitrary(&mut self, compiled: &CompiledWaveform) -> Result<(), HardwareError> {
        let cal = self.calibration;
        self.state.frequency = compiled.quantized_frequency();
        // Samples already carry the calibration, so play them at full scale.
        self.state.amplitude = cal.amplitude(cal.peak_volt);
        self.state.offset = cal.offset(0.0);
        self.state.cycles_per_burst = 1;

        self.generator.setup(&GeneratorSetup {
            waveform: None,
            frequency: self.state.frequency,
            amplitude: self.state.amplitude,
            offset: self.state.offset,
            trigger_source: Some(TriggerSource::ExtPositiveEdge),
            cycles_per_burst: Some(1),
        })?;
        self.generator.write_data(compiled.samples().as_slice())?;
        tracing::info!(
            worker = %self.name,
            frequency = compiled.quantized_frequency(),
            total_duration = compiled.total_duration(),
            "arbitrary burst uploaded"
        );
        Ok(())
    }

    fn arm_standard(&mut self, output: &StandardOutput) -> Result<(), HardwareError> {
        self.state.frequency = output.frequency;
        self.state.amplitude = output.amplitude;
        self.state.offset = output.offset + self.calibration.offset_calib;
        self.state.cycles_per_burst = output.cycles_per_burst;

        let waveform = match output.shape {
            OutputShape::Builtin(w) => {
                self.state.waveform = w;
                Some(w)
            }
            OutputShape::EvaporationRamp { .. } => None,
        };
        self.generator.setup(&GeneratorSetup {
            waveform,
            frequency: self.state.frequency,
            amplitude: self.state.amplitude,
            offset: self.state.offset,
            trigger_source: Some(TriggerSource::Immediately),
            cycles_per_burst: Some(self.state.cycles_per_burst),
        })?;

        if let OutputShape::EvaporationRamp {
            time_const,
            ratio_trap_temp,
        } = output.shape
        {
            let curve = evaporation_curve(output.frequency, time_const, ratio_trap_temp);
            self.generator.write_data(curve.as_slice())?;
        }
        tracing::info!(worker = %self.name, shape = ?output.shape, "standard output armed");
        Ok(())
    }

    /// Reset to default manual output.
    ///
    /// Returns whether the reset reached the hardware, and the front-panel
    /// values that now apply.
    pub fn transition_to_manual(&mut self) -> (bool, AttributeSnapshot) {
        self.generator.set_indicator(Indicator::TransitionToManual);
        self.state = Self::manual_defaults(&self.calibration);
        self.armed = false;

        let success = match self.generator.setup(&self.manual_setup()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(worker = %self.name, error = %e, "reset to manual failed");
                false
            }
        };
        (success, self.snapshot())
    }

    /// Manual defaults as the front panel shows them.
    pub fn snapshot(&self) -> AttributeSnapshot {
        AttributeSnapshot {
            waveform: self.state.waveform,
            frequency: self.state.frequency,
            amplitude: 0.0,
            offset: 0.0,
        }
    }

    /// Push one (already quantized) front-panel change to the generator.
    ///
    /// The stored output state only changes once the generator accepted it.
    pub fn update_attribute(&mut self, update: AttributeUpdate) -> Result<(), HardwareError> {
        self.generator.set_indicator(Indicator::ManualUpdate);
        let mut next = self.state;
        match update {
            AttributeUpdate::Waveform(w) => next.waveform = w,
            AttributeUpdate::Amplitude(v) => next.amplitude = self.calibration.amplitude(v),
            AttributeUpdate::Offset(v) => next.offset = self.calibration.offset(v),
            AttributeUpdate::Frequency(v) => next.frequency = v,
        }
        self.generator.setup(&GeneratorSetup {
            waveform: Some(next.waveform),
            frequency: next.frequency,
            amplitude: next.amplitude,
            offset: next.offset,
            trigger_source: None,
            cycles_per_burst: None,
        })?;
        self.state = next;
        Ok(())
    }

    /// Drop a half-armed program after a failed transition to buffered and
    /// put the generator back on its default manual output.
    pub fn abort_transition_to_buffered(&mut self) -> Result<(), HardwareError> {
        self.armed = false;
        self.state = Self::manual_defaults(&self.calibration);
        self.generator.setup(&self.manual_setup())?;
        self.generator.set_indicator(Indicator::Ready);
        Ok(())
    }

    /// Return the generator to its default output before exit.
    pub fn shutdown(&mut self) -> Result<(), HardwareError> {
        self.generator.set_indicator(Indicator::Ready);
        self.state = Self::manual_defaults(&self.calibration);
        self.armed = false;
        self.generator.setup(&self.manual_setup())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a buffered program is loaded.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut G {
        &mut self.generator
    }

    pub fn into_generator(self) -> G {
        self.generator
    }
}
