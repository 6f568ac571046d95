//! Hardware contract — the vendor generator API seen through a trait.
//!
//! The worker only needs two operations: a `setup` call carrying the output
//! parameters and a write of the sample buffer. [`SimulatedGenerator`]
//! records both for tests and dry runs.

use super::config::{OutChannel, Waveform};
use super::error::HardwareError;

/// When the generator starts a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Free-running output (manual mode).
    Immediately,
    /// Wait for a rising edge on the external trigger input.
    ExtPositiveEdge,
}

/// Parameters of one `setup` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorSetup {
    /// `None` keeps the generator on its arbitrary (uploaded) buffer.
    pub waveform: Option<Waveform>,
    pub frequency: f64,
    pub amplitude: f64,
    pub offset: f64,
    /// `None` leaves the generator's current trigger source unchanged.
    pub trigger_source: Option<TriggerSource>,
    /// Repetitions per trigger; `Some(0)` plays continuously.
    pub cycles_per_burst: Option<u32>,
}

/// Status LED patterns shown while the worker is in each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Ready,
    TransitionToManual,
    TransitionToBuffered,
    ManualUpdate,
}

impl Indicator {
    pub fn led_pattern(self) -> u8 {
        match self {
            Indicator::Ready => 0b0000_0001,
            Indicator::TransitionToManual => 0b0000_0010,
            Indicator::TransitionToBuffered => 0b0000_0100,
            Indicator::ManualUpdate => 0b0000_1000,
        }
    }
}

/// An arbitrary signal generator output.
pub trait SignalGenerator {
    /// Route the generator to an analog output.
    fn select_output(&mut self, channel: OutChannel) -> Result<(), HardwareError>;

    fn setup(&mut self, setup: &GeneratorSetup) -> Result<(), HardwareError>;

    /// Replace the arbitrary waveform buffer. Values are in `[-1, 1]`.
    fn write_data(&mut self, samples: &[f64]) -> Result<(), HardwareError>;

    /// Show a status pattern. Generators without LEDs ignore it.
    fn set_indicator(&mut self, _indicator: Indicator) {}
}

/// In-memory generator that records every call.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGenerator {
    pub output: Option<OutChannel>,
    pub setups: Vec<GeneratorSetup>,
    pub data: Option<Vec<f64>>,
    pub led: u8,
    /// Fail every call while set.
    pub offline: bool,
}

impl SimulatedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_setup(&self) -> Option<&GeneratorSetup> {
        self.setups.last()
    }

    fn check_online(&self) -> Result<(), HardwareError> {
        if self.offline {
            Err(HardwareError::Disconnected)
        } else {
            Ok(())
        }
    }
}

impl SignalGenerator for SimulatedGenerator {
    fn select_output(&mut self, channel: OutChannel) -> Result<(), HardwareError> {
        self.check_online()?;
        self.output = Some(channel);
        Ok(())
    }

    fn setup(&mut self, setup: &GeneratorSetup) -> Result<(), HardwareError> {
        self.check_online()?;
        if !setup.frequency.is_finite() || setup.frequency < 0.0 {
            return Err(HardwareError::Setup(format!(
                "frequency {} out of range",
                setup.frequency
            )));
        }
        self.setups.push(*setup);
        Ok(())
    }

    fn write_data(&mut self, samples: &[f64]) -> Result<(), HardwareError> {
        self.check_online()?;
        if let Some(bad) = samples.iter().find(|s| !(-1.0..=1.0).contains(*s)) {
            return Err(HardwareError::Data(format!("sample {bad} outside [-1, 1]")));
        }
        self.data = Some(samples.to_vec());
        Ok(())
    }

    fn set_indicator(&mut self, indicator: Indicator) {
        self.led = indicator.led_pattern();
    }
}
