//! Sequence authoring — command model, timeline, and the submission API.
//!
//! A [`Sequence`] is what experiment code talks to: one call per output
//! instruction. The first accepted instruction also fires the parent trigger
//! through a [`TriggerSink`], so the generator is armed before its burst.

pub mod command;
pub mod error;
pub mod file;
pub mod timeline;

pub use command::{ramp_exponent, Command, CommandKind};
pub use error::ScheduleError;
pub use file::{load_sequence, CommandEntry, SequenceFile};
pub use timeline::{ResolvedTimeline, Timeline};

use crate::waveform::{CompiledWaveform, Compiler};

/// Receives the trigger emitted when a sequence gets its first command.
pub trait TriggerSink {
    /// Trigger the parent device at `time` for `duration` seconds
    /// (`None` lets the parent use its default pulse length).
    fn trigger(&mut self, time: f64, duration: Option<f64>);
}

/// A trigger pulse requested from the parent device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub time: f64,
    pub duration: Option<f64>,
}

/// A [`TriggerSink`] that simply records every trigger.
#[derive(Debug, Clone, Default)]
pub struct TriggerLog {
    pub triggers: Vec<Trigger>,
}

impl TriggerSink for TriggerLog {
    fn trigger(&mut self, time: f64, duration: Option<f64>) {
        self.triggers.push(Trigger { time, duration });
    }
}

/// Builds a [`Timeline`] one instruction at a time.
pub struct Sequence<S: TriggerSink = TriggerLog> {
    device: String,
    trigger_duration: Option<f64>,
    timeline: Timeline,
    sink: S,
}

impl Sequence<TriggerLog> {
    /// Sequence that records its trigger instead of forwarding it.
    pub fn recording(device: impl Into<String>, trigger_duration: Option<f64>) -> Self {
        Self::new(device, trigger_duration, TriggerLog::default())
    }
}

impl<S: TriggerSink> Sequence<S> {
    pub fn new(device: impl Into<String>, trigger_duration: Option<f64>, sink: S) -> Self {
        Self {
            device: device.into(),
            trigger_duration,
            timeline: Timeline::new(),
            sink,
        }
    }

    /// Constant `value` from `t` for `duration` seconds (0 = until the next command).
    pub fn hold(&mut self, t: f64, duration: f64, value: f64) -> Result<(), ScheduleError> {
        self.append(Command::new(t, duration, CommandKind::Hold { value }))
    }

    /// Linear ramp from `init` to `target`.
    pub fn linear_ramp(
        &mut self,
        t: f64,
        duration: f64,
        init: f64,
        target: f64,
    ) -> Result<(), ScheduleError> {
        self.append(Command::new(
            t,
            duration,
            CommandKind::LinearRamp { init, target },
        ))
    }

    /// Power-law evaporation ramp. Requires `time_const > duration` and
    /// `target < init`.
    pub fn power_ramp(
        &mut self,
        t: f64,
        duration: f64,
        time_const: f64,
        init: f64,
        target: f64,
        shape_param: f64,
    ) -> Result<(), ScheduleError> {
        self.append(Command::new(
            t,
            duration,
            CommandKind::PowerRamp {
                time_const,
                init,
                target,
                shape_param,
            },
        ))
    }

    /// Sine output with the given frequency, amplitude and offset.
    pub fn oscillation(
        &mut self,
        t: f64,
        duration: f64,
        frequency: f64,
        amplitude: f64,
        offset: f64,
    ) -> Result<(), ScheduleError> {
        self.append(Command::new(
            t,
            duration,
            CommandKind::Oscillation {
                frequency,
                amplitude,
                offset,
            },
        ))
    }

    /// Append an already-built command.
    pub fn append(&mut self, command: Command) -> Result<(), ScheduleError> {
        let first = self.timeline.is_empty();
        self.timeline.push(command)?;
        if first {
            tracing::debug!(
                device = %self.device,
                t = command.start_time,
                "first command, triggering parent"
            );
            self.sink.trigger(command.start_time, self.trigger_duration);
        }
        Ok(())
    }

    /// Compile the sequence into a sample buffer for upload.
    pub fn compile(&self, compiler: &Compiler) -> Result<CompiledWaveform, ScheduleError> {
        compiler.compile(&self.timeline)
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}
