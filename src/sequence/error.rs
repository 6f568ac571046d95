//! Error types for timeline validation and compilation.

use thiserror::Error;

/// A timeline failed validation. Raised before any hardware interaction;
/// the caller must fix the timeline and compile again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("timeline has no commands")]
    EmptyTimeline,

    #[error("final command requires an explicit duration (command {index} at t={start_time})")]
    MissingFinalDuration { index: usize, start_time: f64 },

    #[error("command {index} starts at t={start_time}, before the previous command at t={previous}")]
    OutOfOrder {
        index: usize,
        start_time: f64,
        previous: f64,
    },

    #[error("command {index}: {field} must be >= 0, got {value}")]
    InvalidTime {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("command {index}: {field} is not a finite number")]
    NonFinite { index: usize, field: &'static str },

    #[error("command {index}: power_ramp requires time_const > duration ({time_const} <= {duration})")]
    PowerRampTimeConst {
        index: usize,
        time_const: f64,
        duration: f64,
    },

    #[error("command {index}: power_ramp requires final < init ({target} >= {init})")]
    PowerRampDirection { index: usize, init: f64, target: f64 },

    #[error("command {index}: shape parameter {shape_param} gives no usable ramp exponent")]
    PowerRampShape { index: usize, shape_param: f64 },

    #[error("command {index} at t={start_time} resolves to zero duration")]
    ZeroWidth { index: usize, start_time: f64 },

    #[error("timeline span {span}s is longer than the slowest burst the generator can play")]
    SpanTooLong { span: f64 },
}
