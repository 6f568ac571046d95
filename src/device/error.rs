//! Device-side error types.

use thiserror::Error;

use super::controller::Mode;

/// Out-of-range or malformed device definition. Raised before any timeline
/// exists.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unknown waveform '{0}' (expected sin, cos, ramp, halframp, square, dc, noise or evaporation_ramp)")]
    UnknownWaveform(String),

    #[error("cycle_duration {0} out of range (must be at least 1.6e-8 s)")]
    CycleDuration(f64),

    #[error("amplitude {0} out of range [0, 1]")]
    Amplitude(f64),

    #[error("offset {0} out of range [0, 2]")]
    Offset(f64),

    #[error("evaporation_ramp needs time_const in (0, cycle_duration = {cycle_duration}], got {time_const:?}")]
    EvaporationTimeConst {
        time_const: Option<f64>,
        cycle_duration: f64,
    },

    #[error("evaporation_ramp needs a strictly positive ratio_trap_temp, got {0:?}")]
    RatioTrapTemp(Option<f64>),

    #[error("ratio_trap_temp {0} gives no usable decay exponent (must be finite and positive)")]
    EvaporationShape(f64),

    #[error("peak_volt must be a positive finite number, got {0}")]
    PeakVolt(f64),

    #[error("offset_calib must be finite, got {0}")]
    OffsetCalib(f64),

    #[error("{attribute} step must be a positive finite number, got {value}")]
    Step { attribute: &'static str, value: f64 },

    #[error("trigger_duration must be positive, got {0}")]
    TriggerDuration(f64),

    #[error("device name must not be empty")]
    EmptyName,

    #[error("cannot read device config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse device config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failure reported by a [`SignalGenerator`](super::SignalGenerator).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HardwareError {
    #[error("generator not connected")]
    Disconnected,
    #[error("setup rejected: {0}")]
    Setup(String),
    #[error("sample upload failed: {0}")]
    Data(String),
}

/// Transition to manual did not bring every worker back to a known state.
///
/// Partial hardware state is not safe to continue from: the operator has to
/// restart the device.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("could not transition {device} to manual (failed: {}); you must restart this device to continue", failed.join(", "))]
pub struct TransitionFailure {
    pub device: String,
    /// Names of the workers whose reset failed.
    pub failed: Vec<String>,
}

/// Errors from driving a device through its modes.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{operation} is not allowed in {mode:?} mode")]
    WrongMode { operation: &'static str, mode: Mode },

    #[error("{device} failed to return to manual and must be restarted")]
    RestartRequired { device: String },

    #[error(transparent)]
    Hardware(#[from] HardwareError),

    #[error(transparent)]
    Transition(#[from] TransitionFailure),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
