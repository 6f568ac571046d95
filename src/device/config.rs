//! Device configuration — connection, calibration and step sizes loaded from
//! `~/.burstwave/device.yaml`, plus standard output definitions.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::calibration::Calibration;
use super::error::ConfigurationError;
use crate::sequence::ramp_exponent;
use crate::waveform::HardwareSteps;

/// Built-in generator waveforms selectable from the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sin,
    Cos,
    Ramp,
    HalfRamp,
    Square,
    Dc,
    Noise,
}

impl Waveform {
    pub const ALL: [Waveform; 7] = [
        Waveform::Sin,
        Waveform::Cos,
        Waveform::Ramp,
        Waveform::HalfRamp,
        Waveform::Square,
        Waveform::Dc,
        Waveform::Noise,
    ];

    /// Tag understood by the generator's setup call.
    pub fn as_str(&self) -> &'static str {
        match self {
            Waveform::Sin => "sin",
            Waveform::Cos => "cos",
            Waveform::Ramp => "ramp",
            Waveform::HalfRamp => "halframp",
            Waveform::Square => "square",
            Waveform::Dc => "dc",
            Waveform::Noise => "noise",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.as_str() == s)
            .ok_or_else(|| ConfigurationError::UnknownWaveform(s.to_string()))
    }
}

/// Analog output the generator drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutChannel {
    #[default]
    Out1,
    Out2,
}

fn default_name() -> String {
    "asg0".to_string()
}

/// Connection and calibration settings for one generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub ip_addr: Option<String>,
    #[serde(default)]
    pub out_channel: OutChannel,
    /// Length of the trigger pulse requested from the parent device.
    #[serde(default)]
    pub trigger_duration: Option<f64>,
    #[serde(default)]
    pub calibration: Calibration,
    #[serde(default)]
    pub steps: HardwareSteps,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            ip_addr: None,
            out_channel: OutChannel::default(),
            trigger_duration: None,
            calibration: Calibration::default(),
            steps: HardwareSteps::default(),
        }
    }
}

impl DeviceConfig {
    /// Standard location, `~/.burstwave/device.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".burstwave").join("device.yaml"))
    }

    /// Load from the standard location. Returns `None` if the file is
    /// missing or invalid (graceful fallback to defaults).
    pub fn load() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }
        match Self::load_from(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring device config");
                None
            }
        }
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path)?;
        let config: DeviceConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        self.calibration.validate()?;
        for (attribute, value) in [
            ("amplitude", self.steps.amplitude),
            ("offset", self.steps.offset),
            ("frequency", self.steps.frequency),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::Step { attribute, value });
            }
        }
        if let Some(d) = self.trigger_duration {
            if !(d.is_finite() && d > 0.0) {
                return Err(ConfigurationError::TriggerDuration(d));
            }
        }
        Ok(())
    }
}

/// Shortest cycle the generator can play, in seconds.
pub const MIN_CYCLE_DURATION: f64 = 1.6e-8;

/// A standard (non-arbitrary) output as written by the experiment author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDefinition {
    pub waveform: String,
    pub cycle_duration: f64,
    #[serde(default)]
    pub amplitude: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub cycles_per_burst: u32,
    #[serde(default)]
    pub time_const: Option<f64>,
    #[serde(default)]
    pub ratio_trap_temp: Option<f64>,
}

/// What a validated standard output plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputShape {
    Builtin(Waveform),
    EvaporationRamp { time_const: f64, ratio_trap_temp: f64 },
}

/// A validated [`OutputDefinition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardOutput {
    pub shape: OutputShape,
    pub frequency: f64,
    pub amplitude: f64,
    pub offset: f64,
    pub cycles_per_burst: u32,
}

impl OutputDefinition {
    /// Check ranges and resolve the waveform tag.
    pub fn validate(&self) -> Result<StandardOutput, ConfigurationError> {
        if !(self.cycle_duration >= MIN_CYCLE_DURATION && self.cycle_duration.is_finite()) {
            return Err(ConfigurationError::CycleDuration(self.cycle_duration));
        }
        if !(0.0..=1.0).contains(&self.amplitude) {
            return Err(ConfigurationError::Amplitude(self.amplitude));
        }
        if !(0.0..=2.0).contains(&self.offset) {
            return Err(ConfigurationError::Offset(self.offset));
        }

        let shape = if self.waveform == "evaporation_ramp" {
            let time_const = match self.time_const {
                Some(tc) if tc > 0.0 && tc <= self.cycle_duration => tc,
                other => {
                    return Err(ConfigurationError::EvaporationTimeConst {
                        time_const: other,
                        cycle_duration: self.cycle_duration,
                    })
                }
            };
            let ratio_trap_temp = match self.ratio_trap_temp {
                Some(r) if r > 0.0 && r.is_finite() => r,
                other => return Err(ConfigurationError::RatioTrapTemp(other)),
            };
            let exponent = ramp_exponent(ratio_trap_temp);
            if !(exponent.is_finite() && exponent > 0.0) {
                return Err(ConfigurationError::EvaporationShape(ratio_trap_temp));
            }
            OutputShape::EvaporationRamp {
                time_const,
                ratio_trap_temp,
            }
        } else {
            OutputShape::Builtin(self.waveform.parse()?)
        };

        Ok(StandardOutput {
            shape,
            frequency: 1.0 / self.cycle_duration,
            amplitude: self.amplitude,
            offset: self.offset,
            cycles_per_burst: self.cycles_per_burst,
        })
    }
}
