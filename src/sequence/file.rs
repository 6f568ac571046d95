//! Sequence files — YAML descriptions of a command timeline.
//!
//! ```yaml
//! device: rp_asg
//! trigger_duration: 0.001
//! commands:
//!   - kind: hold
//!     t: 0.0
//!     duration: 0.0
//!     value: 0.5
//!   - kind: linear_ramp
//!     t: 0.5
//!     duration: 0.5
//!     init: 0.5
//!     final: 0.1
//! ```

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::command::{Command, CommandKind};
use super::{Sequence, TriggerSink};

/// One command as written in a sequence file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommandEntry {
    Hold {
        t: f64,
        #[serde(default)]
        duration: f64,
        value: f64,
    },
    LinearRamp {
        t: f64,
        #[serde(default)]
        duration: f64,
        init: f64,
        #[serde(rename = "final")]
        target: f64,
    },
    PowerRamp {
        t: f64,
        #[serde(default)]
        duration: f64,
        time_const: f64,
        init: f64,
        #[serde(rename = "final")]
        target: f64,
        shape_param: f64,
    },
    Oscillation {
        t: f64,
        #[serde(default)]
        duration: f64,
        frequency: f64,
        amplitude: f64,
        #[serde(default)]
        offset: f64,
    },
}

impl From<&CommandEntry> for Command {
    fn from(entry: &CommandEntry) -> Self {
        match *entry {
            CommandEntry::Hold { t, duration, value } => {
                Command::new(t, duration, CommandKind::Hold { value })
            }
            CommandEntry::LinearRamp {
                t,
                duration,
                init,
                target,
            } => Command::new(t, duration, CommandKind::LinearRamp { init, target }),
            CommandEntry::PowerRamp {
                t,
                duration,
                time_const,
                init,
                target,
                shape_param,
            } => Command::new(
                t,
                duration,
                CommandKind::PowerRamp {
                    time_const,
                    init,
                    target,
                    shape_param,
                },
            ),
            CommandEntry::Oscillation {
                t,
                duration,
                frequency,
                amplitude,
                offset,
            } => Command::new(
                t,
                duration,
                CommandKind::Oscillation {
                    frequency,
                    amplitude,
                    offset,
                },
            ),
        }
    }
}

/// A sequence file: target device, trigger pulse length and commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceFile {
    #[serde(default = "default_device")]
    pub device: String,
    #[serde(default)]
    pub trigger_duration: Option<f64>,
    #[serde(default)]
    pub commands: Vec<CommandEntry>,
}

fn default_device() -> String {
    "asg0".to_string()
}

impl SequenceFile {
    /// Replay the file's commands through the submission API.
    ///
    /// Errors are reported as [`io::ErrorKind::InvalidData`] so file and
    /// schedule problems share one path back to the caller.
    pub fn into_sequence<S: TriggerSink>(self, sink: S) -> io::Result<Sequence<S>> {
        let mut sequence = Sequence::new(self.device, self.trigger_duration, sink);
        for entry in &self.commands {
            sequence
                .append(Command::from(entry))
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        Ok(sequence)
    }
}

/// Load and parse a sequence file.
pub fn load_sequence(path: &Path) -> io::Result<SequenceFile> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
