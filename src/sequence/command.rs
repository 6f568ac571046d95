//! Command model — a single scheduled output instruction.
//!
//! A [`Command`] pairs a start time and duration with a [`CommandKind`]
//! describing the waveform to play over that interval. A duration of zero
//! means "extend until the next command starts" and is resolved by the
//! [`Timeline`](super::Timeline).

use super::error::ScheduleError;

/// What a command outputs over its interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// Constant output.
    Hold { value: f64 },
    /// Straight line from `init` to `target`.
    LinearRamp { init: f64, target: f64 },
    /// Power-law evaporation ramp from `init` down to `target`.
    ///
    /// `time_const` sets where the curve would reach its singular point;
    /// `shape_param` is the dimensionless trap/temperature ratio that
    /// determines the decay exponent.
    PowerRamp {
        time_const: f64,
        init: f64,
        target: f64,
        shape_param: f64,
    },
    /// Sine wave, phase zero at the command start.
    Oscillation {
        frequency: f64,
        amplitude: f64,
        offset: f64,
    },
}

impl CommandKind {
    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Hold { .. } => "hold",
            CommandKind::LinearRamp { .. } => "linear_ramp",
            CommandKind::PowerRamp { .. } => "power_ramp",
            CommandKind::Oscillation { .. } => "oscillation",
        }
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        match *self {
            CommandKind::Hold { value } => vec![("value", value)],
            CommandKind::LinearRamp { init, target } => vec![("init", init), ("final", target)],
            CommandKind::PowerRamp {
                time_const,
                init,
                target,
                shape_param,
            } => vec![
                ("time_const", time_const),
                ("init", init),
                ("final", target),
                ("shape_param", shape_param),
            ],
            CommandKind::Oscillation {
                frequency,
                amplitude,
                offset,
            } => vec![
                ("frequency", frequency),
                ("amplitude", amplitude),
                ("offset", offset),
            ],
        }
    }
}

/// A scheduled instruction on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// Absolute start time in seconds.
    pub start_time: f64,
    /// Duration in seconds; `0.0` extends to the next command.
    pub duration: f64,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(start_time: f64, duration: f64, kind: CommandKind) -> Self {
        Self {
            start_time,
            duration,
            kind,
        }
    }

    /// Check the invariants that do not depend on neighbouring commands.
    ///
    /// `index` is only used to label errors. A power ramp with a zero
    /// duration skips the `time_const` check; it is repeated once the
    /// duration has been resolved.
    pub fn validate(&self, index: usize) -> Result<(), ScheduleError> {
        for (field, value) in [("t", self.start_time), ("duration", self.duration)]
            .into_iter()
            .chain(self.kind.fields())
        {
            if !value.is_finite() {
                return Err(ScheduleError::NonFinite { index, field });
            }
        }
        if self.start_time < 0.0 {
            return Err(ScheduleError::InvalidTime {
                index,
                field: "t",
                value: self.start_time,
            });
        }
        if self.duration < 0.0 {
            return Err(ScheduleError::InvalidTime {
                index,
                field: "duration",
                value: self.duration,
            });
        }

        if let CommandKind::PowerRamp {
            time_const,
            init,
            target,
            shape_param,
        } = self.kind
        {
            if self.duration > 0.0 && time_const <= self.duration {
                return Err(ScheduleError::PowerRampTimeConst {
                    index,
                    time_const,
                    duration: self.duration,
                });
            }
            if target >= init {
                return Err(ScheduleError::PowerRampDirection {
                    index,
                    init,
                    target,
                });
            }
            let exponent = ramp_exponent(shape_param);
            if !exponent.is_finite() || exponent == 0.0 {
                return Err(ScheduleError::PowerRampShape { index, shape_param });
            }
        }
        Ok(())
    }

    /// End time for a command whose duration is already known.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Decay exponent of the power-law ramp for a given shape parameter.
///
/// The shape parameter is first corrected by `(p - 5) / (p - 4)`, then mapped
/// to `2 (s - 3) / (s - 6)`. Returns a non-finite value for parameters that
/// hit a pole.
pub fn ramp_exponent(shape_param: f64) -> f64 {
    let corrected = shape_param + (shape_param - 5.0) / (shape_param - 4.0);
    2.0 * (corrected - 3.0) / (corrected - 6.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn power_ramp(duration: f64, time_const: f64, init: f64, target: f64) -> Command {
        Command::new(
            0.0,
            duration,
            CommandKind::PowerRamp {
                time_const,
                init,
                target,
                shape_param: 10.0,
            },
        )
    }

    #[test]
    fn hold_is_valid() {
        let cmd = Command::new(0.0, 1.0, CommandKind::Hold { value: 0.3 });
        assert!(cmd.validate(0).is_ok());
    }

    #[test]
    fn negative_start_rejected() {
        let cmd = Command::new(-0.1, 1.0, CommandKind::Hold { value: 0.3 });
        assert!(matches!(
            cmd.validate(0),
            Err(ScheduleError::InvalidTime { field: "t", .. })
        ));
    }

    #[test]
    fn nan_parameter_rejected() {
        let cmd = Command::new(
            0.0,
            1.0,
            CommandKind::LinearRamp {
                init: f64::NAN,
                target: 0.0,
            },
        );
        assert_eq!(
            cmd.validate(3),
            Err(ScheduleError::NonFinite {
                index: 3,
                field: "init"
            })
        );
    }

    #[test]
    fn power_ramp_needs_time_const_above_duration() {
        assert!(power_ramp(1.0, 2.0, 1.0, 0.1).validate(0).is_ok());
        assert!(matches!(
            power_ramp(1.0, 1.0, 1.0, 0.1).validate(0),
            Err(ScheduleError::PowerRampTimeConst { .. })
        ));
        assert!(matches!(
            power_ramp(1.0, 0.5, 1.0, 0.1).validate(0),
            Err(ScheduleError::PowerRampTimeConst { .. })
        ));
    }

    #[test]
    fn power_ramp_time_const_check_deferred_for_open_duration() {
        assert!(power_ramp(0.0, 0.5, 1.0, 0.1).validate(0).is_ok());
    }

    #[test]
    fn power_ramp_must_decrease() {
        assert!(matches!(
            power_ramp(1.0, 2.0, 0.1, 0.1).validate(0),
            Err(ScheduleError::PowerRampDirection { .. })
        ));
        assert!(matches!(
            power_ramp(1.0, 2.0, 0.1, 0.5).validate(0),
            Err(ScheduleError::PowerRampDirection { .. })
        ));
    }

    #[test]
    fn power_ramp_shape_pole_rejected() {
        let cmd = Command::new(
            0.0,
            1.0,
            CommandKind::PowerRamp {
                time_const: 2.0,
                init: 1.0,
                target: 0.1,
                shape_param: 4.0,
            },
        );
        assert!(matches!(
            cmd.validate(0),
            Err(ScheduleError::PowerRampShape { .. })
        ));
    }

    #[test]
    fn ramp_exponent_for_typical_ratio() {
        // p = 10 → s = 10 + 5/6, e = 2 (s - 3) / (s - 6)
        let s = 10.0 + 5.0 / 6.0;
        let expected = 2.0 * (s - 3.0) / (s - 6.0);
        assert!((ramp_exponent(10.0) - expected).abs() < 1e-12);
        assert!(ramp_exponent(10.0) > 0.0);
    }

    #[test]
    fn kind_names() {
        assert_eq!(CommandKind::Hold { value: 0.0 }.name(), "hold");
        assert_eq!(
            CommandKind::Oscillation {
                frequency: 1.0,
                amplitude: 1.0,
                offset: 0.0
            }
            .name(),
            "oscillation"
        );
    }
}
