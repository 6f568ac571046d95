//! Append-ordered command storage and duration resolution.
//!
//! Commands are appended in non-decreasing start-time order. Resolution fills
//! every open (zero) duration with the gap to the next command and yields an
//! immutable [`ResolvedTimeline`] whose span drives buffer synthesis.

use super::command::Command;
use super::error::ScheduleError;

/// An ordered collection of commands, built one append at a time.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    commands: Vec<Command>,
}

impl Timeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Append a command after validating it against the current tail.
    pub fn push(&mut self, command: Command) -> Result<(), ScheduleError> {
        let index = self.commands.len();
        command.validate(index)?;
        if let Some(previous) = self.commands.last() {
            if command.start_time < previous.start_time {
                return Err(ScheduleError::OutOfOrder {
                    index,
                    start_time: command.start_time,
                    previous: previous.start_time,
                });
            }
        }
        self.commands.push(command);
        Ok(())
    }

    /// Commands in append order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Fill open durations and check the invariants that need them.
    pub fn resolve(&self) -> Result<ResolvedTimeline, ScheduleError> {
        let last = self.commands.last().ok_or(ScheduleError::EmptyTimeline)?;
        if last.duration == 0.0 {
            return Err(ScheduleError::MissingFinalDuration {
                index: self.commands.len() - 1,
                start_time: last.start_time,
            });
        }

        let mut resolved = self.commands.clone();
        for (index, pair) in self.commands.windows(2).enumerate() {
            if resolved[index].duration == 0.0 {
                resolved[index].duration = pair[1].start_time - pair[0].start_time;
            }
        }

        for (index, command) in resolved.iter().enumerate() {
            if command.duration <= 0.0 {
                return Err(ScheduleError::ZeroWidth {
                    index,
                    start_time: command.start_time,
                });
            }
            // Re-run the per-command checks now that every duration is known.
            command.validate(index)?;
        }

        let t_init = resolved
            .iter()
            .map(|c| c.start_time)
            .fold(f64::INFINITY, f64::min);
        let t_final = resolved
            .iter()
            .map(Command::end_time)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(ResolvedTimeline {
            commands: resolved,
            t_init,
            t_final,
        })
    }
}

/// A timeline whose durations are all explicit and nonzero.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTimeline {
    commands: Vec<Command>,
    t_init: f64,
    t_final: f64,
}

impl ResolvedTimeline {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Earliest start time.
    pub fn t_init(&self) -> f64 {
        self.t_init
    }

    /// Latest end time.
    pub fn t_final(&self) -> f64 {
        self.t_final
    }

    /// Requested span `t_final - t_init`, before frequency quantization.
    pub fn total_span(&self) -> f64 {
        self.t_final - self.t_init
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::command::CommandKind;
    use assert_approx_eq::assert_approx_eq;

    fn hold(t: f64, duration: f64, value: f64) -> Command {
        Command::new(t, duration, CommandKind::Hold { value })
    }

    #[test]
    fn empty_timeline() {
        let tl = Timeline::new();
        assert!(tl.is_empty());
        assert_eq!(tl.resolve(), Err(ScheduleError::EmptyTimeline));
    }

    #[test]
    fn open_durations_filled_from_gaps() {
        let mut tl = Timeline::new();
        tl.push(hold(0.0, 0.0, 0.1)).unwrap();
        tl.push(hold(0.25, 0.0, 0.2)).unwrap();
        tl.push(hold(1.0, 0.5, 0.3)).unwrap();

        let resolved = tl.resolve().unwrap();
        let durations: Vec<f64> = resolved.commands().iter().map(|c| c.duration).collect();
        assert_approx_eq!(durations[0], 0.25);
        assert_approx_eq!(durations[1], 0.75);
        assert_approx_eq!(durations[2], 0.5);
    }

    #[test]
    fn explicit_durations_left_alone() {
        let mut tl = Timeline::new();
        tl.push(hold(0.0, 0.1, 0.1)).unwrap();
        tl.push(hold(0.5, 0.2, 0.2)).unwrap();

        let resolved = tl.resolve().unwrap();
        assert_approx_eq!(resolved.commands()[0].duration, 0.1);
    }

    #[test]
    fn final_command_needs_duration() {
        let mut tl = Timeline::new();
        tl.push(hold(0.0, 0.5, 0.1)).unwrap();
        tl.push(hold(0.5, 0.0, 0.2)).unwrap();
        assert_eq!(
            tl.resolve(),
            Err(ScheduleError::MissingFinalDuration {
                index: 1,
                start_time: 0.5
            })
        );
    }

    #[test]
    fn out_of_order_append_rejected() {
        let mut tl = Timeline::new();
        tl.push(hold(1.0, 0.5, 0.1)).unwrap();
        assert!(matches!(
            tl.push(hold(0.5, 0.5, 0.2)),
            Err(ScheduleError::OutOfOrder { index: 1, .. })
        ));
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn simultaneous_open_command_is_zero_width() {
        let mut tl = Timeline::new();
        tl.push(hold(0.5, 0.0, 0.1)).unwrap();
        tl.push(hold(0.5, 0.5, 0.2)).unwrap();
        assert!(matches!(
            tl.resolve(),
            Err(ScheduleError::ZeroWidth { index: 0, .. })
        ));
    }

    #[test]
    fn span_from_earliest_start_to_latest_end() {
        let mut tl = Timeline::new();
        tl.push(hold(0.2, 2.0, 0.1)).unwrap();
        tl.push(hold(0.5, 0.5, 0.2)).unwrap();

        let resolved = tl.resolve().unwrap();
        assert_approx_eq!(resolved.t_init(), 0.2);
        assert_approx_eq!(resolved.t_final(), 2.2);
        assert_approx_eq!(resolved.total_span(), 2.0);
    }

    #[test]
    fn resolved_power_ramp_rechecked() {
        let mut tl = Timeline::new();
        tl.push(Command::new(
            0.0,
            0.0,
            CommandKind::PowerRamp {
                time_const: 0.5,
                init: 1.0,
                target: 0.2,
                shape_param: 10.0,
            },
        ))
        .unwrap();
        tl.push(hold(1.0, 0.1, 0.2)).unwrap();

        assert!(matches!(
            tl.resolve(),
            Err(ScheduleError::PowerRampTimeConst { index: 0, .. })
        ));
    }
}
