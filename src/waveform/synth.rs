//! Sample buffer synthesizer — renders a resolved timeline into the
//! generator's fixed-length buffer.
//!
//! Every command maps to an index range `[start, end)` on a uniform grid
//! spanning the quantized burst period. Commands are written in timeline
//! order; a later command overwrites any samples an earlier one produced.

use std::f64::consts::TAU;

use crate::device::Calibration;
use crate::sequence::{ramp_exponent, Command, CommandKind, ResolvedTimeline};

/// Number of samples the generator replays per burst.
pub const BUFFER_LEN: usize = 1 << 14;

/// A full generator buffer.
pub type SampleBuffer = Box<[f64; BUFFER_LEN]>;

/// Buffer index nearest to `offset` seconds on a grid with spacing `dt`.
pub fn sample_index(offset: f64, dt: f64) -> usize {
    ((offset / dt).round() as usize).min(BUFFER_LEN)
}

/// Render `timeline` over `span` seconds and convert to generator units.
///
/// Samples outside `[-1, 1]` after calibration are clamped.
pub fn synthesize(
    timeline: &ResolvedTimeline,
    span: f64,
    calibration: &Calibration,
) -> SampleBuffer {
    let mut buffer: SampleBuffer = Box::new([0.0; BUFFER_LEN]);
    let dt = span / (BUFFER_LEN - 1) as f64;

    for (index, command) in timeline.commands().iter().enumerate() {
        let offset = command.start_time - timeline.t_init();
        let start = sample_index(offset, dt);
        let end = sample_index(offset + command.duration, dt);
        if end <= start {
            tracing::debug!(
                index,
                kind = command.kind.name(),
                "command shorter than one sample, skipped"
            );
            continue;
        }
        tracing::debug!(index, kind = command.kind.name(), start, end, "rendering");
        fill(&mut buffer[start..end], command);
    }

    let mut clipped = 0usize;
    for sample in buffer.iter_mut() {
        let value = calibration.sample(*sample);
        if !(-1.0..=1.0).contains(&value) {
            clipped += 1;
        }
        *sample = value.clamp(-1.0, 1.0);
    }
    if clipped > 0 {
        tracing::warn!(clipped, "samples exceeded the generator range and were clamped");
    }

    buffer
}

/// Write one command's waveform into its slice of the buffer.
fn fill(out: &mut [f64], command: &Command) {
    let len = out.len() as f64;
    let progress = |k: usize| k as f64 / len;

    match command.kind {
        CommandKind::Hold { value } => out.fill(value),
        CommandKind::LinearRamp { init, target } => {
            for (k, sample) in out.iter_mut().enumerate() {
                *sample = init + (target - init) * progress(k);
            }
        }
        CommandKind::PowerRamp {
            time_const,
            init,
            target,
            shape_param,
        } => {
            let ramp = PowerRampCurve::new(command.duration, time_const, init, target, shape_param);
            for (k, sample) in out.iter_mut().enumerate() {
                *sample = ramp.at(progress(k));
            }
        }
        CommandKind::Oscillation {
            frequency,
            amplitude,
            offset,
        } => {
            let cycles = frequency * command.duration;
            for (k, sample) in out.iter_mut().enumerate() {
                *sample = (TAU * cycles * progress(k)).sin() * amplitude + offset;
            }
        }
    }
}

/// Power-law decay `init → target` over a fraction `duration / time_const`
/// of the curve's characteristic time.
#[derive(Debug, Clone, Copy)]
pub struct PowerRampCurve {
    exponent: f64,
    fraction: f64,
    scale: f64,
    pivot: f64,
}

impl PowerRampCurve {
    pub fn new(duration: f64, time_const: f64, init: f64, target: f64, shape_param: f64) -> Self {
        let exponent = ramp_exponent(shape_param);
        let fraction = duration / time_const;
        let end_factor = (1.0 - fraction).powf(exponent);
        let pivot = (init * end_factor - target) / (end_factor - 1.0);
        Self {
            exponent,
            fraction,
            scale: init - pivot,
            pivot,
        }
    }

    /// Value at normalized progress `u` in `[0, 1]`.
    pub fn at(&self, u: f64) -> f64 {
        self.scale * (1.0 - u * self.fraction).powf(self.exponent) + self.pivot
    }
}

/// Legacy evaporation buffer for the standard `evaporation_ramp` output.
///
/// One leading zero (so the output rests at zero after the burst) followed by
/// `(1 - t / time_const)^e` sampled over one period. The base is floored at
/// zero past `time_const` and samples are clamped to `[-1, 1]`.
///
/// Amplitude and offset of the standard output are applied by the generator
/// setup, so the curve stays in normalized units.
pub fn evaporation_curve(frequency: f64, time_const: f64, ratio_trap_temp: f64) -> SampleBuffer {
    let mut buffer: SampleBuffer = Box::new([0.0; BUFFER_LEN]);
    let exponent = ramp_exponent(ratio_trap_temp);
    let period = 1.0 / frequency;
    let points = BUFFER_LEN - 1;
    for (i, sample) in buffer[1..].iter_mut().enumerate() {
        let t = period * i as f64 / (points - 1) as f64;
        *sample = (1.0 - t / time_const).max(0.0).powf(exponent).clamp(-1.0, 1.0);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Timeline;
    use assert_approx_eq::assert_approx_eq;

    fn resolve(commands: &[Command]) -> ResolvedTimeline {
        let mut tl = Timeline::new();
        for c in commands {
            tl.push(*c).unwrap();
        }
        tl.resolve().unwrap()
    }

    fn dt(span: f64) -> f64 {
        span / (BUFFER_LEN - 1) as f64
    }

    #[test]
    fn hold_fills_its_range_only() {
        let tl = resolve(&[Command::new(0.0, 0.5, CommandKind::Hold { value: 0.4 })]);
        let buf = synthesize(&tl, 1.0, &Calibration::identity());
        let end = sample_index(0.5, dt(1.0));
        assert!(buf[..end].iter().all(|&s| s == 0.4));
        assert!(buf[end..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn linear_ramp_boundaries() {
        let tl = resolve(&[Command::new(
            0.0,
            1.0,
            CommandKind::LinearRamp {
                init: 0.8,
                target: -0.2,
            },
        )]);
        let buf = synthesize(&tl, 1.0, &Calibration::identity());
        let end = sample_index(1.0, dt(1.0));
        let step = 1.0 / end as f64;
        assert_approx_eq!(buf[0], 0.8);
        assert_approx_eq!(buf[end - 1], -0.2, step * 1.01);
        // Monotone decreasing across the ramp.
        assert!(buf[..end].windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn power_ramp_curve_endpoints() {
        for shape in [7.0, 10.0, 25.0, 100.0] {
            let curve = PowerRampCurve::new(1.0, 1.5, 0.9, 0.1, shape);
            assert_approx_eq!(curve.at(0.0), 0.9, 1e-12);
            assert_approx_eq!(curve.at(1.0), 0.1, 1e-9);
        }
    }

    #[test]
    fn power_ramp_samples_decay_towards_target() {
        let tl = resolve(&[Command::new(
            0.0,
            1.0,
            CommandKind::PowerRamp {
                time_const: 1.2,
                init: 0.9,
                target: 0.1,
                shape_param: 10.0,
            },
        )]);
        let buf = synthesize(&tl, 1.0, &Calibration::identity());
        let end = sample_index(1.0, dt(1.0));
        assert_approx_eq!(buf[0], 0.9, 1e-12);
        assert!((buf[end - 1] - 0.1).abs() < 1e-3);
        assert!(buf[..end].windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn oscillation_completes_whole_cycles() {
        let tl = resolve(&[Command::new(
            0.0,
            1.0,
            CommandKind::Oscillation {
                frequency: 4.0,
                amplitude: 0.5,
                offset: 0.1,
            },
        )]);
        let buf = synthesize(&tl, 1.0, &Calibration::identity());
        let end = sample_index(1.0, dt(1.0));
        assert_approx_eq!(buf[0], 0.1, 1e-12);
        // Quarter of the first cycle is the crest.
        let crest = end / 16;
        assert_approx_eq!(buf[crest], 0.6, 1e-3);
        let max = buf[..end].iter().cloned().fold(f64::MIN, f64::max);
        assert!(max <= 0.6 + 1e-12);
    }

    #[test]
    fn later_command_overwrites_earlier() {
        let tl = resolve(&[
            Command::new(0.0, 1.0, CommandKind::Hold { value: 0.3 }),
            Command::new(0.5, 0.25, CommandKind::Hold { value: -0.3 }),
        ]);
        let buf = synthesize(&tl, 1.0, &Calibration::identity());
        let d = dt(1.0);
        assert_eq!(buf[sample_index(0.25, d)], 0.3);
        assert_eq!(buf[sample_index(0.6, d)], -0.3);
        assert_eq!(buf[sample_index(0.9, d)], 0.3);
    }

    #[test]
    fn calibration_scales_and_clamps() {
        let tl = resolve(&[
            Command::new(0.0, 0.5, CommandKind::Hold { value: 5.0 }),
            Command::new(0.5, 0.5, CommandKind::Hold { value: 25.0 }),
        ]);
        let cal = Calibration {
            peak_volt: 10.0,
            offset_calib: 0.3,
            invert: true,
        };
        let buf = synthesize(&tl, 1.0, &cal);
        assert_approx_eq!(buf[0], -0.5, 1e-12);
        assert_eq!(buf[BUFFER_LEN - 2], -1.0);
    }

    #[test]
    fn sub_sample_command_skipped() {
        let tl = resolve(&[
            Command::new(0.0, 1e-9, CommandKind::Hold { value: 0.7 }),
            Command::new(0.5, 0.5, CommandKind::Hold { value: 0.2 }),
        ]);
        let buf = synthesize(&tl, 1.0, &Calibration::identity());
        assert_eq!(buf[0], 0.0);
    }

    #[test]
    fn index_clamped_to_buffer() {
        assert_eq!(sample_index(2.0, dt(1.0)), BUFFER_LEN);
        assert_eq!(sample_index(0.0, dt(1.0)), 0);
    }

    #[test]
    fn evaporation_curve_starts_at_rest() {
        let buf = evaporation_curve(1.0, 1.0, 10.0);
        assert_eq!(buf[0], 0.0);
        assert_approx_eq!(buf[1], 1.0, 1e-12);
        assert_approx_eq!(buf[BUFFER_LEN - 1], 0.0, 1e-12);
        assert!(buf[1..].windows(2).all(|w| w[1] <= w[0]));
    }

    #[test]
    fn evaporation_curve_stays_in_range() {
        for ratio in [0.5, 7.0, 10.0, 100.0] {
            let buf = evaporation_curve(2.0, 0.3, ratio);
            assert!(
                buf.iter().all(|s| s.is_finite() && (-1.0..=1.0).contains(s)),
                "ratio {ratio}"
            );
        }
    }
}
