//! WAV preview of a compiled burst, for inspecting waveforms in any audio
//! editor or plotting tool.

use std::path::Path;

use super::CompiledWaveform;

/// Write the buffer as a mono 32-bit float WAV at its playback rate
/// (rounded to whole samples per second).
pub fn write_preview(path: &Path, compiled: &CompiledWaveform) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: (compiled.sample_rate().round() as u32).max(1),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in compiled.samples().iter() {
        writer.write_sample(sample as f32)?;
    }
    writer.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Calibration;
    use crate::sequence::{Command, CommandKind, Timeline};
    use crate::waveform::{Compiler, BUFFER_LEN};

    #[test]
    fn preview_round_trips_through_hound() {
        let mut tl = Timeline::new();
        tl.push(Command::new(
            0.0,
            0.5,
            CommandKind::LinearRamp {
                init: 0.0,
                target: 1.0,
            },
        ))
        .unwrap();
        let compiled = Compiler::new(Calibration::identity()).compile(&tl).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("burst.wav");
        write_preview(&path, &compiled).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(
            reader.spec().sample_rate,
            compiled.sample_rate().round() as u32
        );
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), BUFFER_LEN);
        assert_eq!(samples[0], 0.0);
    }
}
