//! burstwave — compile sequence files and dry-run them against a simulated
//! generator.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use burstwave::device::{
    notification_channel, BufferedProgram, DeviceConfig, DeviceController, SimulatedGenerator,
    NOTIFY_CAPACITY,
};
use burstwave::sequence::{load_sequence, Sequence, TriggerLog};
use burstwave::waveform::{write_preview, CompiledWaveform, Compiler, HardwareSteps};

#[derive(Parser)]
#[command(name = "burstwave")]
#[command(version, about = "Timeline-to-waveform compiler for triggered signal generators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a sequence file and print the burst summary
    Compile {
        /// YAML sequence file
        sequence: PathBuf,

        /// Device config (defaults to ~/.burstwave/device.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also write the buffer as a WAV preview
        #[arg(short, long)]
        wav: Option<PathBuf>,
    },

    /// Snap front-panel values to the hardware grid
    Quantize {
        #[arg(short, long)]
        amplitude: Option<f64>,

        #[arg(short, long)]
        offset: Option<f64>,

        #[arg(short, long)]
        frequency: Option<f64>,

        /// Device config providing the step sizes
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run a sequence through a simulated generator, manual → buffered → manual
    Simulate {
        sequence: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Compile {
            sequence,
            config,
            wav,
        } => compile(&sequence, config.as_deref(), wav.as_deref()),
        Commands::Quantize {
            amplitude,
            offset,
            frequency,
            config,
        } => quantize(amplitude, offset, frequency, config.as_deref()),
        Commands::Simulate { sequence, config } => simulate(&sequence, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Explicit path, else the standard location, else defaults.
fn device_config(path: Option<&Path>) -> Result<DeviceConfig, Box<dyn Error>> {
    match path {
        Some(p) => Ok(DeviceConfig::load_from(p)?),
        None => Ok(DeviceConfig::load().unwrap_or_default()),
    }
}

fn build_sequence(
    path: &Path,
    config: &DeviceConfig,
) -> Result<Sequence<TriggerLog>, Box<dyn Error>> {
    let mut file = load_sequence(path)?;
    if file.trigger_duration.is_none() {
        file.trigger_duration = config.trigger_duration;
    }
    Ok(file.into_sequence(TriggerLog::default())?)
}

fn print_summary(sequence: &Sequence<TriggerLog>, compiler: &Compiler, compiled: &CompiledWaveform) {
    println!("device:          {}", sequence.device());
    println!("commands:        {}", sequence.timeline().len());
    println!(
        "frequency:       {:.6} Hz (step {} Hz)",
        compiled.quantized_frequency(),
        compiler.frequency_step()
    );
    println!("total duration:  {:.9} s", compiled.total_duration());
    println!("sample rate:     {:.3} S/s", compiled.sample_rate());
    if let Some(trigger) = sequence.sink().triggers.first() {
        match trigger.duration {
            Some(d) => println!("trigger:         t = {} s, {} s pulse", trigger.time, d),
            None => println!("trigger:         t = {} s", trigger.time),
        }
    }
}

fn compile(
    sequence_path: &Path,
    config_path: Option<&Path>,
    wav: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let config = device_config(config_path)?;
    let sequence = build_sequence(sequence_path, &config)?;
    let compiler = Compiler::for_device(&config)?;
    let compiled = sequence.compile(&compiler)?;
    print_summary(&sequence, &compiler, &compiled);

    if let Some(path) = wav {
        write_preview(path, &compiled)?;
        println!("preview:         {}", path.display());
    }
    Ok(())
}

fn quantize(
    amplitude: Option<f64>,
    offset: Option<f64>,
    frequency: Option<f64>,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let steps: HardwareSteps = device_config(config_path)?.steps;
    if amplitude.is_none() && offset.is_none() && frequency.is_none() {
        return Err("nothing to quantize (pass --amplitude, --offset or --frequency)".into());
    }
    if let Some(v) = amplitude {
        println!("amplitude: {v} -> {}", steps.amplitude(v));
    }
    if let Some(v) = offset {
        println!("offset:    {v} -> {}", steps.offset(v));
    }
    if let Some(v) = frequency {
        println!("frequency: {v} -> {}", steps.frequency(v));
    }
    Ok(())
}

fn simulate(sequence_path: &Path, config_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = device_config(config_path)?;
    let sequence = build_sequence(sequence_path, &config)?;
    let compiler = Compiler::for_device(&config)?;
    let compiled = sequence.compile(&compiler)?;
    print_summary(&sequence, &compiler, &compiled);

    let (tx, mut rx) = notification_channel(NOTIFY_CAPACITY);
    let mut controller = DeviceController::new(&config, SimulatedGenerator::new(), tx)?;

    controller.transition_to_buffered(BufferedProgram::Arbitrary(compiled))?;
    println!("mode:            {:?}", controller.mode());
    if let Some(setup) = controller.worker().generator().last_setup() {
        println!(
            "armed:           {:.6} Hz, amplitude {:.4}, offset {:.4}, trigger {:?}",
            setup.frequency,
            setup.amplitude,
            setup.offset,
            setup.trigger_source
        );
    }

    controller.transition_to_manual()?;
    println!("mode:            {:?}", controller.mode());
    for notification in rx.drain() {
        println!(
            "notification:    {} {:?}",
            notification.device, notification.outcome
        );
    }

    controller.shutdown()?;
    Ok(())
}
