use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use trigger_timing::config::{AnalysisConfig, ChannelConfig, ChannelSelector, OutputConfig};
use trigger_timing::local::process_file;
use trigger_timing::local::simulate::{simulate_to_file, SimulationConfig};
use trigger_timing::visualization::{FileFormat, PlotConfig};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[clap(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Detect trigger peaks on one channel and summarize the intervals between them
    Intervals(Intervals),

    /// Measure the delay from each trigger on one channel to the next peak on another
    Delays(Delays),

    /// Run an analysis described by a YAML configuration file
    Run(Run),

    /// Write a synthetic pulse recording (WAV or CSV, from the extension)
    Simulate(Simulate),
}

#[derive(Debug, Args)]
struct Detection {
    /// Sampling rate in Hz; overrides the WAV header and is required for CSV
    #[clap(long)]
    sampling_rate: Option<f64>,

    /// Minimum separation between two peaks, in milliseconds
    #[clap(long, default_value = "100")]
    min_separation_ms: f64,
}

#[derive(Debug, Args)]
struct Intervals {
    /// Recording to analyze (.wav or .csv)
    source: PathBuf,

    #[clap(short, long, default_value = "0")]
    channel: usize,

    #[clap(short, long)]
    label: Option<String>,

    /// Detection threshold as a fraction of the channel's maximum amplitude
    #[clap(short, long, default_value = "0.5")]
    threshold: f64,

    /// Detect on the signed signal instead of its absolute value
    #[clap(long)]
    raw: bool,

    #[clap(flatten)]
    detection: Detection,

    #[clap(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct Delays {
    /// Recording to analyze (.wav or .csv)
    source: PathBuf,

    #[clap(long, default_value = "0")]
    source_channel: usize,

    #[clap(long, default_value = "1")]
    target_channel: usize,

    #[clap(long, default_value = "Arduino")]
    source_label: String,

    #[clap(long, default_value = "Photodiode")]
    target_label: String,

    #[clap(long, default_value = "0.5")]
    source_threshold: f64,

    #[clap(long, default_value = "0.8")]
    target_threshold: f64,

    /// Detect source peaks on the signed signal (TTL lines); pass `false` to rectify
    #[clap(long, default_value_t = true, action = clap::ArgAction::Set)]
    source_raw: bool,

    #[clap(long)]
    target_raw: bool,

    #[clap(flatten)]
    detection: Detection,

    #[clap(flatten)]
    output: OutputArgs,
}

#[derive(Debug, Args)]
struct OutputArgs {
    /// Directory receiving the figures
    #[clap(short, long, default_value = "figures")]
    output_dir: PathBuf,

    #[clap(long, default_value = "svg")]
    format: FileFormat,

    #[clap(long, default_value = "50")]
    bins: usize,

    #[clap(long, default_value = "30")]
    delay_bins: usize,

    /// Also plot each analyzed channel with its detected peaks
    #[clap(long)]
    trace: bool,

    /// Append the summaries to this CSV log
    #[clap(long)]
    summary_csv: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct Run {
    config: PathBuf,
}

#[derive(Debug, Args)]
struct Simulate {
    /// Output file, .wav or .csv
    output: PathBuf,

    #[clap(long, default_value = "10000")]
    sampling_rate: u32,

    #[clap(long = "pulses", default_value = "100")]
    pulse_count: usize,

    #[clap(long, default_value = "500")]
    period_ms: f64,

    #[clap(long, default_value = "10")]
    pulse_width_ms: f64,

    #[clap(long, default_value = "0")]
    jitter_ms: f64,

    #[clap(long, default_value = "20000")]
    amplitude: f64,

    #[clap(long, default_value = "200")]
    noise: f64,

    /// Add a response channel delayed by this many milliseconds
    #[clap(long)]
    delay_ms: Option<f64>,

    #[clap(long, default_value = "0")]
    delay_jitter_ms: f64,

    #[clap(long)]
    seed: Option<u64>,
}

impl OutputArgs {
    fn into_config(self) -> OutputConfig {
        OutputConfig {
            directory: self.output_dir,
            plot: PlotConfig {
                format: self.format,
                ..Default::default()
            },
            bins: self.bins,
            delay_bins: self.delay_bins,
            plot_trace: self.trace,
            summary_csv: self.summary_csv,
        }
    }
}

fn channel(index: usize, label: Option<String>, threshold: f64, raw: bool) -> ChannelConfig {
    ChannelConfig {
        index,
        label,
        threshold_fraction: Some(threshold),
        rectify: !raw,
    }
}

fn analysis_config(
    source: PathBuf,
    channels: ChannelSelector,
    detection: Detection,
    output: OutputArgs,
) -> AnalysisConfig {
    AnalysisConfig {
        sampling_rate: detection.sampling_rate,
        min_separation_ms: detection.min_separation_ms,
        output: output.into_config(),
        ..AnalysisConfig::new(source, channels)
    }
}

fn execute(mode: Mode) -> Result<()> {
    match mode {
        Mode::Intervals(args) => {
            let channels = ChannelSelector::Single {
                channel: channel(args.channel, args.label, args.threshold, args.raw),
            };
            process_file::run(analysis_config(args.source, channels, args.detection, args.output))?;
        }
        Mode::Delays(args) => {
            let channels = ChannelSelector::Pair {
                source: channel(
                    args.source_channel,
                    Some(args.source_label),
                    args.source_threshold,
                    args.source_raw,
                ),
                target: channel(
                    args.target_channel,
                    Some(args.target_label),
                    args.target_threshold,
                    args.target_raw,
                ),
            };
            process_file::run(analysis_config(args.source, channels, args.detection, args.output))?;
        }
        Mode::Run(args) => {
            process_file::run_from_file(&args.config)
                .with_context(|| format!("running {}", args.config.display()))?;
        }
        Mode::Simulate(args) => {
            let config = SimulationConfig {
                sampling_rate: args.sampling_rate,
                pulse_count: args.pulse_count,
                period_ms: args.period_ms,
                pulse_width_ms: args.pulse_width_ms,
                jitter_ms: args.jitter_ms,
                amplitude: args.amplitude,
                noise: args.noise,
                response_delay_ms: args.delay_ms,
                response_jitter_ms: args.delay_jitter_ms,
                seed: args.seed,
                ..Default::default()
            };
            let simulation = simulate_to_file(&config, &args.output)?;
            println!(
                "{} {} ({} channel(s), {} pulses)",
                "Recording saved:".green(),
                args.output.display(),
                simulation.signal.channel_count(),
                simulation.trigger_onsets.len()
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match execute(cli.mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("Error: {e:#}").red());
            ExitCode::FAILURE
        }
    }
}
