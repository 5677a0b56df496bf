use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use oxi_lib::{
    io::{reference as reference_io, sensor as sensor_io},
    metrics::{
        absorption::{compute_absorption, AbsorptionResult, DegeneratePolicy},
        regression::ar_trend,
    },
    plot::{figure_from_absorption, figure_from_recording, Figure, Series},
    signal::PpgRecording,
    synth::{synthesize, SynthConfig},
};
use plotters::prelude::*;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "oxi",
    version,
    about = "OXI: pulse-oximetry absorption-ratio tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum DegenerateMode {
    /// Drop degenerate windows from the AR sequence and the mean
    Skip,
    /// Abort on the first degenerate window
    Fail,
}

impl DegenerateMode {
    fn policy(&self) -> DegeneratePolicy {
        match self {
            DegenerateMode::Skip => DegeneratePolicy::Skip,
            DegenerateMode::Fail => DegeneratePolicy::Fail,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compute per-window absorption ratios from a red,ir sensor log
    Ar {
        #[arg(long, default_value_t = 10.0)]
        fs: f64,
        /// Analysis window length in seconds; keep >= 60 / minimum expected BPM
        #[arg(long, default_value_t = 1.0)]
        window_s: f64,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value = "skip")]
        on_degenerate: DegenerateMode,
    },
    /// Fit a linear trend to the AR sequence
    ArTrend {
        #[arg(long, default_value_t = 10.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        window_s: f64,
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Render both channels with per-window min/max envelopes to a PNG
    PlotSignal {
        #[arg(long, default_value_t = 10.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        window_s: f64,
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Render the AR sequence, optional reference overlay, and trend to a PNG
    PlotAr {
        #[arg(long, default_value_t = 10.0)]
        fs: f64,
        #[arg(long, default_value_t = 1.0)]
        window_s: f64,
        #[arg(long)]
        input: Option<PathBuf>,
        /// Single-column reference SpO2 trace, one value per window
        #[arg(long)]
        reference: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a synthetic two-channel sensor log
    Simulate {
        #[arg(long, default_value_t = 10.0)]
        fs: f64,
        #[arg(long, default_value_t = 30.0)]
        duration_s: f64,
        #[arg(long, default_value_t = 72.0)]
        bpm: f64,
        #[arg(long, default_value_t = 2.0)]
        noise: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Ar {
            fs,
            window_s,
            input,
            on_degenerate,
        } => cmd_ar(fs, window_s, input.as_deref(), on_degenerate)?,
        Commands::ArTrend {
            fs,
            window_s,
            input,
        } => cmd_ar_trend(fs, window_s, input.as_deref())?,
        Commands::PlotSignal {
            fs,
            window_s,
            input,
            out,
        } => cmd_plot_signal(fs, window_s, input.as_deref(), &out)?,
        Commands::PlotAr {
            fs,
            window_s,
            input,
            reference,
            out,
        } => cmd_plot_ar(fs, window_s, input.as_deref(), reference.as_deref(), &out)?,
        Commands::Simulate {
            fs,
            duration_s,
            bpm,
            noise,
            seed,
            out,
        } => cmd_simulate(fs, duration_s, bpm, noise, seed, &out)?,
    }
    Ok(())
}

fn load_recording(fs: f64, input: Option<&Path>) -> Result<PpgRecording> {
    match input {
        Some(path) => sensor_io::read_sensor_log(path, fs),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            let (red, ir) = sensor_io::parse_sensor_log(&buf)?;
            Ok(PpgRecording { fs, red, ir })
        }
    }
}

fn windowed_absorption(
    rec: &PpgRecording,
    window_s: f64,
    policy: DegeneratePolicy,
) -> Result<AbsorptionResult> {
    let window = rec.window_samples(window_s);
    Ok(compute_absorption(&rec.red, &rec.ir, window, policy)?)
}

fn cmd_ar(fs: f64, window_s: f64, input: Option<&Path>, mode: DegenerateMode) -> Result<()> {
    let rec = load_recording(fs, input)?;
    let result = windowed_absorption(&rec, window_s, mode.policy())?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}

fn cmd_ar_trend(fs: f64, window_s: f64, input: Option<&Path>) -> Result<()> {
    let rec = load_recording(fs, input)?;
    let result = windowed_absorption(&rec, window_s, DegeneratePolicy::Skip)?;
    let Some(fit) = ar_trend(&result) else {
        bail!("every window was degenerate; no AR sequence to fit");
    };
    println!("{}", serde_json::to_string(&fit)?);
    Ok(())
}

fn cmd_plot_signal(fs: f64, window_s: f64, input: Option<&Path>, out: &Path) -> Result<()> {
    let rec = load_recording(fs, input)?;
    let result = windowed_absorption(&rec, window_s, DegeneratePolicy::Skip)?;
    let fig = figure_from_recording(&rec, &result.envelopes, 4096);
    draw_plotters_figure(out, &fig)
}

fn cmd_plot_ar(
    fs: f64,
    window_s: f64,
    input: Option<&Path>,
    reference: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let rec = load_recording(fs, input)?;
    let result = windowed_absorption(&rec, window_s, DegeneratePolicy::Skip)?;
    let reference = reference
        .map(reference_io::read_reference_trace)
        .transpose()?;
    let fit = ar_trend(&result);
    let fig = figure_from_absorption(&result, window_s, reference.as_deref(), fit.as_ref());
    draw_plotters_figure(out, &fig)
}

fn cmd_simulate(
    fs: f64,
    duration_s: f64,
    bpm: f64,
    noise: f64,
    seed: u64,
    out: &Path,
) -> Result<()> {
    let cfg = SynthConfig {
        fs,
        duration_s,
        bpm,
        noise,
        seed,
        ..SynthConfig::default()
    };
    let rec = synthesize(&cfg);
    sensor_io::write_sensor_log(out, &rec)
}

fn draw_plotters_figure(path: &Path, fig: &Figure) -> Result<()> {
    let backend = BitMapBackend::new(path, (800, 480));
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    let points = |series: &Series| -> Vec<[f64; 2]> {
        match series {
            Series::Line(line) => line.points.clone(),
            Series::Scatter(scatter) => scatter.points.clone(),
        }
    };
    let x_values: Vec<f64> = fig
        .series
        .iter()
        .flat_map(|s| points(s).iter().map(|p| p[0]).collect::<Vec<_>>())
        .collect();
    let y_values: Vec<f64> = fig
        .series
        .iter()
        .flat_map(|s| points(s).iter().map(|p| p[1]).collect::<Vec<_>>())
        .collect();
    let x_min = x_values.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let x_max = x_values.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(1.0);
    let y_min = y_values.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let y_max = y_values.iter().copied().fold(f64::NEG_INFINITY, f64::max).max(1.0);
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 24),
        )
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    let mut mesh = chart.configure_mesh();
    if let Some(label) = &fig.x.label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &fig.y.label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw()?;
    for series in &fig.series {
        match series {
            Series::Line(line) => {
                chart.draw_series(LineSeries::new(
                    line.points.iter().map(|p| (p[0], p[1])),
                    &rgb(line.style.color.0),
                ))?;
            }
            Series::Scatter(scatter) => {
                let color = rgb(scatter.color.0);
                chart.draw_series(scatter.points.iter().map(|p| {
                    Circle::new((p[0], p[1]), scatter.radius as i32, color.filled())
                }))?;
            }
        }
    }
    root.present()?;
    Ok(())
}

fn rgb(color: u32) -> RGBColor {
    RGBColor(
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
    )
}
