use serde::{Deserialize, Serialize};

use crate::metrics::absorption::{AbsorptionResult, WindowEnvelope};
use crate::metrics::regression::LinearFit;
use crate::signal::PpgRecording;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: f32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Scatter(ScatterSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    let mut result = Vec::with_capacity(max_points);
    for i in 0..max_points {
        let start = (i as f64 * bucket_size).floor() as usize;
        if start >= points.len() {
            break;
        }
        result.push(points[start]);
    }
    result
}

const RED_COLOR: u32 = 0xCC3344;
const IR_COLOR: u32 = 0x3355CC;
const REFERENCE_COLOR: u32 = 0x33AA66;
const TREND_COLOR: u32 = 0x777777;

/// Both raw channels as point clouds plus per-window min/max envelope steps,
/// time axis in seconds.
pub fn figure_from_recording(
    rec: &PpgRecording,
    envelopes: &[WindowEnvelope],
    max_points: usize,
) -> Figure {
    let mut fig = Figure::new(Some("Absorption values over time".into()));
    fig.x.label = Some("Time (s)".into());
    fig.y.label = Some("Sensor reading".into());

    let dt = 1.0 / rec.fs.max(1.0);
    for (name, data, color) in [
        ("Red LED", &rec.red, RED_COLOR),
        ("IR LED", &rec.ir, IR_COLOR),
    ] {
        let points: Vec<[f64; 2]> = data
            .iter()
            .enumerate()
            .map(|(i, value)| [i as f64 * dt, *value])
            .collect();
        fig.add_series(Series::Scatter(ScatterSeries {
            name: name.into(),
            points: decimate_points(&points, max_points),
            radius: 2.0,
            color: Color(color),
        }));
    }

    for (name, bound, color) in [
        ("Red min", Bound::RedMin, RED_COLOR),
        ("Red max", Bound::RedMax, RED_COLOR),
        ("IR min", Bound::IrMin, IR_COLOR),
        ("IR max", Bound::IrMax, IR_COLOR),
    ] {
        fig.add_series(Series::Line(LineSeries {
            name: name.into(),
            points: envelope_steps(envelopes, bound, dt),
            style: Style {
                width: 1.0,
                dash: Some([4.0, 4.0]),
                color: Color(color),
            },
        }));
    }
    fig
}

#[derive(Clone, Copy)]
enum Bound {
    RedMin,
    RedMax,
    IrMin,
    IrMax,
}

fn envelope_steps(envelopes: &[WindowEnvelope], bound: Bound, dt: f64) -> Vec<[f64; 2]> {
    let mut points = Vec::with_capacity(envelopes.len() * 2);
    for envelope in envelopes {
        let value = match bound {
            Bound::RedMin => envelope.red_min,
            Bound::RedMax => envelope.red_max,
            Bound::IrMin => envelope.ir_min,
            Bound::IrMax => envelope.ir_max,
        };
        let t0 = envelope.start as f64 * dt;
        let t1 = (envelope.start + envelope.samples) as f64 * dt;
        points.push([t0, value]);
        points.push([t1, value]);
    }
    points
}

/// AR per window, with an optional reference-SpO2/10 overlay and the trend
/// line evaluated at each window position.
pub fn figure_from_absorption(
    result: &AbsorptionResult,
    window_s: f64,
    reference: Option<&[f64]>,
    fit: Option<&LinearFit>,
) -> Figure {
    let title = if reference.is_some() {
        "Reference SpO2 and measured absorption ratio"
    } else {
        "Absorption ratio per window"
    };
    let mut fig = Figure::new(Some(title.into()));
    fig.x.label = Some("Time (s)".into());
    fig.y.label = Some("Absorption ratio".into());

    let ar_points: Vec<[f64; 2]> = result
        .windows
        .iter()
        .map(|w| [w.index as f64 * window_s, w.ar])
        .collect();
    fig.add_series(Series::Scatter(ScatterSeries {
        name: "Measured AR".into(),
        points: ar_points,
        radius: 3.0,
        color: Color(IR_COLOR),
    }));

    if let Some(reference) = reference {
        let points: Vec<[f64; 2]> = reference
            .iter()
            .take(result.window_count)
            .enumerate()
            .map(|(i, value)| [i as f64 * window_s, value / 10.0])
            .collect();
        fig.add_series(Series::Scatter(ScatterSeries {
            name: "Reference SpO2 / 10".into(),
            points,
            radius: 3.0,
            color: Color(REFERENCE_COLOR),
        }));
    }

    if let Some(fit) = fit {
        let points: Vec<[f64; 2]> = result
            .windows
            .iter()
            .map(|w| [w.index as f64 * window_s, fit.predict(w.index as f64)])
            .collect();
        fig.add_series(Series::Line(LineSeries {
            name: "Trend".into(),
            points,
            style: Style {
                width: 1.5,
                dash: None,
                color: Color(TREND_COLOR),
            },
        }));
    }
    fig
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::absorption::{compute_absorption, DegeneratePolicy};
    use crate::metrics::regression::ar_trend;

    fn sample_result() -> AbsorptionResult {
        let red = vec![10.0, 12.0, 14.0, 12.0, 11.0, 13.0, 15.0, 13.0];
        let ir = vec![8.0, 9.0, 10.0, 9.0, 9.0, 10.0, 11.0, 10.0];
        compute_absorption(&red, &ir, 4, DegeneratePolicy::Skip).unwrap()
    }

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..1000).map(|i| [i as f64, 0.0]).collect();
        assert_eq!(decimate_points(&points, 100).len(), 100);
        assert_eq!(decimate_points(&points, 2000).len(), 1000);
    }

    #[test]
    fn recording_figure_has_channels_and_envelopes() {
        let rec = PpgRecording {
            fs: 4.0,
            red: vec![10.0, 12.0, 14.0, 12.0, 11.0, 13.0, 15.0, 13.0],
            ir: vec![8.0, 9.0, 10.0, 9.0, 9.0, 10.0, 11.0, 10.0],
        };
        let result = sample_result();
        let fig = figure_from_recording(&rec, &result.envelopes, 1024);
        // two scatter channels + four envelope bound lines
        assert_eq!(fig.series.len(), 6);
        let steps = match &fig.series[2] {
            Series::Line(line) => &line.points,
            other => panic!("expected envelope line, got {other:?}"),
        };
        // two points per window
        assert_eq!(steps.len(), 2 * result.envelopes.len());
    }

    #[test]
    fn absorption_figure_layers_reference_and_trend() {
        let result = sample_result();
        let reference = vec![98.0, 97.0, 96.0];
        let fit = ar_trend(&result).unwrap();
        let fig = figure_from_absorption(&result, 1.0, Some(&reference), Some(&fit));
        assert_eq!(fig.series.len(), 3);
        match &fig.series[1] {
            Series::Scatter(scatter) => {
                // reference truncated to the window count and scaled down
                assert_eq!(scatter.points.len(), result.window_count);
                assert!((scatter.points[0][1] - 9.8).abs() < 1e-12);
            }
            other => panic!("expected reference scatter, got {other:?}"),
        }
    }
}
