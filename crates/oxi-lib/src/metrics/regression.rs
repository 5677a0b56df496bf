use crate::metrics::absorption::AbsorptionResult;
use serde::{Deserialize, Serialize};

/// Ordinary least-squares line with its coefficient of determination
/// against the points it was fitted on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub fn fit_line(points: &[[f64; 2]]) -> LinearFit {
    let n = points.len();
    if n < 2 {
        let intercept = points.first().map(|p| p[1]).unwrap_or(0.0);
        return LinearFit {
            slope: 0.0,
            intercept,
            r2: 1.0,
        };
    }
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_xy = 0.0;
    for &[x, y] in points {
        sum_x += x;
        sum_y += y;
        sum_xx += x * x;
        sum_xy += x * y;
    }
    let n_f = n as f64;
    let denom = n_f * sum_xx - sum_x * sum_x;
    let (slope, intercept) = if denom.abs() < f64::EPSILON {
        (0.0, sum_y / n_f)
    } else {
        let slope = (n_f * sum_xy - sum_x * sum_y) / denom;
        (slope, (sum_y - slope * sum_x) / n_f)
    };

    let mean_y = sum_y / n_f;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for &[x, y] in points {
        let predicted = slope * x + intercept;
        ss_res += (y - predicted) * (y - predicted);
        ss_tot += (y - mean_y) * (y - mean_y);
    }
    let r2 = if ss_tot.abs() < f64::EPSILON {
        if ss_res.abs() < f64::EPSILON {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    LinearFit {
        slope,
        intercept,
        r2,
    }
}

/// Fit a trend line to the surviving window ARs over their window indices.
pub fn ar_trend(result: &AbsorptionResult) -> Option<LinearFit> {
    if result.windows.is_empty() {
        return None;
    }
    let points: Vec<[f64; 2]> = result
        .windows
        .iter()
        .map(|w| [w.index as f64, w.ar])
        .collect();
    Some(fit_line(&points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::absorption::{compute_absorption, DegeneratePolicy};

    #[test]
    fn exact_line_is_recovered() {
        let points: Vec<[f64; 2]> = (0..10).map(|i| [i as f64, 3.0 + 0.5 * i as f64]).collect();
        let fit = fit_line(&points);
        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
        assert!((fit.r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_ordinate_gives_flat_perfect_fit() {
        let points: Vec<[f64; 2]> = (0..5).map(|i| [i as f64, 2.0]).collect();
        let fit = fit_line(&points);
        assert!(fit.slope.abs() < 1e-12);
        assert!((fit.intercept - 2.0).abs() < 1e-12);
        assert!((fit.r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_abscissa_falls_back_to_mean() {
        let points = [[1.0, 2.0], [1.0, 4.0]];
        let fit = fit_line(&points);
        assert!(fit.slope.abs() < 1e-12);
        assert!((fit.intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn trend_over_absorption_windows() {
        let red = vec![10.0, 12.0, 14.0, 12.0, 11.0, 13.0, 15.0, 13.0];
        let ir = vec![8.0, 9.0, 10.0, 9.0, 9.0, 10.0, 11.0, 10.0];
        let result = compute_absorption(&red, &ir, 4, DegeneratePolicy::Skip).unwrap();
        let fit = ar_trend(&result).expect("two windows to fit");
        // ARs are 1.6 and 18/11, so the trend rises by their difference.
        assert!((fit.slope - (18.0 / 11.0 - 1.6)).abs() < 1e-9);
        assert!((fit.predict(0.0) - 1.6).abs() < 1e-9);
    }

    #[test]
    fn no_surviving_windows_means_no_trend() {
        let red = vec![10.0; 8];
        let ir = vec![5.0; 8];
        let result = compute_absorption(&red, &ir, 4, DegeneratePolicy::Skip).unwrap();
        assert!(ar_trend(&result).is_none());
    }
}
