use super::{Histogram1D, Histogram2D, n_bins_for};
use crate::errors::Error;
use crate::fitting::{LineParameters, angle_to_slope};
use crate::mcmc::SampleTrace;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;

const CREDIBLE_MASS_95: f64 = 0.95;
const CREDIBLE_MASS_99: f64 = 0.99;

/// Most populated cell of the (bcost, theta) histogram
#[derive(Clone, Debug)]
pub struct ModeEstimate {
    /// Lower edge of the mode bin along bcost
    pub bcost: f64,
    /// Lower edge of the mode bin along theta
    pub theta: f64,
    /// Bin edges `[previous, mode, next]` along bcost
    pub bcost_edges: [f64; 3],
    /// Bin edges `[previous, mode, next]` along theta
    pub theta_edges: [f64; 3],
    pub slope: f64,
    pub intercept: f64,
}

pub struct PosteriorSummary {
    pub n_samples: usize,
    pub n_bins: usize,
    pub mode: ModeEstimate,
    /// Histogram of `sqrt(V)`
    pub scatter_histogram: Histogram1D,
    /// One-sided 95% upper bound on `sqrt(V)`
    pub scatter_bound_95: f64,
    /// One-sided 99% upper bound on `sqrt(V)`
    pub scatter_bound_99: f64,
    pub log_v_mean: f64,
    pub log_v_median: f64,
}

impl PosteriorSummary {
    /// Summarise the post burn-in part of the trace
    ///
    /// # Algorithm
    /// 1. 2D histogram over (bcost, theta) with `round(sqrt(n_samples) / 2)` bins per axis
    /// 2. Mode = most populated cell, converted to slope and intercept
    /// 3. Histogram of `sqrt(V) = exp(log_v / 2)`, and the left edges of the first bins
    ///    whose cumulative mass exceeds 0.95 and 0.99
    pub fn from_trace(trace: &SampleTrace) -> Result<Self, Error> {
        let samples: ArrayView2<f64> = trace.post_burn_in()?;
        let n_samples: usize = samples.nrows();
        let n_bins: usize = n_bins_for(n_samples);

        let bcost: ArrayView1<f64> = samples.column(0);
        let theta: ArrayView1<f64> = samples.column(1);
        let log_v: ArrayView1<f64> = samples.column(2);

        // Mode of the line parameters
        let histogram_line: Histogram2D = Histogram2D::new(bcost, theta, n_bins)?;
        let (i_bcost, i_theta): (usize, usize) = histogram_line.mode_index();
        let bcost_edges: [f64; 3] = [
            histogram_line.edges_x[i_bcost.saturating_sub(1)],
            histogram_line.edges_x[i_bcost],
            histogram_line.edges_x[i_bcost + 1],
        ];
        let theta_edges: [f64; 3] = [
            histogram_line.edges_y[i_theta.saturating_sub(1)],
            histogram_line.edges_y[i_theta],
            histogram_line.edges_y[i_theta + 1],
        ];
        let mode_bcost: f64 = bcost_edges[1];
        let mode_theta: f64 = theta_edges[1];
        let mode: ModeEstimate = ModeEstimate {
            bcost: mode_bcost,
            theta: mode_theta,
            bcost_edges,
            theta_edges,
            slope: angle_to_slope(mode_theta),
            intercept: mode_bcost / mode_theta.cos(),
        };

        // Intrinsic scatter
        let scatter: Array1<f64> = log_v.mapv(|log_v: f64| (0.5 * log_v).exp());
        let scatter_histogram: Histogram1D = Histogram1D::new(scatter.view(), n_bins)?;
        let last_edge: f64 = scatter_histogram.edges[scatter_histogram.n_bins()];
        let scatter_bound_95: f64 = scatter_histogram.first_edge_exceeding(CREDIBLE_MASS_95).unwrap_or(last_edge);
        let scatter_bound_99: f64 = scatter_histogram.first_edge_exceeding(CREDIBLE_MASS_99).unwrap_or(last_edge);

        let log_v_mean: f64 = log_v.sum() / n_samples as f64;
        let log_v_median: f64 = median(log_v);

        return Ok(PosteriorSummary {
            n_samples,
            n_bins,
            mode,
            scatter_histogram,
            scatter_bound_95,
            scatter_bound_99,
            log_v_mean,
            log_v_median,
        });
    }
}

/// Median, averaging the two middle values for an even count
fn median(values: ArrayView1<f64>) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a: &f64, b: &f64| a.total_cmp(b));

    let n_values: usize = sorted.len();
    if n_values % 2 == 1 {
        return sorted[n_values / 2];
    }
    return 0.5 * (sorted[n_values / 2 - 1] + sorted[n_values / 2]);
}

/// Pick `n_lines` posterior states uniformly at random, with replacement
pub fn random_posterior_lines<R: Rng>(samples: ArrayView2<f64>, n_lines: usize, rng: &mut R) -> Vec<LineParameters> {
    let n_samples: usize = samples.nrows();
    if n_samples == 0 {
        return Vec::new();
    }

    let mut lines: Vec<LineParameters> = Vec::with_capacity(n_lines);
    for _ in 0..n_lines {
        let i_sample: usize = rng.random_range(0..n_samples);
        lines.push(LineParameters::from_array(samples.row(i_sample)));
    }
    return lines;
}

#[test]
fn test_median() {
    assert_eq!(median(Array1::from_vec(vec![3.0, 1.0, 2.0]).view()), 2.0);
    assert_eq!(median(Array1::from_vec(vec![4.0, 1.0, 3.0, 2.0]).view()), 2.5);
}

#[test]
fn test_summary_from_hand_built_trace() {
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    // 2 burn-in rows (initial + 1 iteration), then 16 samples => 2 bins per axis
    let n_burn: usize = 1;
    let mut samples: Array2<f64> = Array2::zeros((18, 3));
    // Burn-in rows are far away and must not affect the summary
    samples.row_mut(0).assign(&Array1::from_vec(vec![1000.0, 3.0, 50.0]));
    samples.row_mut(1).assign(&Array1::from_vec(vec![-1000.0, -3.0, 50.0]));
    for i_row in 2..18 {
        let in_mode: bool = i_row < 13; // 11 of 16 samples in the low corner
        let bcost: f64 = if in_mode { 10.0 } else { 20.0 };
        let theta: f64 = if in_mode { 0.5 } else { 0.7 };
        let log_v: f64 = 2.0 * (0.1 * i_row as f64).ln(); // sqrt(V) = 0.1 * i_row
        samples.row_mut(i_row).assign(&Array1::from_vec(vec![bcost, theta, log_v]));
    }
    let trace: SampleTrace = SampleTrace { samples, n_burn };

    let summary: PosteriorSummary = PosteriorSummary::from_trace(&trace).unwrap();
    assert_eq!(summary.n_samples, 16);
    assert_eq!(summary.n_bins, 2);

    assert_eq!(summary.mode.bcost, 10.0);
    assert_eq!(summary.mode.theta, 0.5);
    assert_eq!(summary.mode.bcost_edges, [10.0, 10.0, 15.0]);
    assert_abs_diff_eq!(summary.mode.slope, 0.5_f64.tan(), epsilon = 1e-12);
    assert_abs_diff_eq!(summary.mode.intercept, 10.0 / 0.5_f64.cos(), epsilon = 1e-12);

    // sqrt(V) runs 0.2 ..= 1.7 evenly, two bins of 8; only the last bin pushes the mass past 0.95
    assert_eq!(summary.scatter_histogram.counts.to_vec(), vec![8, 8]);
    assert_abs_diff_eq!(summary.scatter_bound_95, 0.95, epsilon = 1e-12);
    assert!(summary.scatter_bound_95 <= summary.scatter_bound_99);

    let expected_mean: f64 = (2..18).map(|i_row: usize| 2.0 * (0.1 * i_row as f64).ln()).sum::<f64>() / 16.0;
    assert_abs_diff_eq!(summary.log_v_mean, expected_mean, epsilon = 1e-12);
    assert_abs_diff_eq!(summary.log_v_median, (2.0 * 0.9_f64.ln() + 2.0 * 1.0_f64.ln()) / 2.0, epsilon = 1e-12);
}

#[test]
fn test_summary_needs_samples() {
    use ndarray::Array2;

    let trace: SampleTrace = SampleTrace {
        samples: Array2::zeros((5, 3)),
        n_burn: 4,
    };
    assert!(matches!(PosteriorSummary::from_trace(&trace), Err(Error::EmptyTrace { n_rows: 5, n_burn: 4 })));
}

#[test]
fn test_random_posterior_lines() {
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    let samples: Array2<f64> = Array2::from_shape_fn((10, 3), |(i_row, i_column)| (i_row * 3 + i_column) as f64);
    let mut rng: StdRng = StdRng::seed_from_u64(3);
    let lines: Vec<LineParameters> = random_posterior_lines(samples.view(), 25, &mut rng);

    assert_eq!(lines.len(), 25);
    for line in lines.iter() {
        // Every draw is one of the rows, columns intact
        assert_eq!(line.theta, line.bcost + 1.0);
        assert_eq!(line.log_v, line.bcost + 2.0);
        assert!(line.bcost >= 0.0 && line.bcost <= 27.0);
    }
}
