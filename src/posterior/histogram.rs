use crate::errors::Error;
use ndarray::{Array1, Array2, ArrayView1};
use ndarray_stats::QuantileExt;
use ndarray_stats::errors::MinMaxError;

/// Number of histogram bins for `n_samples` draws, `round(sqrt(n_samples) / 2)`
pub fn n_bins_for(n_samples: usize) -> usize {
    let n_bins: f64 = ((n_samples as f64).sqrt() / 2.0).round();
    return (n_bins as usize).max(1);
}

/// Equal width bin edges spanning the data, length=n_bins+1
///
/// Constant data gets a unit wide range centred on the value
fn bin_edges(values: &ArrayView1<f64>, n_bins: usize) -> Result<Array1<f64>, Error> {
    let value_min: f64 = *values.min().map_err(min_max_error)?;
    let value_max: f64 = *values.max().map_err(min_max_error)?;

    let (range_min, range_max): (f64, f64) = if value_min == value_max {
        (value_min - 0.5, value_max + 0.5)
    } else {
        (value_min, value_max)
    };

    return Ok(Array1::linspace(range_min, range_max, n_bins + 1));
}

fn min_max_error(error: MinMaxError) -> Error {
    return match error {
        MinMaxError::EmptyInput => Error::EmptyTrace { n_rows: 0, n_burn: 0 },
        MinMaxError::UndefinedOrder => Error::UndefinedOrder,
    };
}

/// Bin holding `value`; bins are half open except the last, which includes the right edge
fn bin_index(value: f64, edges: &Array1<f64>) -> usize {
    let n_bins: usize = edges.len() - 1;
    let range_min: f64 = edges[0];
    let range_max: f64 = edges[n_bins];

    let estimate: f64 = ((value - range_min) / (range_max - range_min) * n_bins as f64).floor();
    let mut i_bin: usize = (estimate.max(0.0) as usize).min(n_bins - 1);

    // Rounding in the estimate can land one bin off near an edge
    while i_bin > 0 && value < edges[i_bin] {
        i_bin -= 1;
    }
    while i_bin < n_bins - 1 && value >= edges[i_bin + 1] {
        i_bin += 1;
    }

    return i_bin;
}

pub struct Histogram1D {
    pub edges: Array1<f64>,
    pub counts: Array1<usize>,
}

impl Histogram1D {
    pub fn new(values: ArrayView1<f64>, n_bins: usize) -> Result<Self, Error> {
        let edges: Array1<f64> = bin_edges(&values, n_bins)?;

        let mut counts: Array1<usize> = Array1::zeros(n_bins);
        for value in values.iter() {
            counts[bin_index(*value, &edges)] += 1;
        }

        return Ok(Histogram1D { edges, counts });
    }

    pub fn n_bins(&self) -> usize {
        return self.counts.len();
    }

    pub fn bin_width(&self) -> f64 {
        return self.edges[1] - self.edges[0];
    }

    /// Probability density in each bin; integrates to one
    pub fn density(&self) -> Array1<f64> {
        let total: f64 = self.counts.sum() as f64;
        let bin_width: f64 = self.bin_width();
        return self.counts.mapv(|count: usize| count as f64 / (total * bin_width));
    }

    /// Fraction of the samples in this bin and all bins to its left
    pub fn cumulative_mass(&self) -> Array1<f64> {
        let total: f64 = self.counts.sum() as f64;
        let mut cumulative_mass: Array1<f64> = Array1::zeros(self.n_bins());
        let mut running_count: usize = 0;
        for i_bin in 0..self.n_bins() {
            running_count += self.counts[i_bin];
            cumulative_mass[i_bin] = running_count as f64 / total;
        }
        return cumulative_mass;
    }

    /// Left edge of the first bin whose cumulative mass exceeds `mass`
    pub fn first_edge_exceeding(&self, mass: f64) -> Option<f64> {
        let cumulative_mass: Array1<f64> = self.cumulative_mass();
        for i_bin in 0..self.n_bins() {
            if cumulative_mass[i_bin] > mass {
                return Some(self.edges[i_bin]);
            }
        }
        return None;
    }
}

pub struct Histogram2D {
    pub edges_x: Array1<f64>,
    pub edges_y: Array1<f64>,
    /// shape=(n_bins, n_bins), indexed `[[i_x, i_y]]`
    pub counts: Array2<usize>,
}

impl Histogram2D {
    pub fn new(x: ArrayView1<f64>, y: ArrayView1<f64>, n_bins: usize) -> Result<Self, Error> {
        let edges_x: Array1<f64> = bin_edges(&x, n_bins)?;
        let edges_y: Array1<f64> = bin_edges(&y, n_bins)?;

        let mut counts: Array2<usize> = Array2::zeros((n_bins, n_bins));
        for (x_value, y_value) in x.iter().zip(y.iter()) {
            counts[[bin_index(*x_value, &edges_x), bin_index(*y_value, &edges_y)]] += 1;
        }

        return Ok(Histogram2D { edges_x, edges_y, counts });
    }

    /// Indices of the most populated cell, first in row-major order on ties
    pub fn mode_index(&self) -> (usize, usize) {
        return self.counts.argmax().expect("Histogram2D.mode_index: counts are never empty");
    }
}

#[test]
fn test_n_bins_for() {
    assert_eq!(n_bins_for(200000), 224);
    assert_eq!(n_bins_for(20000), 71);
    assert_eq!(n_bins_for(1), 1);
    assert_eq!(n_bins_for(0), 1);
}

#[test]
fn test_histogram_1d_matches_numpy_binning() {
    use approx::assert_abs_diff_eq;

    // numpy.histogram([0, 1, 1, 2, 3, 4], bins=4) -> counts [1, 2, 1, 2], edges [0, 1, 2, 3, 4]
    let values: Array1<f64> = Array1::from_vec(vec![0.0, 1.0, 1.0, 2.0, 3.0, 4.0]);
    let histogram: Histogram1D = Histogram1D::new(values.view(), 4).unwrap();

    assert_eq!(histogram.counts.to_vec(), vec![1, 2, 1, 2]);
    assert_abs_diff_eq!(histogram.edges, Array1::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0]), epsilon = 1e-12);
    assert_abs_diff_eq!(histogram.density().sum() * histogram.bin_width(), 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(histogram.cumulative_mass()[3], 1.0, epsilon = 1e-12);

    // Cumulative mass is [1/6, 3/6, 4/6, 1]
    assert_eq!(histogram.first_edge_exceeding(0.5), Some(2.0));
    assert_eq!(histogram.first_edge_exceeding(0.95), Some(3.0));
    assert_eq!(histogram.first_edge_exceeding(1.0), None);
}

#[test]
fn test_histogram_constant_and_nan() {
    let constant: Array1<f64> = Array1::from_elem(5, 2.0);
    let histogram: Histogram1D = Histogram1D::new(constant.view(), 3).unwrap();
    assert_eq!(histogram.edges[0], 1.5);
    assert_eq!(histogram.edges[3], 2.5);
    assert_eq!(histogram.counts.to_vec(), vec![0, 5, 0]);

    let with_nan: Array1<f64> = Array1::from_vec(vec![1.0, f64::NAN]);
    assert!(matches!(Histogram1D::new(with_nan.view(), 3), Err(Error::UndefinedOrder)));
}

#[test]
fn test_histogram_2d_joint_mode() {
    // Row 2 holds the largest cell; column 1 holds the largest cell
    let x: Array1<f64> = Array1::from_vec(vec![0.0, 0.0, 2.5, 2.5, 2.5, 1.5, 3.0]);
    let y: Array1<f64> = Array1::from_vec(vec![0.0, 0.0, 1.5, 1.5, 1.5, 3.0, 3.0]);
    let histogram: Histogram2D = Histogram2D::new(x.view(), y.view(), 3).unwrap();

    assert_eq!(histogram.counts.sum(), 7);
    assert_eq!(histogram.counts[[0, 0]], 2);
    assert_eq!(histogram.counts[[2, 1]], 3);
    assert_eq!(histogram.mode_index(), (2, 1));

    // Same cell as the argmax of the row maxima and of the column maxima
    let row_max: Vec<usize> = histogram.counts.rows().into_iter().map(|row| *row.max().unwrap()).collect();
    let column_max: Vec<usize> = histogram.counts.columns().into_iter().map(|column| *column.max().unwrap()).collect();
    assert_eq!(Array1::from_vec(row_max).argmax().unwrap(), 2);
    assert_eq!(Array1::from_vec(column_max).argmax().unwrap(), 1);
}
