use super::LineParameters;
use crate::data::ObservationSet;
use crate::errors::Error;
use log::debug;
use ndarray::{Array1, Array2, Axis, s};
use ndarray_linalg::Inverse; // Import the Inverse trait

/// Result of the closed-form chi-squared fit
#[derive(Clone, Debug)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Covariance of `[intercept, slope]`, shape=(2, 2)
    pub covariance: Array2<f64>,
}

impl LinearFit {
    /// Starting point for the sampler: this line with unit intrinsic variance (`log_v = 0`)
    pub fn initial_guess(&self) -> LineParameters {
        return LineParameters::from_slope_intercept(self.slope, self.intercept, 0.0);
    }
}

/// Weighted least-squares line through the data, using only the y uncertainties
///
/// ```text
/// beta       = (A^T C^-1 A)^-1 A^T C^-1 Y
/// cov(beta)  = (A^T C^-1 A)^-1
/// ```
/// with design matrix `A = [1, X]` and diagonal `C = diag(sigma_y^2)`.
///
/// # Returns
/// * `Err(Error::NonPositiveUncertainty)` if any `sigma_y <= 0`
/// * `Err(Error::SingularMatrix)` if the normal matrix can't be inverted, e.g. all x identical
pub fn weighted_least_squares(observations: &ObservationSet) -> Result<LinearFit, Error> {
    let n_points: usize = observations.n_points();

    for i_point in 0..n_points {
        let sigma_y: f64 = observations.y_err[i_point];
        if !(sigma_y > 0.0) {
            return Err(Error::NonPositiveUncertainty {
                id: observations.ids[i_point],
                sigma_y,
            });
        }
    }

    // Design matrix
    let mut a_matrix: Array2<f64> = Array2::ones((n_points, 2));
    a_matrix.slice_mut(s![.., 1]).assign(&observations.x());

    // C is diagonal, so C^-1 A is a row scaling
    let c_inverse: Array1<f64> = observations.y_err.mapv(|sigma: f64| 1.0 / sigma.powi(2));
    let c_inverse_a: Array2<f64> = &a_matrix * &c_inverse.view().insert_axis(Axis(1));

    let normal_matrix: Array2<f64> = a_matrix.t().dot(&c_inverse_a);

    // A vanishing determinant means all x coincide
    let determinant: f64 = normal_matrix[[0, 0]] * normal_matrix[[1, 1]] - normal_matrix[[0, 1]] * normal_matrix[[1, 0]];
    let determinant_scale: f64 = (normal_matrix[[0, 0]] * normal_matrix[[1, 1]]).abs() + (normal_matrix[[0, 1]] * normal_matrix[[1, 0]]).abs();
    if !(determinant.abs() > 1e-12 * determinant_scale) {
        return Err(Error::SingularMatrix);
    }

    let covariance: Array2<f64> = normal_matrix.inv().map_err(|_| Error::SingularMatrix)?;
    if covariance.iter().any(|value: &f64| !value.is_finite()) {
        return Err(Error::SingularMatrix);
    }

    let beta: Array1<f64> = covariance.dot(&c_inverse_a.t().dot(&observations.y()));
    debug!("weighted_least_squares: intercept={}, slope={}", beta[0], beta[1]);

    return Ok(LinearFit {
        intercept: beta[0],
        slope: beta[1],
        covariance,
    });
}

#[test]
fn test_weighted_least_squares_reduces_to_ols() {
    // Equal isotropic errors => ordinary least squares
    use crate::data::Observation;
    use approx::assert_abs_diff_eq;

    let x: Vec<f64> = vec![1.0, 2.0, 4.0, 5.0, 7.0, 8.0];
    let y: Vec<f64> = vec![3.1, 4.8, 9.2, 11.1, 14.8, 17.3];
    let sigma: f64 = 0.7;
    let observations: Vec<Observation> = (0..x.len())
        .map(|i: usize| Observation {
            id: i as i64,
            x: x[i],
            y: y[i],
            sigma_y: sigma,
            sigma_x: sigma,
            rho_xy: 0.0,
        })
        .collect();
    let observation_set: ObservationSet = ObservationSet::new(&observations, &[]).unwrap();

    let fit: LinearFit = weighted_least_squares(&observation_set).unwrap();

    // Textbook OLS
    let n: f64 = x.len() as f64;
    let x_mean: f64 = x.iter().sum::<f64>() / n;
    let y_mean: f64 = y.iter().sum::<f64>() / n;
    let s_xy: f64 = (0..x.len()).map(|i: usize| (x[i] - x_mean) * (y[i] - y_mean)).sum();
    let s_xx: f64 = x.iter().map(|x_i: &f64| (x_i - x_mean).powi(2)).sum();
    let slope_ols: f64 = s_xy / s_xx;
    let intercept_ols: f64 = y_mean - slope_ols * x_mean;

    assert_abs_diff_eq!(fit.slope, slope_ols, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.intercept, intercept_ols, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.covariance[[1, 1]], sigma.powi(2) / s_xx, epsilon = 1e-12);

    let initial_guess: LineParameters = fit.initial_guess();
    assert_abs_diff_eq!(initial_guess.slope(), slope_ols, epsilon = 1e-10);
    assert_abs_diff_eq!(initial_guess.intercept(), intercept_ols, epsilon = 1e-9);
    assert_eq!(initial_guess.log_v, 0.0);
}

#[test]
fn test_weighted_least_squares_errors() {
    use crate::data::Observation;

    let make = |id: i64, x: f64, sigma_y: f64| Observation {
        id,
        x,
        y: 2.0 * x,
        sigma_y,
        sigma_x: 1.0,
        rho_xy: 0.0,
    };

    let zero_sigma: ObservationSet = ObservationSet::new(&[make(1, 1.0, 1.0), make(2, 2.0, 0.0)], &[]).unwrap();
    assert!(matches!(
        weighted_least_squares(&zero_sigma),
        Err(Error::NonPositiveUncertainty { id: 2, .. })
    ));

    let same_x: ObservationSet = ObservationSet::new(&[make(1, 3.0, 1.0), make(2, 3.0, 1.0)], &[]).unwrap();
    assert!(matches!(weighted_least_squares(&same_x), Err(Error::SingularMatrix)));
}
