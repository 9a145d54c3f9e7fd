use crate::data::ObservationSet;
use crate::fitting::LineParameters;
use ndarray::{Array1, Array2, Array3};

/// Anything the Metropolis sampler can explore
pub trait LogPosterior {
    /// Log posterior, up to an additive constant
    fn log_posterior(&self, parameters: &LineParameters) -> f64;
}

/// Straight line with intrinsic scatter, fitted with orthogonal residuals
pub struct StraightLineModel<'a> {
    observations: &'a ObservationSet,
}

impl<'a> StraightLineModel<'a> {
    pub fn new(observations: &'a ObservationSet) -> Self {
        return StraightLineModel { observations };
    }
}

impl<'a> LogPosterior for StraightLineModel<'a> {
    fn log_posterior(&self, parameters: &LineParameters) -> f64 {
        return objective(parameters, &self.observations.z, &self.observations.covariance);
    }
}

/// Gaussian log-likelihood of the data about a line, with flat priors
///
/// With the unit normal `v = (-sin(theta), cos(theta))`, every point contributes
/// ```text
/// delta_i   = v . z_i - bcost
/// sigma_i^2 = v^T C_i v + V
/// -0.5 * (delta_i^2 / sigma_i^2 + ln(sigma_i^2))
/// ```
///
/// # Arguments
/// * `parameters` - line and intrinsic scatter
/// * `z` - positions, shape=(n_points, 2)
/// * `covariance` - measurement covariance, shape=(n_points, 2, 2)
pub fn objective(parameters: &LineParameters, z: &Array2<f64>, covariance: &Array3<f64>) -> f64 {
    let n_points: usize = z.nrows();
    let v_x: f64 = -parameters.theta.sin();
    let v_y: f64 = parameters.theta.cos();
    let intrinsic_variance: f64 = parameters.log_v.exp();

    let normal: Array1<f64> = Array1::from_vec(vec![v_x, v_y]);
    let delta: Array1<f64> = z.dot(&normal) - parameters.bcost;

    let mut log_likelihood: f64 = 0.0;
    for i_point in 0..n_points {
        let projected_variance: f64 = v_x * v_x * covariance[[i_point, 0, 0]]
            + 2.0 * v_x * v_y * covariance[[i_point, 0, 1]]
            + v_y * v_y * covariance[[i_point, 1, 1]]
            + intrinsic_variance;
        log_likelihood += -0.5 * (delta[i_point].powi(2) / projected_variance + projected_variance.ln());
    }

    return log_likelihood;
}

#[test]
fn test_objective_flipped_normal() {
    // Rotating by pi flips the normal; flipping the sign of bcost describes the same line
    use crate::data::Observation;
    use approx::assert_abs_diff_eq;
    const PI: f64 = std::f64::consts::PI;

    let observations: Vec<Observation> = vec![
        Observation { id: 1, x: 1.0, y: 2.5, sigma_y: 0.4, sigma_x: 0.2, rho_xy: 0.3 },
        Observation { id: 2, x: 2.0, y: 4.1, sigma_y: 0.3, sigma_x: 0.1, rho_xy: -0.5 },
        Observation { id: 3, x: 3.5, y: 7.2, sigma_y: 0.6, sigma_x: 0.3, rho_xy: 0.9 },
        Observation { id: 4, x: 5.0, y: 9.8, sigma_y: 0.2, sigma_x: 0.4, rho_xy: 0.0 },
    ];
    let observation_set: ObservationSet = ObservationSet::new(&observations, &[]).unwrap();

    for (bcost, theta, log_v) in [(0.3, 1.1, -1.0), (-2.0, 0.2, 0.5), (5.0, 2.9, 1.3)] {
        let parameters: LineParameters = LineParameters::new(bcost, theta, log_v);
        let flipped: LineParameters = LineParameters::new(-bcost, theta + PI, log_v);
        assert_abs_diff_eq!(
            objective(&parameters, &observation_set.z, &observation_set.covariance),
            objective(&flipped, &observation_set.z, &observation_set.covariance),
            epsilon = 1e-10
        );
    }
}

#[test]
fn test_objective_single_point() {
    use crate::data::Observation;
    use approx::assert_abs_diff_eq;

    // Horizontal line y = 1 (theta = 0, normal = (0, 1)), point at (4, 3) with sigma_y = 2
    let observations: Vec<Observation> = vec![Observation {
        id: 1,
        x: 4.0,
        y: 3.0,
        sigma_y: 2.0,
        sigma_x: 5.0,
        rho_xy: 0.0,
    }];
    let observation_set: ObservationSet = ObservationSet::new(&observations, &[]).unwrap();
    let model: StraightLineModel = StraightLineModel::new(&observation_set);

    let log_v: f64 = 0.0_f64; // V = 1
    let sigma_sq: f64 = 4.0 + 1.0;
    let expected: f64 = -0.5 * (2.0_f64.powi(2) / sigma_sq + sigma_sq.ln());
    assert_abs_diff_eq!(model.log_posterior(&LineParameters::new(1.0, 0.0, log_v)), expected, epsilon = 1e-12);
}
