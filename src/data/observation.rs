use crate::errors::Error;
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, s};

/// A single measurement: position and its uncertainties
///
/// `rho_xy` is the correlation coefficient between the x and y errors
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub sigma_y: f64,
    pub sigma_x: f64,
    pub rho_xy: f64,
}

impl Observation {
    /// Covariance matrix of the (x, y) measurement errors
    ///
    /// ```text
    /// [[sigma_x^2,                 rho_xy * sigma_x * sigma_y],
    ///  [rho_xy * sigma_x * sigma_y, sigma_y^2               ]]
    /// ```
    pub fn covariance(&self) -> Array2<f64> {
        let var_x: f64 = self.sigma_x.powi(2);
        let var_y: f64 = self.sigma_y.powi(2);
        let cov_xy: f64 = self.rho_xy * (var_x * var_y).sqrt();

        let covariance: Array2<f64> = Array2::from_shape_vec((2, 2), vec![var_x, cov_xy, cov_xy, var_y])
            .expect("Observation.covariance: Failed to create Array2 from shape vec");

        return covariance;
    }
}

/// The observations which take part in the fit, packed into arrays
pub struct ObservationSet {
    pub ids: Vec<i64>,
    /// Positions, shape=(n_points, 2), columns are (x, y)
    pub z: Array2<f64>,
    /// Measurement covariance of every point, shape=(n_points, 2, 2)
    pub covariance: Array3<f64>,
    /// Vertical uncertainty, length=n_points
    pub y_err: Array1<f64>,
}

impl ObservationSet {
    /// Keep every observation whose id is not in `exclude`
    ///
    /// # Arguments
    /// * `observations` - all rows read from the data file
    /// * `exclude` - ids to leave out of the analysis
    ///
    /// # Returns
    /// * `Err(Error::EmptyDataset)` when nothing is left after the exclusion
    pub fn new(observations: &[Observation], exclude: &[i64]) -> Result<Self, Error> {
        let kept: Vec<&Observation> = observations.iter().filter(|observation| !exclude.contains(&observation.id)).collect();
        let n_points: usize = kept.len();
        if n_points == 0 {
            return Err(Error::EmptyDataset);
        }

        let mut ids: Vec<i64> = Vec::with_capacity(n_points);
        let mut z: Array2<f64> = Array2::from_elem((n_points, 2), f64::NAN);
        let mut covariance: Array3<f64> = Array3::from_elem((n_points, 2, 2), f64::NAN);
        let mut y_err: Array1<f64> = Array1::from_elem(n_points, f64::NAN);
        for (i_point, observation) in kept.iter().enumerate() {
            ids.push(observation.id);
            z[[i_point, 0]] = observation.x;
            z[[i_point, 1]] = observation.y;
            covariance.slice_mut(s![i_point, .., ..]).assign(&observation.covariance());
            y_err[i_point] = observation.sigma_y;
        }

        return Ok(ObservationSet { ids, z, covariance, y_err });
    }

    pub fn n_points(&self) -> usize {
        return self.ids.len();
    }

    pub fn x(&self) -> ArrayView1<'_, f64> {
        return self.z.column(0);
    }

    pub fn y(&self) -> ArrayView1<'_, f64> {
        return self.z.column(1);
    }

    pub fn covariance_of(&self, i_point: usize) -> ArrayView2<'_, f64> {
        return self.covariance.slice(s![i_point, .., ..]);
    }
}

#[test]
fn test_observation_covariance() {
    use approx::assert_abs_diff_eq;

    let observation: Observation = Observation {
        id: 1,
        x: 201.0,
        y: 592.0,
        sigma_y: 61.0,
        sigma_x: 9.0,
        rho_xy: -0.84,
    };
    let covariance: Array2<f64> = observation.covariance();

    assert_abs_diff_eq!(covariance[[0, 0]], 81.0, epsilon = 1e-12);
    assert_abs_diff_eq!(covariance[[1, 1]], 3721.0, epsilon = 1e-12);
    assert_abs_diff_eq!(covariance[[0, 1]], -0.84 * 9.0 * 61.0, epsilon = 1e-9);
    assert_abs_diff_eq!(covariance[[0, 1]], covariance[[1, 0]]);
}

#[test]
fn test_observation_set_exclusion() {
    let observations: Vec<Observation> = (1..=4)
        .map(|id: i64| Observation {
            id,
            x: id as f64,
            y: 10.0 * id as f64,
            sigma_y: 1.0,
            sigma_x: 0.5,
            rho_xy: 0.0,
        })
        .collect();

    let observation_set: ObservationSet = ObservationSet::new(&observations, &[3]).unwrap();
    assert_eq!(observation_set.ids, vec![1, 2, 4]);
    assert_eq!(observation_set.n_points(), 3);
    assert_eq!(observation_set.x().to_vec(), vec![1.0, 2.0, 4.0]);
    assert_eq!(observation_set.y().to_vec(), vec![10.0, 20.0, 40.0]);
    assert_eq!(observation_set.covariance_of(2)[[0, 0]], 0.25);

    // Excluding everything is an error, not an empty fit
    let result: Result<ObservationSet, Error> = ObservationSet::new(&observations, &[1, 2, 3, 4]);
    assert!(matches!(result, Err(Error::EmptyDataset)));
}
