use ndarray::{Array1, ArrayView1};

const PI: f64 = std::f64::consts::PI;

/// A straight line plus intrinsic scatter, in the parameterisation used by the sampler
///
/// The line `y = slope * x + intercept` is described by its angle to the x-axis, `theta`,
/// and its perpendicular offset from the origin, `bcost = intercept * cos(theta)`.
/// The unit normal to the line is `(-sin(theta), cos(theta))`.
///
/// `log_v` is the natural log of the intrinsic scatter variance `V`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineParameters {
    pub bcost: f64,
    pub theta: f64,
    pub log_v: f64,
}

impl LineParameters {
    pub const N_PARAMETERS: usize = 3;

    pub fn new(bcost: f64, theta: f64, log_v: f64) -> Self {
        return LineParameters { bcost, theta, log_v };
    }

    pub fn from_slope_intercept(slope: f64, intercept: f64, log_v: f64) -> Self {
        let theta: f64 = slope_to_angle(slope);
        let bcost: f64 = intercept * theta.cos();
        return LineParameters { bcost, theta, log_v };
    }

    /// Read a parameter vector ordered `[bcost, theta, log_v]`
    pub fn from_array(parameters: ArrayView1<f64>) -> Self {
        return LineParameters {
            bcost: parameters[0],
            theta: parameters[1],
            log_v: parameters[2],
        };
    }

    pub fn to_array(&self) -> Array1<f64> {
        return Array1::from_vec(vec![self.bcost, self.theta, self.log_v]);
    }

    pub fn slope(&self) -> f64 {
        return angle_to_slope(self.theta);
    }

    pub fn intercept(&self) -> f64 {
        return self.bcost / self.theta.cos();
    }

    /// Standard deviation of the intrinsic scatter, `sqrt(V)`
    pub fn intrinsic_scatter(&self) -> f64 {
        return (0.5 * self.log_v).exp();
    }
}

/// Angle of a line with the given slope
///
/// `acos(1 / sqrt(1 + slope^2))` lies in `[0, pi/2)`; negative slopes are reflected to `pi - angle`
pub fn slope_to_angle(slope: f64) -> f64 {
    let angle: f64 = (1.0 / (1.0 + slope.powi(2)).sqrt()).acos();
    if slope < 0.0 {
        return PI - angle;
    }
    return angle;
}

/// Slope of a line at angle `theta`
///
/// Magnitude is `sqrt(1 / cos^2(theta) - 1)`, the sign follows `tan(theta)`
pub fn angle_to_slope(theta: f64) -> f64 {
    let magnitude: f64 = (1.0 / theta.cos().powi(2) - 1.0).max(0.0).sqrt();
    return magnitude.copysign(theta.tan());
}

#[test]
fn test_slope_angle_round_trip() {
    use approx::assert_abs_diff_eq;

    for slope in [-3.5, -1.0, -0.25, 0.0, 0.25, 1.0, 2.2311] {
        let theta: f64 = slope_to_angle(slope);
        assert!(theta >= 0.0 && theta < PI, "theta={} outside [0, pi)", theta);
        assert_abs_diff_eq!(angle_to_slope(theta), slope, epsilon = 1e-10);
    }

    // Negative slopes land in the upper half of [0, pi)
    assert!(slope_to_angle(-0.5) > 0.5 * PI);
    assert!(slope_to_angle(0.5) < 0.5 * PI);
}

#[test]
fn test_line_parameters_slope_intercept() {
    use approx::assert_abs_diff_eq;

    for (slope, intercept) in [(2.0, 30.0), (-1.5, 400.0), (0.0, -7.0)] {
        let parameters: LineParameters = LineParameters::from_slope_intercept(slope, intercept, 0.0);
        assert_abs_diff_eq!(parameters.slope(), slope, epsilon = 1e-10);
        assert_abs_diff_eq!(parameters.intercept(), intercept, epsilon = 1e-9);

        // The offset is the signed perpendicular distance of the line from the origin
        let normal: [f64; 2] = [-parameters.theta.sin(), parameters.theta.cos()];
        let point_on_line: [f64; 2] = [3.0, slope * 3.0 + intercept];
        assert_abs_diff_eq!(normal[0] * point_on_line[0] + normal[1] * point_on_line[1], parameters.bcost, epsilon = 1e-9);
    }

    let parameters: LineParameters = LineParameters::new(1.0, 0.3, 2.0_f64.ln() * 2.0);
    assert_abs_diff_eq!(parameters.intrinsic_scatter(), 2.0, epsilon = 1e-12);
    assert_eq!(LineParameters::from_array(parameters.to_array().view()), parameters);
}
