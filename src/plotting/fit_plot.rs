use super::{PlotOptions, plot_error};
use crate::data::ObservationSet;
use crate::errors::Error;
use crate::fitting::LineParameters;
use log::info;
use ndarray::{Array1, Array2, ArrayView2};
use ndarray_linalg::{Eigh, UPLO};
use plotters::prelude::*;
use std::path::Path;

const PI: f64 = std::f64::consts::PI;
const N_ELLIPSE_SEGMENTS: usize = 64;
// matplotlib's '0.75' grey
const POSTERIOR_LINE_COLOUR: RGBColor = RGBColor(191, 191, 191);
// Dash and gap lengths of the mode line, in pixels
const MODE_LINE_DASH: u32 = 10;
const MODE_LINE_GAP: u32 = 6;

/// Outline of the 1-sigma ellipse of a 2x2 covariance matrix, closed
///
/// The semi-axes lie along the eigenvectors, with lengths `sqrt(eigenvalue)`
pub fn error_ellipse(centre: (f64, f64), covariance: ArrayView2<f64>, n_segments: usize) -> Result<Vec<(f64, f64)>, Error> {
    let (eigenvalues, eigenvectors): (Array1<f64>, Array2<f64>) = covariance.eigh(UPLO::Lower)?;
    let semi_axis_0: f64 = eigenvalues[0].max(0.0).sqrt();
    let semi_axis_1: f64 = eigenvalues[1].max(0.0).sqrt();

    let mut points: Vec<(f64, f64)> = Vec::with_capacity(n_segments + 1);
    for i_segment in 0..=n_segments {
        let phi: f64 = 2.0 * PI * i_segment as f64 / n_segments as f64;
        let a: f64 = semi_axis_0 * phi.cos();
        let b: f64 = semi_axis_1 * phi.sin();
        points.push((
            centre.0 + a * eigenvectors[[0, 0]] + b * eigenvectors[[0, 1]],
            centre.1 + a * eigenvectors[[1, 0]] + b * eigenvectors[[1, 1]],
        ));
    }

    return Ok(points);
}

/// Axis ranges that hold every point and its 1-sigma error bar, and the origin
fn automatic_ranges(observations: &ObservationSet) -> ((f64, f64), (f64, f64)) {
    let mut x_min: f64 = 0.0;
    let mut x_max: f64 = 0.0;
    let mut y_min: f64 = 0.0;
    let mut y_max: f64 = 0.0;
    for i_point in 0..observations.n_points() {
        let covariance: ArrayView2<f64> = observations.covariance_of(i_point);
        let sigma_x: f64 = covariance[[0, 0]].sqrt();
        let sigma_y: f64 = covariance[[1, 1]].sqrt();
        x_min = x_min.min(observations.z[[i_point, 0]] - sigma_x);
        x_max = x_max.max(observations.z[[i_point, 0]] + sigma_x);
        y_min = y_min.min(observations.z[[i_point, 1]] - sigma_y);
        y_max = y_max.max(observations.z[[i_point, 1]] + sigma_y);
    }
    return ((x_min, x_max), (y_min, y_max));
}

/// Data with error ellipses, the mode line and a few lines drawn from the posterior
///
/// # Arguments
/// * `path` - PNG to write
/// * `observations` - the points which took part in the fit
/// * `mode` - `(slope, intercept)` of the posterior mode
/// * `posterior_lines` - random posterior states, drawn in light grey behind everything else
/// * `options` - size, caption and axis ranges
pub fn render_fit_plot(
    path: &Path,
    observations: &ObservationSet,
    mode: (f64, f64),
    posterior_lines: &[LineParameters],
    options: &PlotOptions,
) -> Result<(), Error> {
    let (x_range_auto, y_range_auto): ((f64, f64), (f64, f64)) = automatic_ranges(observations);
    let (x_min, x_max): (f64, f64) = options.x_range.unwrap_or(x_range_auto);
    let (y_min, y_max): (f64, f64) = options.y_range.unwrap_or(y_range_auto);

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart_builder = ChartBuilder::on(&root);
    chart_builder.margin(10).x_label_area_size(40).y_label_area_size(60);
    if let Some(caption) = &options.caption {
        chart_builder.caption(caption, ("sans-serif", options.font_size));
    }
    let mut chart = chart_builder.build_cartesian_2d(x_min..x_max, y_min..y_max).map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("x")
        .y_desc("y")
        .axis_desc_style(("sans-serif", options.font_size))
        .draw()
        .map_err(plot_error)?;

    // Posterior draws first, so they sit underneath
    for line in posterior_lines.iter() {
        let slope: f64 = line.slope();
        let intercept: f64 = line.intercept();
        chart
            .draw_series(LineSeries::new(
                vec![(x_min, slope * x_min + intercept), (x_max, slope * x_max + intercept)],
                POSTERIOR_LINE_COLOUR.stroke_width(1),
            ))
            .map_err(plot_error)?;
    }

    let (mode_slope, mode_intercept): (f64, f64) = mode;
    chart
        .draw_series(DashedLineSeries::new(
            vec![(x_min, mode_slope * x_min + mode_intercept), (x_max, mode_slope * x_max + mode_intercept)],
            MODE_LINE_DASH,
            MODE_LINE_GAP,
            BLACK.stroke_width(2),
        ))
        .map_err(plot_error)?;

    for i_point in 0..observations.n_points() {
        let centre: (f64, f64) = (observations.z[[i_point, 0]], observations.z[[i_point, 1]]);
        let ellipse: Vec<(f64, f64)> = error_ellipse(centre, observations.covariance_of(i_point), N_ELLIPSE_SEGMENTS)?;
        chart
            .draw_series(std::iter::once(PathElement::new(ellipse, &BLACK)))
            .map_err(plot_error)?;
        chart
            .draw_series(std::iter::once(Circle::new(centre, 3, BLACK.filled())))
            .map_err(plot_error)?;
    }

    root.present().map_err(plot_error)?;
    info!("render_fit_plot: written to {:?}", path);

    return Ok(());
}

#[test]
fn test_error_ellipse_axis_aligned() {
    use approx::assert_abs_diff_eq;

    // sigma_x = 2, sigma_y = 1, uncorrelated
    let covariance: Array2<f64> = Array2::from_shape_vec((2, 2), vec![4.0, 0.0, 0.0, 1.0]).unwrap();
    let points: Vec<(f64, f64)> = error_ellipse((10.0, -5.0), covariance.view(), 32).unwrap();

    assert_eq!(points.len(), 33);
    for (x, y) in points.iter() {
        let u: f64 = x - 10.0;
        let v: f64 = y + 5.0;
        assert_abs_diff_eq!(u.powi(2) / 4.0 + v.powi(2), 1.0, epsilon = 1e-10);
    }
    // Closed
    assert_abs_diff_eq!(points[0].0, points[32].0, epsilon = 1e-12);
    assert_abs_diff_eq!(points[0].1, points[32].1, epsilon = 1e-12);
}

#[test]
fn test_error_ellipse_correlated() {
    use crate::data::Observation;
    use approx::assert_abs_diff_eq;
    use ndarray_linalg::Inverse;

    let observation: Observation = Observation {
        id: 1,
        x: 201.0,
        y: 592.0,
        sigma_y: 61.0,
        sigma_x: 9.0,
        rho_xy: -0.84,
    };
    let covariance: Array2<f64> = observation.covariance();
    let covariance_inverse: Array2<f64> = covariance.inv().unwrap();
    let points: Vec<(f64, f64)> = error_ellipse((observation.x, observation.y), covariance.view(), 16).unwrap();

    // Every point sits at Mahalanobis distance one
    for (x, y) in points.iter() {
        let d: Array1<f64> = Array1::from_vec(vec![x - observation.x, y - observation.y]);
        assert_abs_diff_eq!(d.dot(&covariance_inverse.dot(&d)), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_render_fit_plot() {
    use crate::data::Observation;

    let observations: Vec<Observation> = (1..=5)
        .map(|id: i64| Observation {
            id,
            x: 10.0 * id as f64,
            y: 20.0 * id as f64 + 5.0,
            sigma_y: 4.0,
            sigma_x: 2.0,
            rho_xy: if id % 2 == 0 { 0.5 } else { -0.3 },
        })
        .collect();
    let observation_set: ObservationSet = ObservationSet::new(&observations, &[]).unwrap();
    let posterior_lines: Vec<LineParameters> = vec![
        LineParameters::from_slope_intercept(1.9, 6.0, 0.0),
        LineParameters::from_slope_intercept(2.1, 4.0, 0.0),
    ];

    let path: std::path::PathBuf = std::env::temp_dir().join(format!("straightline_fit_plot_{}.png", std::process::id()));
    let _ = std::fs::remove_file(&path);

    // Automatic ranges
    let result: Result<(), Error> = render_fit_plot(&path, &observation_set, (2.0, 5.0), &posterior_lines, &PlotOptions::default());
    assert!(result.is_ok());
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    // Explicit ranges and a caption
    let options: PlotOptions = PlotOptions {
        width: 400,
        height: 300,
        caption: Some("fit".to_string()),
        x_range: Some((0.0, 60.0)),
        y_range: Some((0.0, 120.0)),
        ..PlotOptions::default()
    };
    std::fs::remove_file(&path).unwrap();
    let result: Result<(), Error> = render_fit_plot(&path, &observation_set, (2.0, 5.0), &[], &options);
    assert!(result.is_ok());
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    std::fs::remove_file(&path).unwrap();
}
