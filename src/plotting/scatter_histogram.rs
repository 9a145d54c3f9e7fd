use super::{PlotOptions, plot_error};
use crate::errors::Error;
use crate::posterior::Histogram1D;
use log::info;
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use plotters::prelude::*;
use std::path::Path;

// matplotlib's '0.5' grey
const REFERENCE_LINE_COLOUR: RGBColor = RGBColor(128, 128, 128);

/// Outline of a histogram drawn as steps, starting and ending on zero
pub fn step_outline(edges: &Array1<f64>, heights: &Array1<f64>) -> Vec<(f64, f64)> {
    let n_bins: usize = heights.len();
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(2 * n_bins + 2);

    points.push((edges[0], 0.0));
    for i_bin in 0..n_bins {
        points.push((edges[i_bin], heights[i_bin]));
        points.push((edges[i_bin + 1], heights[i_bin]));
    }
    points.push((edges[n_bins], 0.0));

    return points;
}

/// Density histogram of `sqrt(V)` with vertical lines at the two credible bounds
pub fn render_scatter_histogram(path: &Path, histogram: &Histogram1D, bound_95: f64, bound_99: f64, options: &PlotOptions) -> Result<(), Error> {
    let density: Array1<f64> = histogram.density();
    let density_max: f64 = *density.max().map_err(plot_error)?;
    let x_min: f64 = histogram.edges[0];
    let x_max: f64 = histogram.edges[histogram.n_bins()];
    let y_max: f64 = 1.1 * density_max.max(f64::MIN_POSITIVE);

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart_builder = ChartBuilder::on(&root);
    chart_builder.margin(10).x_label_area_size(40).y_label_area_size(60);
    if let Some(caption) = &options.caption {
        chart_builder.caption(caption, ("sans-serif", options.font_size));
    }
    let mut chart = chart_builder.build_cartesian_2d(x_min..x_max, 0.0..y_max).map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("√V")
        .axis_desc_style(("sans-serif", options.font_size))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(step_outline(&histogram.edges, &density), &BLACK))
        .map_err(plot_error)?;

    for bound in [bound_95, bound_99] {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(bound, 0.0), (bound, y_max)],
                REFERENCE_LINE_COLOUR.stroke_width(2),
            )))
            .map_err(plot_error)?;
    }

    root.present().map_err(plot_error)?;
    info!("render_scatter_histogram: written to {:?}", path);

    return Ok(());
}

#[test]
fn test_step_outline() {
    let edges: Array1<f64> = Array1::from_vec(vec![0.0, 1.0, 2.0]);
    let heights: Array1<f64> = Array1::from_vec(vec![3.0, 5.0]);

    let points: Vec<(f64, f64)> = step_outline(&edges, &heights);
    assert_eq!(points, vec![(0.0, 0.0), (0.0, 3.0), (1.0, 3.0), (1.0, 5.0), (2.0, 5.0), (2.0, 0.0)]);
}

#[test]
fn test_render_scatter_histogram() {
    let values: Array1<f64> = Array1::from_shape_fn(400, |i_value: usize| 0.01 * i_value as f64);
    let histogram: Histogram1D = Histogram1D::new(values.view(), 10).unwrap();
    let bound_95: f64 = histogram.first_edge_exceeding(0.95).unwrap();
    let bound_99: f64 = histogram.first_edge_exceeding(0.99).unwrap();

    let path: std::path::PathBuf = std::env::temp_dir().join(format!("straightline_scatter_{}.png", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let result: Result<(), Error> = render_scatter_histogram(&path, &histogram, bound_95, bound_99, &PlotOptions::default());
    assert!(result.is_ok());
    assert!(std::fs::metadata(&path).unwrap().len() > 0);

    std::fs::remove_file(&path).unwrap();
}
