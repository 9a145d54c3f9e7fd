// Load modules
mod fit_plot;
mod plot_options;
mod scatter_histogram;

// Expose to public
pub use fit_plot::{error_ellipse, render_fit_plot};
pub use plot_options::PlotOptions;
pub use scatter_histogram::{render_scatter_histogram, step_outline};

use crate::errors::Error;

fn plot_error<E: std::fmt::Display>(error: E) -> Error {
    return Error::Plot(error.to_string());
}
