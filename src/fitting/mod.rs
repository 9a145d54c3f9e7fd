// Load modules
mod line_parameters;
mod weighted_least_squares;

// Expose to public
pub use line_parameters::{LineParameters, angle_to_slope, slope_to_angle};
pub use weighted_least_squares::{LinearFit, weighted_least_squares};
