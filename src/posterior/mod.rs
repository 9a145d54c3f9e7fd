// Load modules
mod histogram;
mod summary;

// Expose to public
pub use histogram::{Histogram1D, Histogram2D, n_bins_for};
pub use summary::{ModeEstimate, PosteriorSummary, random_posterior_lines};
