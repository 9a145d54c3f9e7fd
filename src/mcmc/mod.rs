// Load modules
mod metropolis;
mod objective;

// Expose to public
pub use metropolis::{McmcResult, MetropolisSampler, SampleTrace, acceptance_probability};
pub use objective::{LogPosterior, StraightLineModel, objective};
