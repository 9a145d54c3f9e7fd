use log::info;
mod config;
pub use config::AnalysisConfig;
pub mod data;
pub use data::{Observation, ObservationSet};
mod errors;
pub use errors::Error;
pub mod fitting;
pub use fitting::{LineParameters, LinearFit};
pub mod mcmc;
use mcmc::{McmcResult, MetropolisSampler, StraightLineModel};
pub mod plotting;
pub use plotting::PlotOptions;
pub mod posterior;
use posterior::PosteriorSummary;

/// Everything produced by one analysis run
pub struct AnalysisResult {
    /// The observations left after `AnalysisConfig::exclude` is applied
    pub observations: ObservationSet,
    /// Closed-form chi-squared fit, used to start the chain
    pub linear_fit: LinearFit,
    pub initial_guess: LineParameters,
    pub mcmc: McmcResult,
    pub summary: PosteriorSummary,
    /// Random posterior states for overplotting
    pub posterior_lines: Vec<LineParameters>,
}

/// Fit a straight line with intrinsic scatter to `observations` by MCMC
///
/// # Algorithm
/// 0. Drop the observations whose id is in `config.exclude`
/// 1. Weighted least squares on the y errors gives the starting line, with `V = 1`
/// 2. Metropolis sampling of `(bcost, theta, log_v)` for `n_burn + n_samples` iterations
/// 3. Posterior mode of the line and credible bounds on `sqrt(V)` from the post burn-in samples
///
/// No file or terminal I/O happens here; see the `straightline` binary for that.
pub fn run_analysis(observations: &[Observation], config: &AnalysisConfig) -> Result<AnalysisResult, Error> {
    config.validate()?;
    let observation_set: ObservationSet = ObservationSet::new(observations, &config.exclude)?;

    let linear_fit: LinearFit = fitting::weighted_least_squares(&observation_set)?;
    let initial_guess: LineParameters = linear_fit.initial_guess();
    info!(
        "run_analysis: chi-squared fit slope={}, intercept={} on {} points",
        linear_fit.slope,
        linear_fit.intercept,
        observation_set.n_points()
    );

    let model: StraightLineModel = StraightLineModel::new(&observation_set);
    let mut sampler: MetropolisSampler<StraightLineModel> = MetropolisSampler::new(&model, config.proposal_sigma, config.seed)?;
    let mcmc: McmcResult = sampler.run(initial_guess, config.n_burn, config.n_samples);

    let summary: PosteriorSummary = PosteriorSummary::from_trace(&mcmc.trace)?;
    let posterior_lines: Vec<LineParameters> =
        posterior::random_posterior_lines(mcmc.trace.post_burn_in()?, config.n_posterior_lines, sampler.rng());

    return Ok(AnalysisResult {
        observations: observation_set,
        linear_fit,
        initial_guess,
        mcmc,
        summary,
        posterior_lines,
    });
}

#[cfg(test)]
fn synthetic_line_observations(slope: f64, intercept: f64) -> Vec<Observation> {
    // Points on the line with a small deterministic wobble, well inside the error bars
    return (0..20)
        .map(|i_point: usize| {
            let x: f64 = 5.0 * i_point as f64;
            let wobble: f64 = 0.3 * (1.7 * i_point as f64).sin();
            Observation {
                id: i_point as i64 + 1,
                x,
                y: slope * x + intercept + wobble,
                sigma_y: 1.0,
                sigma_x: 0.5,
                rho_xy: 0.0,
            }
        })
        .collect();
}

#[test]
fn test_run_analysis_recovers_known_line() {
    use approx::assert_abs_diff_eq;

    let slope_true: f64 = 2.0;
    let intercept_true: f64 = 30.0;
    let observations: Vec<Observation> = synthetic_line_observations(slope_true, intercept_true);

    let config: AnalysisConfig = AnalysisConfig {
        exclude: vec![],
        n_burn: 2000,
        n_samples: 20000,
        proposal_sigma: [0.05, 0.001, 0.3],
        seed: Some(1),
        n_posterior_lines: 10,
    };
    let result: AnalysisResult = run_analysis(&observations, &config).unwrap();

    assert_eq!(result.observations.n_points(), 20);
    assert_abs_diff_eq!(result.linear_fit.slope, slope_true, epsilon = 0.02);
    assert_eq!(result.mcmc.trace.len(), config.n_burn + config.n_samples + 1);
    assert_eq!(result.summary.n_samples, config.n_samples);
    assert_eq!(result.summary.n_bins, 71);

    assert_abs_diff_eq!(result.summary.mode.slope, slope_true, epsilon = 0.05);
    assert_abs_diff_eq!(result.summary.mode.intercept, intercept_true, epsilon = 3.0);
    assert!(result.summary.scatter_bound_95 <= result.summary.scatter_bound_99);
    assert!(result.summary.scatter_bound_95 >= 0.0);

    assert_abs_diff_eq!(result.mcmc.best_fit.slope(), slope_true, epsilon = 0.05);
    assert_eq!(result.posterior_lines.len(), 10);
}

#[test]
fn test_run_analysis_is_reproducible() {
    let observations: Vec<Observation> = synthetic_line_observations(-0.5, 12.0);

    let config: AnalysisConfig = AnalysisConfig {
        exclude: vec![4, 9],
        n_burn: 200,
        n_samples: 1000,
        proposal_sigma: [0.1, 0.002, 0.3],
        seed: Some(2024),
        n_posterior_lines: 3,
    };
    let result_a: AnalysisResult = run_analysis(&observations, &config).unwrap();
    let result_b: AnalysisResult = run_analysis(&observations, &config).unwrap();

    assert_eq!(result_a.mcmc.trace.samples, result_b.mcmc.trace.samples);
    assert_eq!(result_a.summary.scatter_bound_99, result_b.summary.scatter_bound_99);
    assert_eq!(result_a.posterior_lines, result_b.posterior_lines);

    // Negative slopes come back negative
    assert!(result_a.linear_fit.slope < 0.0);
    assert!(result_a.summary.mode.slope < 0.0);
}

#[test]
fn test_run_analysis_on_shipped_data() {
    let path: std::path::PathBuf = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("data_allerr.dat");
    let observations: Vec<Observation> = data::read_data(&path).unwrap();
    let config: AnalysisConfig = AnalysisConfig {
        n_burn: 500,
        n_samples: 4000,
        seed: Some(17),
        ..AnalysisConfig::default()
    };
    let result: AnalysisResult = run_analysis(&observations, &config).unwrap();
    assert_eq!(result.observations.n_points(), 19);
    assert!(!result.observations.ids.contains(&3));
    assert!(result.linear_fit.slope > 0.0);
    assert!(result.summary.mode.slope.is_finite());
    assert!(result.summary.mode.intercept.is_finite());
    assert!(result.summary.scatter_bound_95 <= result.summary.scatter_bound_99);
    assert!(result.mcmc.acceptance_ratio > 0.0 && result.mcmc.acceptance_ratio < 1.0);
}

#[test]
fn test_run_analysis_rejects_bad_config() {
    let observations: Vec<Observation> = synthetic_line_observations(1.0, 0.0);
    let config: AnalysisConfig = AnalysisConfig {
        n_samples: 0,
        ..AnalysisConfig::default()
    };
    assert!(matches!(run_analysis(&observations, &config), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_run_analysis_applies_exclusions() {
    let observations: Vec<Observation> = synthetic_line_observations(-0.5, 12.0);
    let config: AnalysisConfig = AnalysisConfig {
        exclude: vec![4, 9],
        n_burn: 100,
        n_samples: 400,
        proposal_sigma: [0.1, 0.002, 0.3],
        seed: Some(5),
        n_posterior_lines: 2,
    };
    let result: AnalysisResult = run_analysis(&observations, &config).unwrap();
    assert_eq!(result.observations.n_points(), 18);
    assert!(!result.observations.ids.contains(&4));
    assert!(!result.observations.ids.contains(&9));

    // The default configuration drops id 3
    let config: AnalysisConfig = AnalysisConfig {
        n_burn: 100,
        n_samples: 400,
        proposal_sigma: [0.1, 0.002, 0.3],
        seed: Some(5),
        ..AnalysisConfig::default()
    };
    let result: AnalysisResult = run_analysis(&observations, &config).unwrap();
    assert_eq!(result.observations.n_points(), 19);
    assert!(!result.observations.ids.contains(&3));

    // Excluding everything is an error
    let config: AnalysisConfig = AnalysisConfig {
        exclude: (1..=20).collect(),
        ..config
    };
    assert!(matches!(run_analysis(&observations, &config), Err(Error::EmptyDataset)));
}
