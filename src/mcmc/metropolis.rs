use super::LogPosterior;
use crate::errors::Error;
use crate::fitting::LineParameters;
use log::{debug, info, warn};
use ndarray::{Array2, ArrayView2, s};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use std::time::{Duration, Instant};

// Acceptance fractions outside this band suggest retuning the proposal widths
const ACCEPTANCE_RATIO_LOW: f64 = 0.5;
const ACCEPTANCE_RATIO_HIGH: f64 = 0.8;

/// Metropolis acceptance probability, `min(1, exp(new - current))`
///
/// The exponent is clamped at zero before exponentiating, so a large improvement saturates at 1
/// instead of overflowing. A NaN log-ratio is never accepted.
pub fn acceptance_probability(new_log_posterior: f64, current_log_posterior: f64) -> f64 {
    let log_ratio: f64 = new_log_posterior - current_log_posterior;
    if log_ratio.is_nan() {
        return 0.0;
    }
    return log_ratio.min(0.0).exp();
}

/// Every state the chain was in, one row per iteration plus the initial state
///
/// Rows are `[bcost, theta, log_v]`, shape=(n_burn + n_samples + 1, 3)
pub struct SampleTrace {
    pub samples: Array2<f64>,
    pub n_burn: usize,
}

impl SampleTrace {
    pub fn len(&self) -> usize {
        return self.samples.nrows();
    }

    pub fn is_empty(&self) -> bool {
        return self.samples.nrows() == 0;
    }

    /// The states visited after burn-in
    ///
    /// Drops the initial state and the `n_burn` burn-in iterations, keeping the final state,
    /// so exactly `n_samples` rows remain.
    pub fn post_burn_in(&self) -> Result<ArrayView2<'_, f64>, Error> {
        let n_rows: usize = self.samples.nrows();
        if n_rows <= self.n_burn + 1 {
            return Err(Error::EmptyTrace { n_rows, n_burn: self.n_burn });
        }
        return Ok(self.samples.slice(s![self.n_burn + 1.., ..]));
    }

    pub fn state(&self, i_row: usize) -> LineParameters {
        return LineParameters::from_array(self.samples.row(i_row));
    }
}

pub struct McmcResult {
    pub trace: SampleTrace,
    /// Highest posterior state the chain has been in
    pub best_fit: LineParameters,
    pub best_log_posterior: f64,
    pub n_accepted: usize,
    pub acceptance_ratio: f64,
}

/// Random-walk Metropolis sampler with independent Gaussian proposals
pub struct MetropolisSampler<'a, M: LogPosterior> {
    model: &'a M,
    proposals: [Normal<f64>; LineParameters::N_PARAMETERS],
    rng: StdRng,
}

impl<'a, M: LogPosterior> MetropolisSampler<'a, M> {
    /// # Arguments
    /// * `model` - posterior to explore
    /// * `proposal_sigma` - proposal standard deviation for `[bcost, theta, log_v]`
    /// * `seed` - seed for the random source, `None` seeds from the operating system
    pub fn new(model: &'a M, proposal_sigma: [f64; LineParameters::N_PARAMETERS], seed: Option<u64>) -> Result<Self, Error> {
        let mut proposals: Vec<Normal<f64>> = Vec::with_capacity(LineParameters::N_PARAMETERS);
        for sigma in proposal_sigma {
            let proposal: Normal<f64> = Normal::new(0.0, sigma).map_err(|error| Error::InvalidConfig(format!("proposal sigma={}: {}", sigma, error)))?;
            proposals.push(proposal);
        }

        let rng: StdRng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        return Ok(MetropolisSampler {
            model,
            proposals: [proposals[0], proposals[1], proposals[2]],
            rng,
        });
    }

    /// Random source, shared with anything that wants to reuse the same stream after sampling
    pub fn rng(&mut self) -> &mut StdRng {
        return &mut self.rng;
    }

    fn propose(&mut self, current: &LineParameters) -> LineParameters {
        let bcost: f64 = current.bcost + self.rng.sample(self.proposals[0]);
        let theta: f64 = current.theta + self.rng.sample(self.proposals[1]);
        let log_v: f64 = current.log_v + self.rng.sample(self.proposals[2]);
        return LineParameters::new(bcost, theta, log_v);
    }

    /// Run `n_burn + n_samples` iterations starting from `initial`
    pub fn run(&mut self, initial: LineParameters, n_burn: usize, n_samples: usize) -> McmcResult {
        let n_iterations: usize = n_burn + n_samples;
        let timing_start: Instant = Instant::now();

        let mut samples: Array2<f64> = Array2::from_elem((n_iterations + 1, LineParameters::N_PARAMETERS), f64::NAN);
        samples.row_mut(0).assign(&initial.to_array());

        let mut current: LineParameters = initial;
        let mut current_log_posterior: f64 = self.model.log_posterior(&current);
        let mut best_fit: LineParameters = current;
        let mut best_log_posterior: f64 = current_log_posterior;
        let mut n_accepted: usize = 0;

        for i_iteration in 0..n_iterations {
            let proposal: LineParameters = self.propose(&current);
            let proposal_log_posterior: f64 = self.model.log_posterior(&proposal);

            let u: f64 = self.rng.random::<f64>();
            if u < acceptance_probability(proposal_log_posterior, current_log_posterior) {
                current = proposal;
                current_log_posterior = proposal_log_posterior;
                n_accepted += 1;
            }

            if current_log_posterior > best_log_posterior {
                best_fit = current;
                best_log_posterior = current_log_posterior;
            }

            samples.row_mut(i_iteration + 1).assign(&current.to_array());
        }

        let acceptance_ratio: f64 = if n_iterations > 0 { n_accepted as f64 / n_iterations as f64 } else { 0.0 };
        if acceptance_ratio < ACCEPTANCE_RATIO_LOW || acceptance_ratio > ACCEPTANCE_RATIO_HIGH {
            warn!("Acceptance ratio was {}", acceptance_ratio);
        } else {
            debug!("Acceptance ratio was {}", acceptance_ratio);
        }

        let duration: Duration = timing_start.elapsed();
        info!("Metropolis: {} iterations in {:?}", n_iterations, duration);

        return McmcResult {
            trace: SampleTrace { samples, n_burn },
            best_fit,
            best_log_posterior,
            n_accepted,
            acceptance_ratio,
        };
    }
}

#[cfg(test)]
struct IsotropicGaussian {
    sigma: f64,
}

#[cfg(test)]
impl LogPosterior for IsotropicGaussian {
    fn log_posterior(&self, parameters: &LineParameters) -> f64 {
        let r_sq: f64 = parameters.bcost.powi(2) + parameters.theta.powi(2) + parameters.log_v.powi(2);
        return -0.5 * r_sq / self.sigma.powi(2);
    }
}

#[test]
fn test_acceptance_probability() {
    use approx::assert_abs_diff_eq;

    // Uphill and level moves are always accepted
    assert_eq!(acceptance_probability(-1.0, -5.0), 1.0);
    assert_eq!(acceptance_probability(3.0, 3.0), 1.0);
    // No overflow on a huge improvement
    assert_eq!(acceptance_probability(1.0e6, -1.0e6), 1.0);
    assert_eq!(acceptance_probability(0.0, f64::NEG_INFINITY), 1.0);

    assert_abs_diff_eq!(acceptance_probability(-2.0, 0.0), (-2.0_f64).exp(), epsilon = 1e-15);
    assert_eq!(acceptance_probability(-1.0e6, 0.0), 0.0);
    assert_eq!(acceptance_probability(f64::NAN, 0.0), 0.0);
    assert_eq!(acceptance_probability(f64::NEG_INFINITY, f64::NEG_INFINITY), 0.0);
}

#[test]
fn test_trace_length_and_burn_in() {
    let model: IsotropicGaussian = IsotropicGaussian { sigma: 1.0 };
    let mut sampler: MetropolisSampler<IsotropicGaussian> = MetropolisSampler::new(&model, [0.5, 0.5, 0.5], Some(7)).unwrap();

    let n_burn: usize = 100;
    let n_samples: usize = 250;
    let initial: LineParameters = LineParameters::new(3.0, -2.0, 1.0);
    let result: McmcResult = sampler.run(initial, n_burn, n_samples);

    assert_eq!(result.trace.len(), n_burn + n_samples + 1);
    assert_eq!(result.trace.state(0), initial);
    assert!(result.trace.samples.iter().all(|value: &f64| value.is_finite()));

    let post_burn_in: ArrayView2<f64> = result.trace.post_burn_in().unwrap();
    assert_eq!(post_burn_in.nrows(), n_samples);
    // The final state is kept
    assert_eq!(post_burn_in.row(n_samples - 1), result.trace.samples.row(n_burn + n_samples));
    assert_eq!(post_burn_in.row(0), result.trace.samples.row(n_burn + 1));

    assert!(result.n_accepted <= n_burn + n_samples);
    assert_eq!(result.acceptance_ratio, result.n_accepted as f64 / (n_burn + n_samples) as f64);
}

#[test]
fn test_best_fit_is_a_visited_state() {
    let model: IsotropicGaussian = IsotropicGaussian { sigma: 1.0 };
    let mut sampler: MetropolisSampler<IsotropicGaussian> = MetropolisSampler::new(&model, [0.3, 0.3, 0.3], Some(11)).unwrap();
    let result: McmcResult = sampler.run(LineParameters::new(2.0, 2.0, 2.0), 50, 500);

    // No state in the trace beats the best-fit record, and the record is one of the states
    let mut found: bool = false;
    for i_row in 0..result.trace.len() {
        let state: LineParameters = result.trace.state(i_row);
        assert!(model.log_posterior(&state) <= result.best_log_posterior);
        if state == result.best_fit {
            found = true;
        }
    }
    assert!(found);
    assert_eq!(model.log_posterior(&result.best_fit), result.best_log_posterior);
}

#[test]
fn test_fixed_seed_is_reproducible() {
    let model: IsotropicGaussian = IsotropicGaussian { sigma: 2.0 };
    let initial: LineParameters = LineParameters::new(0.5, 0.5, 0.5);

    let mut sampler_a: MetropolisSampler<IsotropicGaussian> = MetropolisSampler::new(&model, [1.0, 0.1, 0.2], Some(42)).unwrap();
    let mut sampler_b: MetropolisSampler<IsotropicGaussian> = MetropolisSampler::new(&model, [1.0, 0.1, 0.2], Some(42)).unwrap();
    let mut sampler_c: MetropolisSampler<IsotropicGaussian> = MetropolisSampler::new(&model, [1.0, 0.1, 0.2], Some(43)).unwrap();

    let result_a: McmcResult = sampler_a.run(initial, 10, 300);
    let result_b: McmcResult = sampler_b.run(initial, 10, 300);
    let result_c: McmcResult = sampler_c.run(initial, 10, 300);

    assert_eq!(result_a.trace.samples, result_b.trace.samples);
    assert_eq!(result_a.n_accepted, result_b.n_accepted);
    assert_ne!(result_a.trace.samples, result_c.trace.samples);
}

#[test]
fn test_invalid_proposal_sigma() {
    let model: IsotropicGaussian = IsotropicGaussian { sigma: 1.0 };
    let result: Result<MetropolisSampler<IsotropicGaussian>, Error> = MetropolisSampler::new(&model, [1.0, f64::NAN, 1.0], Some(1));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
