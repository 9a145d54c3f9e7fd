use crate::errors::Error;
use crate::fitting::LineParameters;

const PI: f64 = std::f64::consts::PI;

/// Everything the analysis needs besides the data
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Observation ids to leave out
    pub exclude: Vec<i64>,
    /// Iterations discarded before the posterior is summarised
    pub n_burn: usize,
    /// Iterations kept after burn-in
    pub n_samples: usize,
    /// Gaussian proposal standard deviation for `[bcost, theta, log_v]`
    pub proposal_sigma: [f64; LineParameters::N_PARAMETERS],
    /// Random seed; `None` seeds from the operating system and the run is not reproducible
    pub seed: Option<u64>,
    /// Number of random posterior lines kept for the fit plot
    pub n_posterior_lines: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        return AnalysisConfig {
            exclude: vec![3],
            n_burn: 5000,
            n_samples: 200000,
            proposal_sigma: [1.0, PI / 200.0, 0.1],
            seed: None,
            n_posterior_lines: 10,
        };
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.n_samples == 0 {
            return Err(Error::InvalidConfig("n_samples must be at least 1".to_string()));
        }
        for (i_parameter, sigma) in self.proposal_sigma.iter().enumerate() {
            if !(sigma.is_finite() && *sigma > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "proposal_sigma[{}]={} must be positive and finite",
                    i_parameter, sigma
                )));
            }
        }
        return Ok(());
    }
}

#[test]
fn test_default_config_is_valid() {
    let config: AnalysisConfig = AnalysisConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.exclude, vec![3]);
    assert_eq!(config.proposal_sigma[1], PI / 200.0);
}

#[test]
fn test_config_validation() {
    let mut config: AnalysisConfig = AnalysisConfig::default();
    config.n_samples = 0;
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

    let mut config: AnalysisConfig = AnalysisConfig::default();
    config.proposal_sigma = [1.0, 0.0, 0.1];
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

    let mut config: AnalysisConfig = AnalysisConfig::default();
    config.proposal_sigma = [1.0, 0.1, f64::INFINITY];
    assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
}
