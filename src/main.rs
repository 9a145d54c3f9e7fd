use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use straightline_rs::data::read_data;
use straightline_rs::plotting::{render_fit_plot, render_scatter_histogram};
use straightline_rs::posterior::ModeEstimate;
use straightline_rs::{AnalysisConfig, AnalysisResult, LineParameters, Observation, PlotOptions, run_analysis};

/// Straight-line fit with intrinsic scatter, sampled by Metropolis MCMC
#[derive(Parser, Debug)]
#[command(name = "straightline", version, about)]
struct Args {
    /// Data file, columns `id x y sigma_y sigma_x rho_xy`
    #[arg(long, default_value = "data/data_allerr.dat")]
    data: PathBuf,

    /// Observation ids to leave out, comma separated; pass the flag with no value to keep everything
    #[arg(long, num_args = 0.., value_delimiter = ',', default_values_t = [3])]
    exclude: Vec<i64>,

    /// Output PNG for the sqrt(V) histogram
    #[arg(long, default_value = "ex17.png")]
    plot: PathBuf,

    /// Optional PNG of the data, error ellipses and fitted lines
    #[arg(long)]
    fit_plot: Option<PathBuf>,

    /// Burn-in iterations
    #[arg(long, default_value_t = 5000)]
    n_burn: usize,

    /// Iterations kept after burn-in
    #[arg(long, default_value_t = 200000)]
    n_samples: usize,

    /// Proposal standard deviations for bcost, theta and log V
    #[arg(long, num_args = 3, value_names = ["BCOST", "THETA", "LOG_V"])]
    proposal_sigma: Option<Vec<f64>>,

    /// Random seed, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Image width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Figure caption
    #[arg(long)]
    caption: Option<String>,

    /// Font size for caption and axis labels
    #[arg(long, default_value_t = 20)]
    font_size: u32,

    /// Fit plot x range
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    x_range: Option<Vec<f64>>,

    /// Fit plot y range
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    y_range: Option<Vec<f64>>,
}

impl Args {
    fn analysis_config(&self) -> AnalysisConfig {
        let mut config: AnalysisConfig = AnalysisConfig {
            exclude: self.exclude.clone(),
            n_burn: self.n_burn,
            n_samples: self.n_samples,
            seed: self.seed,
            ..AnalysisConfig::default()
        };
        if let Some(proposal_sigma) = &self.proposal_sigma {
            config.proposal_sigma = [proposal_sigma[0], proposal_sigma[1], proposal_sigma[2]];
        }
        return config;
    }

    fn plot_options(&self) -> PlotOptions {
        return PlotOptions {
            width: self.width,
            height: self.height,
            caption: self.caption.clone(),
            font_size: self.font_size,
            x_range: self.x_range.as_ref().map(|range: &Vec<f64>| (range[0], range[1])),
            y_range: self.y_range.as_ref().map(|range: &Vec<f64>| (range[0], range[1])),
        };
    }
}

fn print_results(result: &AnalysisResult) {
    let best_fit: &LineParameters = &result.mcmc.best_fit;
    println!("Best-fit, overall");
    println!(
        "bcost={}, theta={}, log_v={};  log_v mean={}, median={}",
        best_fit.bcost, best_fit.theta, best_fit.log_v, result.summary.log_v_mean, result.summary.log_v_median
    );

    let mode: &ModeEstimate = &result.summary.mode;
    println!("Best-fit, marginalized");
    for i_edge in 0..3 {
        println!("{} {}", mode.bcost_edges[i_edge], mode.theta_edges[i_edge]);
    }
    println!("b={}, m={}", mode.intercept, mode.slope);

    println!(
        "sqrt(V) 95% upper bound={}, 99% upper bound={}",
        result.summary.scatter_bound_95, result.summary.scatter_bound_99
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = Args::parse();
    let config: AnalysisConfig = args.analysis_config();
    let plot_options: PlotOptions = args.plot_options();

    let observations: Vec<Observation> = read_data(&args.data)?;
    let result: AnalysisResult = run_analysis(&observations, &config)?;
    print_results(&result);

    render_scatter_histogram(
        &args.plot,
        &result.summary.scatter_histogram,
        result.summary.scatter_bound_95,
        result.summary.scatter_bound_99,
        &plot_options,
    )?;

    if let Some(fit_plot_path) = &args.fit_plot {
        render_fit_plot(
            fit_plot_path,
            &result.observations,
            (result.summary.mode.slope, result.summary.mode.intercept),
            &result.posterior_lines,
            &plot_options,
        )?;
    }

    return Ok(());
}
