#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use h1omp::config::ExperimentConfig;
use h1omp::dictionary::{sine_basis, uniform_dictionary};
use h1omp::{Basis, BasisPair, FunctionKind, GreedyBasisConstructor, GreedyOptions, Vector};

#[derive(Args)]
pub struct ExperimentArgs {
    /// TOML file with n, m, dictionary_size, remove, verbose and target
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of sine modes spanning the target space
    #[arg(long)]
    pub n: Option<u32>,

    /// Number of measurements to select
    #[arg(long)]
    pub m: Option<usize>,

    /// Number of points on the uniform dictionary grid
    #[arg(long, value_name = "N")]
    pub dictionary_size: Option<usize>,

    /// Keep selected points in the dictionary
    #[arg(long)]
    pub keep_selected: bool,

    /// Log the greedy criterion at every step
    #[arg(long)]
    pub verbose: bool,
}

impl ExperimentArgs {
    fn resolve(&self) -> Result<ExperimentConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(n) = self.n {
            config.n = n;
        }
        if let Some(m) = self.m {
            config.m = m;
        }
        if let Some(size) = self.dictionary_size {
            config.dictionary_size = size;
        }
        if self.keep_selected {
            config.remove = false;
        }
        if self.verbose {
            config.verbose = true;
        }
        config.validate()?;
        log::debug!("Effective configuration:\n{}", config.to_toml_string()?);
        Ok(config)
    }
}

#[derive(Parser)]
#[command(
    name = "h1omp",
    about = "Greedy measurement selection and optimal reconstruction in H¹₀(0,1)",
    long_about = "Selects point evaluations from a uniform dictionary that best capture a space \
                 of sine modes, reports the stability constant beta, and reconstructs target \
                 functions from their measurements."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the greedy selection and report beta
    #[command(about = "Select measurement points greedily (prints points and beta)")]
    Greedy(ExperimentArgs),

    /// Run the greedy selection, then reconstruct a target function
    #[command(about = "Reconstruct a sine-series target from greedy measurements")]
    Reconstruct {
        #[command(flatten)]
        experiment: ExperimentArgs,

        /// Sine coefficients of the target, comma separated (frequency 1 first)
        #[arg(long, value_delimiter = ',')]
        target: Option<Vec<f64>>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Some(Commands::Greedy(args)) => args.resolve().and_then(|config| run_greedy(&config)),
        Some(Commands::Reconstruct { experiment, target }) => {
            experiment.resolve().and_then(|mut config| {
                if let Some(target) = target {
                    config.target = target;
                }
                run_reconstruct(&config)
            })
        }
        None => {
            Cli::command().print_help().expect("print help");
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Builds `Vn`, runs the greedy selection and pairs the orthonormalised result
/// with `Vn`. `report` receives the pair once it exists.
fn with_greedy_pair(
    config: &ExperimentConfig,
    report: impl FnOnce(&BasisPair) -> Result<(), Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let vn = sine_basis(config.n);
    let dictionary = uniform_dictionary(config.dictionary_size);
    let options = GreedyOptions {
        verbose: config.verbose,
        remove: config.remove,
    };

    log::info!(
        "Selecting {} of {} points for {} sine modes",
        config.m,
        config.dictionary_size,
        config.n
    );
    let mut greedy = GreedyBasisConstructor::new(config.m, dictionary, &vn, options);
    let wm = greedy.construct_basis()?;
    println!("Selected points: {}", format_points(wm));

    let wm_ortho = wm.orthonormalise()?;
    let pair = BasisPair::new(wm_ortho, &vn)?;
    println!("beta(Wm, Vn) = {:.6}", pair.beta()?);
    report(&pair)
}

fn run_greedy(config: &ExperimentConfig) -> Result<(), Box<dyn std::error::Error>> {
    with_greedy_pair(config, |_| Ok(()))
}

fn run_reconstruct(config: &ExperimentConfig) -> Result<(), Box<dyn std::error::Error>> {
    let coeffs: Vec<f64> = if config.target.is_empty() {
        // Default target reaches beyond Vn so the residual correction matters.
        (1..=2 * config.n).map(|k| 1.0 / f64::from(k * k)).collect()
    } else {
        config.target.clone()
    };
    let freqs: Vec<f64> = (1..=coeffs.len()).map(|k| k as f64).collect();
    let u = Vector::from_terms(&[freqs], &[coeffs], &[FunctionKind::Sine])?;

    with_greedy_pair(config, |pair| {
        let rec = pair.measure_and_reconstruct(&u)?;
        println!("|u|          = {:.6e}", u.norm());
        println!("|u - u*|     = {:.6e}", (&u - &rec.u_star).norm());
        println!("|u - v*|     = {:.6e}", (&u - &rec.v_star).norm());
        println!("|u - P_Wm u| = {:.6e}", (&u - &rec.w_reconstruction).norm());
        println!("cond(GᵀG)    = {:.6e}", rec.condition);
        Ok(())
    })
}

fn format_points(basis: &Basis) -> String {
    basis
        .vectors()
        .iter()
        .filter_map(|v| v.terms(FunctionKind::Delta))
        .flat_map(|(params, _)| params.iter().map(|p| format!("{p:.4}")))
        .collect::<Vec<_>>()
        .join(", ")
}
