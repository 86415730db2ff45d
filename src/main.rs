//! Command line entry point for a coupled run of the reference models.

use clap::{ArgAction, Parser};
use hydrocouple_core::scheduler::ConfigPaths;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hydrocouple", version)]
#[command(about = "Run coupled forcing, evapotranspiration, runoff, freeze-thaw and soil moisture models")]
struct Cli {
    /// Runoff model configuration
    runoff: PathBuf,

    /// Forcing model configuration
    forcing: PathBuf,

    /// Evapotranspiration model configuration
    evapotranspiration: PathBuf,

    /// Freeze-thaw model configuration. Its forcing_file supplies the ground temperature series
    freeze_thaw: PathBuf,

    /// Soil moisture profile model configuration
    soil_moisture_profile: PathBuf,

    /// TOML file with coupling options
    #[arg(long)]
    coupling_config: Option<PathBuf>,

    /// More output. Repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config_paths(&self) -> ConfigPaths {
        ConfigPaths {
            runoff: self.runoff.clone(),
            forcing: self.forcing.clone(),
            evapotranspiration: self.evapotranspiration.clone(),
            freeze_thaw: self.freeze_thaw.clone(),
            soil_moisture_profile: self.soil_moisture_profile.clone(),
        }
    }
}

/// Log to stdout. `RUST_LOG` takes precedence over the verbosity flag.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            print!("{}", err.render());
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    let mut config = match hydrocouple::load_config(cli.coupling_config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };
    config.verbosity = config.verbosity.max(cli.verbose);

    match hydrocouple::run(&cli.config_paths(), config) {
        Ok(summary) => {
            let mismatched = summary
                .consistency
                .iter()
                .filter(|report| !report.is_consistent())
                .count();
            info!(
                steps = summary.steps,
                mismatched_steps = mismatched,
                residual = summary.mass_balance.residual(),
                "Coupled run complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
