use log::{error, info};
use std::process;

use projectile_analyze::config::Command;
use projectile_analyze::{grid, run_analysis, RunOutcome};

fn main() {

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // parse command line options
    let command = match Command::new() {
        Ok(command) => command,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    match command {
        Command::Analyze(config) => match run_analysis(&config) {
            Ok(RunOutcome::Complete { .. }) => {}
            Ok(RunOutcome::CsvOnly { csv_path, error }) => {
                error!("LaTeX table not written ({}), {} is complete", error, csv_path.display());
                process::exit(2);
            }
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
        Command::Grid(config) => {
            match grid::generate(&config.template_dir, &config.output_root, &config.params) {
                Ok(_) => info!("Directories and dft.inp files have been successfully updated."),
                Err(e) => {
                    error!("{}", e);
                    process::exit(1);
                }
            }
        }
    }
}
