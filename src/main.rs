use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use greenstrain::{FrameWalker, Settings};

const LONG_ABOUT: &str = "\
Computes Green strain (GE) from Nominal strain (NE) and stores it as a new field
output on every archive frame that holds Nominal strain.

Green strain is used in large-rotation, small-strain formulations such as shell
buckling. It follows from

    GE = 1/2 (V * V^T - I)
    V  = NE + I

where V is the stretch tensor in the current configuration.

Settings are read from greenstrain.json in the working directory when present.";

#[derive(Parser)]
#[command(name = "greenstrain", version, about, long_about = LONG_ABOUT)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Adds Green strain to each archive, in the given order
    Run {
        /// Results archives to update
        #[arg(required = true)]
        archives: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let settings = match Settings::discover() {
        Ok(s) => s,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Run { archives } => {
            let report = FrameWalker::new(settings).run(&archives);
            print!("{}", report.summary());

            if report.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}
