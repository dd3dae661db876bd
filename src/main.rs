use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;
use log::{debug, error, LevelFilter};

/// Fatal errors are logged here; the target stays enabled whatever `RUST_LOG` says.
const FATAL_TARGET: &str = "pngblue::fatal";

/// Recolor pure black pixels in PNG images to cyan.
///
/// Every FILE.png is written to FILE-blue.png in the same directory. Only
/// non-premultiplied 8-bit RGBA images are converted; other inputs are
/// skipped with a warning.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// PNG images to recolor
    #[arg(value_name = "FILE", allow_hyphen_values = true)]
    files: Vec<String>,
}

fn logger(env: Env) -> env_logger::Builder {
    let mut builder = env_logger::Builder::from_env(env);
    builder.filter_module(FATAL_TARGET, LevelFilter::Error);
    builder
}

fn main() -> ExitCode {
    logger(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match pngblue::run(&cli.files) {
        Ok(summary) => {
            debug!("{} written, {} skipped", summary.written.len(), summary.skipped);
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!(target: FATAL_TARGET, "{:#}", e);
            ExitCode::FAILURE
        },
    }
}
