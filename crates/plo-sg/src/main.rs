//! `plo-sg` command-line tool.

use clap::Parser;
use plo_sg::cli::{self, Args};
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("plo-sg v{}", plo_sg::VERSION);

    let stdout = std::io::stdout();
    let code = cli::run(&args, &mut stdout.lock());
    std::process::exit(code);
}
