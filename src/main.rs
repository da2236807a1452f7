use std::process::ExitCode;

use gitblog::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("gitblog=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitblog=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    tracing::debug!("gitblog starting with args: {:?}", cli);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
