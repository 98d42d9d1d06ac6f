//! rw - command-line entry point

use std::process::ExitCode;

use realmwork::cli::{self, Cli};
use realmwork::core::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let result = Config::load()
        .map_err(anyhow::Error::from)
        .and_then(|config| {
            setup_tracing(&cli, &config);
            cli::run(cli, config)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `--debug`, which wins over the
/// global config's `log_filter`.
fn setup_tracing(cli: &Cli, config: &Config) {
    let fallback = if cli.debug {
        "realmwork=debug"
    } else if cli.quiet {
        "error"
    } else {
        config.log_filter().unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
