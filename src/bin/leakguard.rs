// src/bin/leakguard.rs
use clap::Parser;
use leakguard_core::cli::{self, Cli};
use leakguard_core::exit::LeakGuardExit;
use leakguard_core::reporting::console;
use tracing_subscriber::EnvFilter;

fn main() -> LeakGuardExit {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = if let Some(cmd) = cli.command {
        cli::dispatch::execute(cmd)
    } else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        Ok(LeakGuardExit::Success)
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            console::print_error(&format!("{e:#}"));
            LeakGuardExit::Error
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "leakguard_core=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
