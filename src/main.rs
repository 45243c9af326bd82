use std::process::ExitCode;

use clap::Parser;
use delve::{app, cli::Cli, loader::FsLoader, progress};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DELVE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let settings = cli.settings();
    let mut backend = cli.backend();
    let loader = FsLoader::new(&settings.data_folder);

    let result = app::run(
        &settings,
        &loader,
        &mut backend,
        progress::terminal_or_silent,
        std::io::stdin().lock(),
        std::io::stdout().lock(),
    );

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
