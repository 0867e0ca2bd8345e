use std::io;

use clap::Parser;
use credvault::cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init => credvault::cli::commands::init::execute(&cli),
        Commands::Add {
            ref service,
            ref username,
            force,
        } => credvault::cli::commands::add::execute(&cli, service, username.as_deref(), force),
        Commands::Update {
            ref service,
            ref username,
        } => credvault::cli::commands::update::execute(&cli, service, username.as_deref()),
        Commands::Get { ref service, show } => {
            credvault::cli::commands::get::execute(&cli, service, show)
        }
        Commands::List => credvault::cli::commands::list::execute(&cli),
        Commands::Delete { ref service, force } => {
            credvault::cli::commands::delete::execute(&cli, service, force)
        }
        Commands::Completions { shell } => credvault::cli::commands::completions::execute(shell),
    };

    if let Err(e) = result {
        credvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Log to stderr; `CREDVAULT_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let default = if verbose { "credvault=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_env("CREDVAULT_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
