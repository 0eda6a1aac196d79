use clap::Parser;
use tracing_subscriber::EnvFilter;

use mpra_count::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("mpra_count=debug,info")
    } else {
        EnvFilter::new("mpra_count=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Count(args) => {
            cli::count::run(args, cli.format)?;
        }
        cli::Commands::Merge(args) => {
            cli::merge::run(args, cli.format)?;
        }
        cli::Commands::Run(args) => {
            cli::run::run(args, cli.format)?;
        }
    }

    Ok(())
}
