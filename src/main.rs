use clap::Parser;
use tracing_subscriber::EnvFilter;

use scoreboard_engine::cli::{run, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so scoreboards and exports stay clean on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(command = ?cli.command, "starting scoreboard");
    run(cli)?;
    Ok(())
}
