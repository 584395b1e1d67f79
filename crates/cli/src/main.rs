use clap::Parser;
use runguard::cli::Cli;
use std::sync::Arc;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = cli.load_config()?;

    runguard_utils::tracing::init(&config.logging)
        .map_err(|e| eyre::eyre!("failed to initialise logging: {e}"))?;

    cli.command.execute(Arc::new(config)).await
}
