use clap::Parser;
use cvr_cli::{Cli, run, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.verbose);
    run(cli).await
}
