use anyhow::Result;
use clap::Parser;
use service_migrator::cli::{print_summary, MigrationRun, ServiceMigratorCli};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ServiceMigratorCli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Starting service-migrator v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping before the next instance");
                cancel.cancel();
            }
        });
    }

    let run = MigrationRun::prepare(&cli, cancel)?;
    let result = run.execute(&cli.command, cli.non_interactive).await;

    // printed even when the command aborted
    print_summary(run.summary());

    result?;
    Ok(())
}
