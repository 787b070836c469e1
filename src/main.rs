use std::sync::mpsc::TryRecvError;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use elite_journal_store::config::Config;
use elite_journal_store::session::Session;

fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.env_filter_directive().parse()?),
        )
        .init();

    if config.backfill_only {
        info!("backfilling historical journals from {}", config.dir().display());
        Session::backfill_only(&config)?;
        return Ok(());
    }

    info!("watching {} (database: {})", config.dir().display(), config.database().display());
    let (session, subscriptions) = Session::spawn(config)?;

    // No presentation layer in this binary: drain notifications so the
    // channels don't grow unbounded, and exit once the ingestion thread has
    // gone away (journal directory empty, or the process is being torn down).
    loop {
        std::thread::sleep(Duration::from_millis(200));
        while subscriptions.system.try_recv().is_ok() {}
        while subscriptions.ship.try_recv().is_ok() {}
        while subscriptions.route.try_recv().is_ok() {}
        while subscriptions.missions.try_recv().is_ok() {}

        if matches!(subscriptions.system.try_recv(), Err(TryRecvError::Disconnected)) {
            break;
        }
    }

    drop(session);
    Ok(())
}
