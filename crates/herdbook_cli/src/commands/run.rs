use herdbook::{Scheduler, SchedulerConfig};

use crate::commands::shared::{build_engine, CommandResult};
use crate::config::Config;

/// Run the scheduler in the foreground until ctrl-c.
pub(crate) async fn handle_run(config: &Config) -> CommandResult {
    let engine = build_engine(config).await?;
    let scheduler = Scheduler::new(engine, SchedulerConfig::default());

    println!("Scheduler running; press ctrl-c to stop.");
    let handle = scheduler.start();

    tokio::signal::ctrl_c().await?;
    println!("Shutting down...");
    handle.shutdown().await;
    println!("Scheduler stopped.");

    Ok(())
}
