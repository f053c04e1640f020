use herdbook::store;
use herdbook::JobRunner;

use crate::commands::shared::{build_engine, connect, CommandResult};
use crate::config::Config;

pub(crate) async fn handle_jobs_list(config: &Config, limit: u64) -> CommandResult {
    let db = connect(config).await?;
    let jobs = store::job::list_recent(&db, limit).await?;

    if jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }

    for job in jobs {
        let when = job
            .completed_at
            .or(job.started_at)
            .unwrap_or(job.created_at);
        println!(
            "{}  {:<14} {:<10} {:<9} found={} processed={}  {}",
            job.id,
            job.job_type.to_string(),
            job.source.to_string(),
            job.status.to_string(),
            job.items_found,
            job.items_processed,
            when.format("%Y-%m-%d %H:%M"),
        );
        if let Some(error) = job.error {
            println!("    error: {error}");
        }
    }

    Ok(())
}

pub(crate) async fn handle_jobs_drain(config: &Config, limit: u64) -> CommandResult {
    let engine = build_engine(config).await?;
    let runner = JobRunner::new(engine);
    let summary = runner.drain_due(limit).await?;

    println!(
        "Drained {} job(s): {} completed, {} failed",
        summary.picked, summary.completed, summary.failed
    );

    Ok(())
}
