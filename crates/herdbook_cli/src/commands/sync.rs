use uuid::Uuid;

use crate::commands::shared::{build_engine, CommandResult};
use crate::config::Config;

pub(crate) async fn handle_sync_horse(config: &Config, id: Uuid) -> CommandResult {
    let engine = build_engine(config).await?;
    let result = engine.sync_horse(id).await?;

    println!(
        "Synced horse {} in {:.1}s",
        result.horse_id,
        result.duration.as_secs_f64()
    );
    println!(
        "  sources: {}",
        result
            .sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  added: {}, updated: {}", result.added, result.updated);
    for error in &result.errors {
        println!("  error: {error}");
    }
    println!(
        "  status: {}",
        if result.success { "synced" } else { "error" }
    );

    Ok(())
}

pub(crate) async fn handle_sync_batch(config: &Config) -> CommandResult {
    let engine = build_engine(config).await?;
    let result = engine.sync_batch().await?;

    println!(
        "Batch pass: {} attempted, {} synced, {} failed",
        result.attempted, result.synced, result.failed
    );
    println!("  added: {}, updated: {}", result.added, result.updated);
    for error in result.errors.iter().take(10) {
        println!("  error: {error}");
    }
    if result.errors.len() > 10 {
        println!("  ... and {} more errors", result.errors.len() - 10);
    }

    Ok(())
}
