use std::str::FromStr;

use uuid::Uuid;

use herdbook::cache;
use herdbook::entity::prelude::{DataSource, DataType};

use crate::commands::shared::{connect, CommandResult};
use crate::config::Config;

fn parse_data_type(raw: &str) -> Result<DataType, Box<dyn std::error::Error>> {
    match raw.to_lowercase().as_str() {
        "profile" => Ok(DataType::Profile),
        "pedigree" => Ok(DataType::Pedigree),
        "competitions" => Ok(DataType::Competitions),
        "indices" => Ok(DataType::Indices),
        "sale_listings" => Ok(DataType::SaleListings),
        "live_results" => Ok(DataType::LiveResults),
        other => Err(format!("unknown data type: {other}").into()),
    }
}

pub(crate) async fn handle_cache_cleanup(config: &Config, max_age_days: i64) -> CommandResult {
    let db = connect(config).await?;
    let removed = cache::cleanup(&db, max_age_days).await?;
    println!("Removed {removed} cache entr(ies) expired over {max_age_days} day(s) ago.");
    Ok(())
}

pub(crate) async fn handle_cache_invalidate(
    config: &Config,
    source: &str,
    source_id: &str,
    data_type: Option<&str>,
) -> CommandResult {
    let db = connect(config).await?;
    let source = DataSource::from_str(source)?;
    let data_type = data_type.map(parse_data_type).transpose()?;

    let removed = cache::invalidate(&db, source, source_id, data_type).await?;
    println!("Invalidated {removed} cache entr(ies).");
    Ok(())
}

pub(crate) async fn handle_cache_invalidate_horse(config: &Config, horse_id: Uuid) -> CommandResult {
    let db = connect(config).await?;
    let removed = cache::invalidate_for_owner(&db, horse_id).await?;
    println!("Invalidated {removed} cache entr(ies) for horse {horse_id}.");
    Ok(())
}

pub(crate) async fn handle_cache_stale(
    config: &Config,
    source: Option<&str>,
    limit: u64,
) -> CommandResult {
    let db = connect(config).await?;
    let source = source.map(DataSource::from_str).transpose()?;

    let entries = cache::stale_entries(&db, source, limit).await?;
    if entries.is_empty() {
        println!("No stale cache entries.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "{:<10} {:<14} {:<24} fetched {}  expired {}",
            entry.source.to_string(),
            entry.data_type.to_string(),
            entry.source_id,
            entry.fetched_at.format("%Y-%m-%d %H:%M"),
            entry.expires_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}
