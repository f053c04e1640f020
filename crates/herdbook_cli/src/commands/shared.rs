//! Shared wiring: database connection and engine construction from config.

use std::sync::Arc;

use herdbook::source::ehorses::EhorsesClient;
use herdbook::source::fei::FeiClient;
use herdbook::source::horsetelex::HorsetelexClient;
use herdbook::source::SourceAdapter;
use herdbook::{SourceRateLimiter, SyncEngine};

use crate::config::Config;

pub(crate) type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Resolve the database URL or fail with a actionable message.
pub(crate) fn database_url(config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    config
        .database_url()
        .ok_or_else(|| "no database URL configured; set HERDBOOK_DATABASE_URL or [database].url".into())
}

/// Connect and migrate, the standard entry point for every command that
/// touches data.
pub(crate) async fn connect(
    config: &Config,
) -> Result<Arc<sea_orm::DatabaseConnection>, Box<dyn std::error::Error>> {
    let url = database_url(config)?;
    let db = herdbook::connect_and_migrate(&url).await?;
    Ok(Arc::new(db))
}

/// Build the sync engine with every adapter the configuration has
/// credentials for. Registry adapters without a token are skipped with a
/// warning - a horse's sync then simply reports fewer sources.
pub(crate) async fn build_engine(
    config: &Config,
) -> Result<SyncEngine, Box<dyn std::error::Error>> {
    let db = connect(config).await?;

    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    match &config.fei.token {
        Some(token) => {
            let client = match &config.fei.host {
                Some(host) => FeiClient::new_with_transport(
                    host,
                    token,
                    Arc::new(herdbook::http::ReqwestTransport::default()),
                ),
                None => FeiClient::new(token),
            };
            adapters.push(Arc::new(client));
        }
        None => tracing::warn!("no FEI token configured, skipping fei source"),
    }

    match &config.horsetelex.token {
        Some(token) => {
            let client = match &config.horsetelex.host {
                Some(host) => HorsetelexClient::new_with_transport(
                    host,
                    token,
                    Arc::new(herdbook::http::ReqwestTransport::default()),
                ),
                None => HorsetelexClient::new(token),
            };
            adapters.push(Arc::new(client));
        }
        None => tracing::warn!("no HorseTelex token configured, skipping horsetelex source"),
    }

    let ehorses = match &config.ehorses.host {
        Some(host) => EhorsesClient::new_with_transport(
            host,
            Arc::new(herdbook::http::ReqwestTransport::default()),
        ),
        None => EhorsesClient::new(),
    };
    adapters.push(Arc::new(ehorses));

    let limiter = SourceRateLimiter::with_quotas(config.quotas());

    Ok(SyncEngine::new(
        db,
        limiter,
        adapters,
        config.sync_options(),
    ))
}
