//! Configuration file support for herdbook.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `HERDBOOK_`, e.g., `HERDBOOK_DATABASE_URL`)
//! 3. Config file (~/.config/herdbook/config.toml or ./herdbook.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/herdbook/herdbook.db"  # optional, this is the default
//!
//! [fei]
//! token = "fei_..."  # or use HERDBOOK_FEI_TOKEN env var
//!
//! [horsetelex]
//! token = "htx_..."  # or use HERDBOOK_HORSETELEX_TOKEN env var
//!
//! [ehorses]
//! host = "https://www.ehorses.com"  # scraped, no token
//!
//! [sync]
//! staleness_days = 7
//! batch_limit = 50
//! pacing_seconds = 2
//!
//! [limits]
//! fei_per_minute = 60
//! horsetelex_per_minute = 30
//! ehorses_per_minute = 10
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use herdbook::entity::prelude::DataSource;
use herdbook::rate_limit;
use herdbook::sync::SyncOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// FEI registry configuration.
    pub fei: FeiConfig,
    /// HorseTelex configuration.
    pub horsetelex: HorsetelexConfig,
    /// ehorses marketplace configuration.
    pub ehorses: EhorsesConfig,
    /// Sync policy knobs.
    pub sync: SyncConfig,
    /// Per-source rate limit quotas.
    pub limits: LimitsConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL. Supports sqlite:// and postgres:// schemes.
    /// Defaults to `sqlite://~/.local/state/herdbook/herdbook.db` if not
    /// specified.
    pub url: Option<String>,
}

/// FEI registry configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FeiConfig {
    /// FEI data API bearer token.
    /// Can also be set via HERDBOOK_FEI_TOKEN environment variable.
    pub token: Option<String>,
    /// Override the API host (for testing against a staging instance).
    pub host: Option<String>,
}

/// HorseTelex configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HorsetelexConfig {
    /// HorseTelex API bearer token.
    /// Can also be set via HERDBOOK_HORSETELEX_TOKEN environment variable.
    pub token: Option<String>,
    /// Override the API host.
    pub host: Option<String>,
}

/// ehorses marketplace configuration. Listing pages need no token.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EhorsesConfig {
    /// Override the marketplace host.
    pub host: Option<String>,
}

/// Sync policy knobs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Re-sync horses whose last sync is older than this many days.
    pub staleness_days: i64,
    /// Maximum horses per batch pass.
    pub batch_limit: u64,
    /// Delay between consecutive horses in a batch pass, in seconds.
    pub pacing_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness_days: herdbook::sync::DEFAULT_STALENESS_DAYS,
            batch_limit: herdbook::sync::DEFAULT_BATCH_LIMIT,
            pacing_seconds: herdbook::sync::DEFAULT_PACING_DELAY.as_secs(),
        }
    }
}

/// Per-source quotas (requests per sliding 60 s window).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub fei_per_minute: u32,
    pub horsetelex_per_minute: u32,
    pub ehorses_per_minute: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            fei_per_minute: rate_limit::quotas::FEI_PER_MINUTE,
            horsetelex_per_minute: rate_limit::quotas::HORSETELEX_PER_MINUTE,
            ehorses_per_minute: rate_limit::quotas::EHORSES_PER_MINUTE,
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/herdbook/config.toml)
    /// 3. Local config file (./herdbook.toml)
    /// 4. Environment variables with HERDBOOK_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "herdbook") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        let local_config = PathBuf::from("herdbook.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./herdbook.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // e.g., HERDBOOK_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("HERDBOOK")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory
    /// path. `mode=rwc` creates the file on first use.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("herdbook.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "herdbook").map(|dirs| {
            dirs.state_dir()
                .map(PathBuf::from)
                .unwrap_or_else(|| dirs.data_local_dir().to_path_buf())
        })
    }

    /// The sync policy knobs as engine options.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            staleness_horizon: chrono::Duration::days(self.sync.staleness_days),
            batch_limit: self.sync.batch_limit,
            pacing_delay: std::time::Duration::from_secs(self.sync.pacing_seconds),
        }
    }

    /// The configured per-source quotas.
    pub fn quotas(&self) -> HashMap<DataSource, u32> {
        let mut quotas = HashMap::new();
        quotas.insert(DataSource::Fei, self.limits.fei_per_minute);
        quotas.insert(DataSource::Horsetelex, self.limits.horsetelex_per_minute);
        quotas.insert(DataSource::Ehorses, self.limits.ehorses_per_minute);
        quotas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sync_options_match_engine_defaults() {
        let config = Config::default();
        let options = config.sync_options();
        assert_eq!(options.staleness_horizon, chrono::Duration::days(7));
        assert_eq!(options.batch_limit, 50);
        assert_eq!(options.pacing_delay, std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_default_quotas_cover_all_sources() {
        let quotas = Config::default().quotas();
        for source in DataSource::ALL {
            assert!(quotas.contains_key(&source));
        }
    }
}
