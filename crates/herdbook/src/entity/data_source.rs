//! Data source enum for type-safe handling of external registries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// External registries and marketplaces horse data is ingested from.
///
/// Each variant corresponds to one source adapter; the variant is also the
/// keying value for the fetch cache and the rate limiter.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum DataSource {
    /// FEI competition registry (results and horse passports).
    #[sea_orm(string_value = "fei")]
    Fei,
    /// HorseTelex pedigree and breeding-value database.
    #[sea_orm(string_value = "horsetelex")]
    Horsetelex,
    /// ehorses sales marketplace (scraped listings).
    #[sea_orm(string_value = "ehorses")]
    Ehorses,
}

impl DataSource {
    /// All known sources, in adapter registration order.
    pub const ALL: [DataSource; 3] = [DataSource::Fei, DataSource::Horsetelex, DataSource::Ehorses];
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Fei => write!(f, "fei"),
            DataSource::Horsetelex => write!(f, "horsetelex"),
            DataSource::Ehorses => write!(f, "ehorses"),
        }
    }
}

impl std::str::FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fei" => Ok(DataSource::Fei),
            "horsetelex" => Ok(DataSource::Horsetelex),
            "ehorses" => Ok(DataSource::Ehorses),
            _ => Err(format!("Unknown data source: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_from_str() {
        for source in DataSource::ALL {
            assert_eq!(source.to_string().parse::<DataSource>().unwrap(), source);
        }
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        assert!("tack-shop".parse::<DataSource>().is_err());
    }
}
