//! Wire types for the FEI data API.

use serde::Deserialize;

/// Horse profile response from `/horses/{feiId}`. The response carries more
/// fields (nationality, birth year, studbook); only what the mapping reads
/// is modeled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeiHorse {
    pub name: String,
    #[serde(default)]
    pub owners: Vec<FeiOwner>,
}

/// One entry of a horse's ownership history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeiOwner {
    pub name: String,
    /// Date the ownership was registered, `YYYY-MM-DD`.
    pub since: String,
}

/// One competition result from `/horses/{feiId}/results`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeiResult {
    #[serde(default)]
    pub event_id: Option<String>,
    /// Competition date, `YYYY-MM-DD`.
    pub date: String,
    /// Show name, e.g. "CSI3* Aachen".
    pub show: String,
    /// Competition within the show, e.g. "Grand Prix 1.55m".
    pub competition: String,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub rider: Option<String>,
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
}
