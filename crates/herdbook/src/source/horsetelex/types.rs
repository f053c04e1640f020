//! Wire types for the HorseTelex API.

use serde::Deserialize;

/// Pedigree response from `/horses/{id}/pedigree`. The response also
/// carries the full ancestry tree; only the offspring list feeds the
/// timeline, so only it is modeled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelexPedigree {
    #[serde(default)]
    pub offspring: Vec<TelexOffspring>,
}

/// One registered offspring.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelexOffspring {
    pub id: String,
    pub name: String,
    /// Birth date, `YYYY-MM-DD`.
    pub born: String,
    /// The other parent.
    #[serde(default)]
    pub other_parent: Option<String>,
}

/// Indices snapshot from `/horses/{id}/indices`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelexIndices {
    pub snapshot_id: String,
    /// Publication date, `YYYY-MM-DD`.
    pub published: String,
    /// Index name -> value, e.g. {"jumping": 134, "dressage": 92}.
    pub indices: std::collections::BTreeMap<String, f64>,
}
