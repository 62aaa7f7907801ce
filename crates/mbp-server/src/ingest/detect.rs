//! Dataset type detection from column names
//!
//! Priority cascade: taxonomic columns are the most distinctive signal, so
//! any species indicator decides immediately. Oceanographic terms are
//! generic words that collide with unrelated tables, so Ocean requires at
//! least three of them. eDNA indicators are checked last.

use crate::models::DatasetType;

const SPECIES_INDICATORS: &[&str] =
    &["scientific_name", "species", "family", "genus", "common_name"];

const OCEAN_INDICATORS: &[&str] =
    &["temperature", "salinity", "ph", "depth", "latitude", "longitude"];

const EDNA_INDICATORS: &[&str] = &["sample_id", "reads", "sequences", "diversity"];

/// Classify a table by its column names.
///
/// Species indicators must equal a column name exactly (case-folded); ocean
/// and eDNA indicators match as substrings of the joined column names.
pub fn detect_dataset_type(columns: &[String]) -> DatasetType {
    let lowered: Vec<String> = columns.iter().map(|c| c.to_lowercase()).collect();

    if lowered
        .iter()
        .any(|name| SPECIES_INDICATORS.contains(&name.as_str()))
    {
        return DatasetType::Species;
    }

    let joined = lowered.join(" ");

    let ocean_hits = OCEAN_INDICATORS
        .iter()
        .filter(|indicator| joined.contains(*indicator))
        .count();
    if ocean_hits >= 3 {
        return DatasetType::Ocean;
    }

    if EDNA_INDICATORS
        .iter()
        .any(|indicator| joined.contains(indicator))
    {
        return DatasetType::Edna;
    }

    DatasetType::Other
}
