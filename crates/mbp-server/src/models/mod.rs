//! Domain records for the marine-biodiversity schema
//!
//! A `Dataset` is the provenance record for one ingested file. The per-domain
//! records (`NewSpecies`, `NewOceanObservation`, `NewEdnaSample`) are staged
//! by the ingestion builders and committed as a batch.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Domain category of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    Species,
    Ocean,
    Edna,
    Routes,
    Other,
    Unknown,
}

impl DatasetType {
    pub fn as_str(&self) -> &str {
        match self {
            DatasetType::Species => "species",
            DatasetType::Ocean => "ocean",
            DatasetType::Edna => "edna",
            DatasetType::Routes => "routes",
            DatasetType::Other => "other",
            DatasetType::Unknown => "unknown",
        }
    }
}

impl From<&str> for DatasetType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "species" => DatasetType::Species,
            "ocean" => DatasetType::Ocean,
            "edna" => DatasetType::Edna,
            "routes" => DatasetType::Routes,
            "other" => DatasetType::Other,
            _ => DatasetType::Unknown,
        }
    }
}

impl From<String> for DatasetType {
    fn from(s: String) -> Self {
        DatasetType::from(s.as_str())
    }
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a dataset reached the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Upload,
    Api,
}

impl SourceType {
    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Upload => "upload",
            SourceType::Api => "api",
        }
    }
}

impl From<String> for SourceType {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "api" => SourceType::Api,
            _ => SourceType::Upload,
        }
    }
}

/// Provenance record for one ingested batch
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub id: i64,
    pub name: String,
    pub dataset_type: DatasetType,
    pub source_type: SourceType,
    pub original_filename: Option<String>,
    pub file_size_mb: Option<f64>,
    pub content_sha256: Option<String>,
    pub description: Option<String>,
    pub region: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub processed: bool,
    pub processing_errors: Option<String>,
    pub records_count: i64,
    pub data_quality_score: Option<f64>,
    pub completeness_percentage: Option<f64>,
}

/// Fields required to register a new dataset (pending, unprocessed)
#[derive(Debug, Clone)]
pub struct NewDataset {
    pub name: String,
    pub dataset_type: DatasetType,
    pub source_type: SourceType,
    pub original_filename: Option<String>,
    pub file_size_mb: Option<f64>,
    pub content_sha256: Option<String>,
    pub description: Option<String>,
    pub region: Option<String>,
}

/// One taxonomic entity, keyed globally by scientific name
#[derive(Debug, Clone, PartialEq)]
pub struct NewSpecies {
    pub dataset_id: i64,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub kingdom: String,
    pub phylum: Option<String>,
    pub class_name: Option<String>,
    pub order_name: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub habitat: Option<String>,
    pub conservation_status: Option<String>,
    pub commercial_importance: Option<String>,
    pub max_length_cm: Option<f64>,
    pub trophic_level: Option<f64>,
    pub depth_range_min_m: Option<f64>,
    pub depth_range_max_m: Option<f64>,
    pub temperature_range_min_c: Option<f64>,
    pub temperature_range_max_c: Option<f64>,
    pub description: Option<String>,
    pub threats: Option<String>,
    pub data_source: String,
}

/// One oceanographic measurement event (append-only, no natural key)
#[derive(Debug, Clone, PartialEq)]
pub struct NewOceanObservation {
    pub dataset_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_m: Option<f64>,
    pub temperature_c: Option<f64>,
    pub salinity_psu: Option<f64>,
    pub ph_level: Option<f64>,
    pub dissolved_oxygen_ml_l: Option<f64>,
    pub chlorophyll_a_mg_m3: Option<f64>,
    pub turbidity_ntu: Option<f64>,
    pub nitrate_mg_l: Option<f64>,
    pub phosphate_mg_l: Option<f64>,
    pub region: Option<String>,
    pub location_name: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub data_source: String,
    pub quality_flag: String,
}

/// One environmental-DNA sample, keyed by sample id
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdnaSample {
    pub dataset_id: i64,
    pub sample_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub depth_m: Option<f64>,
    pub collection_date: NaiveDate,
    pub total_reads: Option<i64>,
    pub quality_reads: Option<i64>,
    pub species_detected: Option<i64>,
    pub shannon_diversity: Option<f64>,
    pub simpson_diversity: Option<f64>,
    pub processing_lab: Option<String>,
    pub sequencing_platform: Option<String>,
    pub location_description: Option<String>,
    /// Dominant taxa / rare-taxa count / environmental conditions, when present
    pub taxa_summary: Option<serde_json::Value>,
}

/// Batch of staged domain records, one variant per supported dataset type
#[derive(Debug, Clone)]
pub enum RecordBatch {
    Species(Vec<NewSpecies>),
    Ocean(Vec<NewOceanObservation>),
    Edna(Vec<NewEdnaSample>),
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Species(v) => v.len(),
            RecordBatch::Ocean(v) => v.len(),
            RecordBatch::Edna(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Quality metrics computed from the input table snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngestMetrics {
    pub records_count: i64,
    pub data_quality_score: f64,
    pub completeness_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_type_round_trip() {
        for ty in [
            DatasetType::Species,
            DatasetType::Ocean,
            DatasetType::Edna,
            DatasetType::Routes,
            DatasetType::Other,
            DatasetType::Unknown,
        ] {
            assert_eq!(DatasetType::from(ty.as_str()), ty);
        }
    }

    #[test]
    fn test_dataset_type_from_unrecognized() {
        assert_eq!(DatasetType::from("Mystery"), DatasetType::Unknown);
        assert_eq!(DatasetType::from(""), DatasetType::Unknown);
    }

    #[test]
    fn test_dataset_type_case_insensitive() {
        assert_eq!(DatasetType::from("Species"), DatasetType::Species);
        assert_eq!(DatasetType::from("EDNA"), DatasetType::Edna);
    }
}
