//! Environmental-DNA sample builder
//!
//! Samples are keyed by sample id; rows also need usable coordinates. The
//! taxa summary (dominant taxa, rare-taxa count, environmental conditions)
//! is folded into one structured JSON blob per sample.

use std::collections::HashSet;

use anyhow::Result;
use serde_json::json;
use tracing::debug;

use super::{BuildReport, RowOutcome, SkipReason};
use crate::ingest::coerce::{parse_date, safe_float, safe_int};
use crate::ingest::resolve::{resolve, ResolvedView, SynonymTable};
use crate::ingest::table::DataTable;
use crate::models::NewEdnaSample;

/// Canonical eDNA fields and their source-column synonyms, in priority
/// order.
pub const EDNA_SYNONYMS: SynonymTable = &[
    ("sample_id", &["sample_id", "sampleid", "sample"]),
    ("latitude", &["latitude", "lat"]),
    ("longitude", &["longitude", "lon", "lng"]),
    ("depth_m", &["depth"]),
    ("collection_date", &["collection_date", "date_collected", "sampling_date", "date"]),
    ("total_reads", &["total_reads", "reads_total"]),
    ("quality_reads", &["quality_reads", "reads_passing"]),
    ("species_detected", &["species_detected", "taxa_detected"]),
    ("shannon_diversity", &["shannon"]),
    ("simpson_diversity", &["simpson"]),
    ("processing_lab", &["processing_lab", "lab"]),
    ("sequencing_platform", &["sequencing_platform", "platform", "sequencer"]),
    ("location_description", &["location_name", "location_description", "location"]),
    ("dominant_taxa", &["dominant_taxa"]),
    ("rare_taxa_count", &["rare_taxa"]),
    ("environmental_conditions", &["environmental_conditions", "env_conditions"]),
];

/// Build eDNA sample records from a loaded table.
pub fn build_edna(table: &DataTable, dataset_id: i64) -> Result<(Vec<NewEdnaSample>, BuildReport)> {
    let view = resolve(table, EDNA_SYNONYMS);
    let mut records = Vec::new();
    let mut report = BuildReport::default();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for row in 0..table.row_count() {
        match edna_row(&view, row, dataset_id, &mut seen_ids) {
            RowOutcome::Built(record) => {
                records.push(record);
                report.built += 1;
            },
            RowOutcome::Skipped(reason) => {
                report.tally(reason);
                debug!(row, %reason, "edna row skipped");
            },
        }
    }

    Ok((records, report))
}

fn edna_row(
    view: &ResolvedView<'_>,
    row: usize,
    dataset_id: i64,
    seen_ids: &mut HashSet<String>,
) -> RowOutcome<NewEdnaSample> {
    let Some(sample_id) = view.value(row, "sample_id") else {
        return RowOutcome::Skipped(SkipReason::MissingRequired("sample_id"));
    };

    if seen_ids.contains(sample_id) {
        return RowOutcome::Skipped(SkipReason::Duplicate);
    }

    let latitude = safe_float(view.value(row, "latitude"));
    let longitude = safe_float(view.value(row, "longitude"));
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return RowOutcome::Skipped(SkipReason::MissingRequired("coordinates"));
    };

    seen_ids.insert(sample_id.to_string());

    let dominant_taxa = view.text(row, "dominant_taxa");
    let rare_taxa_count = safe_int(view.value(row, "rare_taxa_count"));
    let environmental_conditions = view.text(row, "environmental_conditions");
    let taxa_summary = if dominant_taxa.is_some()
        || rare_taxa_count.is_some()
        || environmental_conditions.is_some()
    {
        Some(json!({
            "dominant_taxa": dominant_taxa,
            "rare_taxa_count": rare_taxa_count,
            "environmental_conditions": environmental_conditions,
        }))
    } else {
        None
    };

    RowOutcome::Built(NewEdnaSample {
        dataset_id,
        sample_id: sample_id.to_string(),
        latitude,
        longitude,
        depth_m: safe_float(view.value(row, "depth_m")),
        collection_date: parse_date(view.value(row, "collection_date")),
        total_reads: safe_int(view.value(row, "total_reads")),
        quality_reads: safe_int(view.value(row, "quality_reads")),
        species_detected: safe_int(view.value(row, "species_detected")),
        shannon_diversity: safe_float(view.value(row, "shannon_diversity")),
        simpson_diversity: safe_float(view.value(row, "simpson_diversity")),
        processing_lab: view.text(row, "processing_lab"),
        sequencing_platform: view.text(row, "sequencing_platform"),
        location_description: view.text(row, "location_description"),
        taxa_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::table::load_table;
    use chrono::NaiveDate;

    fn edna_table(csv: &[u8]) -> DataTable {
        load_table(csv, Some("edna.csv")).unwrap()
    }

    #[test]
    fn test_rows_without_sample_id_are_skipped() {
        let table = edna_table(
            b"sample_id,latitude,longitude\nEDNA-001,-4.6,55.4\n,-4.7,55.5\n",
        );
        let (records, report) = build_edna(&table, 5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.skipped_missing, 1);
    }

    #[test]
    fn test_rows_without_coordinates_are_skipped() {
        let table = edna_table(
            b"sample_id,latitude,longitude\nEDNA-001,-4.6,55.4\nEDNA-002,,55.5\n",
        );
        let (records, report) = build_edna(&table, 5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sample_id, "EDNA-001");
        assert_eq!(report.skipped_missing, 1);
    }

    #[test]
    fn test_duplicate_sample_ids_within_batch() {
        let table = edna_table(
            b"sample_id,latitude,longitude\nEDNA-001,-4.6,55.4\nEDNA-001,-4.7,55.5\n",
        );
        let (records, report) = build_edna(&table, 5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.skipped_duplicate, 1);
    }

    #[test]
    fn test_collection_date_parses() {
        let table = edna_table(
            b"sample_id,latitude,longitude,collection_date\nEDNA-001,-4.6,55.4,2024-02-20\n",
        );
        let (records, _) = build_edna(&table, 5).unwrap();
        assert_eq!(
            records[0].collection_date,
            NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
        );
    }

    #[test]
    fn test_sequencing_metrics_coerce() {
        let table = edna_table(
            b"sample_id,latitude,longitude,total_reads,shannon_diversity\nEDNA-001,-4.6,55.4,48213,3.42\n",
        );
        let (records, _) = build_edna(&table, 5).unwrap();
        assert_eq!(records[0].total_reads, Some(48213));
        assert_eq!(records[0].shannon_diversity, Some(3.42));
    }

    #[test]
    fn test_taxa_summary_json() {
        let table = edna_table(
            b"sample_id,latitude,longitude,dominant_taxa,rare_taxa_count,environmental_conditions\nEDNA-001,-4.6,55.4,Clupeidae,7,monsoon swell\n",
        );
        let (records, _) = build_edna(&table, 5).unwrap();
        let summary = records[0].taxa_summary.as_ref().unwrap();
        assert_eq!(summary["dominant_taxa"], "Clupeidae");
        assert_eq!(summary["rare_taxa_count"], 7);
        assert_eq!(summary["environmental_conditions"], "monsoon swell");
    }

    #[test]
    fn test_taxa_summary_absent_without_inputs() {
        let table = edna_table(b"sample_id,latitude,longitude\nEDNA-001,-4.6,55.4\n");
        let (records, _) = build_edna(&table, 5).unwrap();
        assert!(records[0].taxa_summary.is_none());
    }
}
