//! Species record builder
//!
//! Scientific name is the natural key: rows without one are skipped, and a
//! name that already exists — committed by any earlier dataset, or earlier
//! in the current batch — is silently suppressed rather than updated.

use std::collections::HashSet;

use anyhow::Result;
use tracing::debug;

use super::{BuildReport, RowOutcome, SkipReason};
use crate::ingest::coerce::safe_float;
use crate::ingest::resolve::{resolve, ResolvedView, SynonymTable};
use crate::ingest::table::DataTable;
use crate::models::NewSpecies;
use crate::store::DatasetStore;

/// Canonical species fields and their source-column synonyms, in priority
/// order.
pub const SPECIES_SYNONYMS: SynonymTable = &[
    ("scientific_name", &["scientific_name", "scientificname", "species", "species_name", "name"]),
    ("common_name", &["common_name", "vernacular_name", "commonname", "popular_name"]),
    ("family", &["family"]),
    ("genus", &["genus"]),
    ("kingdom", &["kingdom"]),
    ("phylum", &["phylum"]),
    ("class_name", &["class", "class_name"]),
    ("order_name", &["order", "order_name"]),
    ("habitat", &["habitat", "environment"]),
    ("conservation_status", &["conservation_status", "iucn_status", "status", "redlist_status"]),
    ("commercial_importance", &["commercial_importance", "commercial_value", "fishery_importance"]),
    ("max_length_cm", &["max_length", "length", "max_size", "size"]),
    ("trophic_level", &["trophic_level", "trophic"]),
    ("depth_range_min_m", &["depth_min", "min_depth"]),
    ("depth_range_max_m", &["depth_max", "max_depth"]),
    ("temperature_range_min_c", &["temp_min", "temperature_min", "min_temp"]),
    ("temperature_range_max_c", &["temp_max", "temperature_max", "max_temp"]),
    ("description", &["description", "notes", "remarks"]),
    ("threats", &["threats"]),
];

/// Build species records from a loaded table.
///
/// The store lookup deduplicates against committed data; the in-batch seen
/// set deduplicates within the current table.
pub async fn build_species(
    table: &DataTable,
    dataset_id: i64,
    store: &dyn DatasetStore,
) -> Result<(Vec<NewSpecies>, BuildReport)> {
    let view = resolve(table, SPECIES_SYNONYMS);
    let mut records = Vec::new();
    let mut report = BuildReport::default();
    let mut seen_names: HashSet<String> = HashSet::new();

    for row in 0..table.row_count() {
        match species_row(&view, row, dataset_id, store, &mut seen_names).await? {
            RowOutcome::Built(record) => {
                records.push(record);
                report.built += 1;
            },
            RowOutcome::Skipped(reason) => {
                report.tally(reason);
                debug!(row, %reason, "species row skipped");
            },
        }
    }

    Ok((records, report))
}

async fn species_row(
    view: &ResolvedView<'_>,
    row: usize,
    dataset_id: i64,
    store: &dyn DatasetStore,
    seen_names: &mut HashSet<String>,
) -> Result<RowOutcome<NewSpecies>> {
    let Some(scientific_name) = view.value(row, "scientific_name") else {
        return Ok(RowOutcome::Skipped(SkipReason::MissingRequired("scientific_name")));
    };

    if seen_names.contains(scientific_name) || store.species_name_exists(scientific_name).await? {
        return Ok(RowOutcome::Skipped(SkipReason::Duplicate));
    }
    seen_names.insert(scientific_name.to_string());

    Ok(RowOutcome::Built(NewSpecies {
        dataset_id,
        scientific_name: scientific_name.to_string(),
        common_name: view.text(row, "common_name"),
        kingdom: view
            .text(row, "kingdom")
            .unwrap_or_else(|| "Animalia".to_string()),
        phylum: view.text(row, "phylum"),
        class_name: view.text(row, "class_name"),
        order_name: view.text(row, "order_name"),
        family: view.text(row, "family"),
        genus: view.text(row, "genus"),
        habitat: view.text(row, "habitat"),
        conservation_status: view.text(row, "conservation_status"),
        commercial_importance: view.text(row, "commercial_importance"),
        max_length_cm: safe_float(view.value(row, "max_length_cm")),
        trophic_level: safe_float(view.value(row, "trophic_level")),
        depth_range_min_m: safe_float(view.value(row, "depth_range_min_m")),
        depth_range_max_m: safe_float(view.value(row, "depth_range_max_m")),
        temperature_range_min_c: safe_float(view.value(row, "temperature_range_min_c")),
        temperature_range_max_c: safe_float(view.value(row, "temperature_range_max_c")),
        description: view.text(row, "description"),
        threats: view.text(row, "threats"),
        data_source: format!("dataset_{}", dataset_id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::table::load_table;
    use crate::store::memory::MemoryStore;

    fn species_table(csv: &[u8]) -> DataTable {
        load_table(csv, Some("species.csv")).unwrap()
    }

    #[tokio::test]
    async fn test_rows_without_name_are_skipped() {
        let table = species_table(
            b"scientific_name,family\nThunnus albacares,Scombridae\n,Lutjanidae\nLutjanus bohar,Lutjanidae\n",
        );
        let store = MemoryStore::new();

        let (records, report) = build_species(&table, 1, &store).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.built, 2);
        assert_eq!(report.skipped_missing, 1);
    }

    #[tokio::test]
    async fn test_committed_duplicates_are_suppressed() {
        let table = species_table(b"scientific_name,family\nThunnus albacares,Scombridae\n");
        let store = MemoryStore::new();
        store.seed_species("Thunnus albacares");

        let (records, report) = build_species(&table, 1, &store).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(report.skipped_duplicate, 1);
    }

    #[tokio::test]
    async fn test_in_batch_duplicates_are_suppressed() {
        let table = species_table(
            b"scientific_name,family\nLutjanus bohar,Lutjanidae\nLutjanus bohar,Lutjanidae\n",
        );
        let store = MemoryStore::new();

        let (records, report) = build_species(&table, 1, &store).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.skipped_duplicate, 1);
    }

    #[tokio::test]
    async fn test_malformed_optional_fields_keep_the_row() {
        let table = species_table(
            b"scientific_name,max_length_cm,trophic_level\nEpinephelus tukula,very large,4.1\n",
        );
        let store = MemoryStore::new();

        let (records, report) = build_species(&table, 1, &store).await.unwrap();
        assert_eq!(report.built, 1);
        assert_eq!(records[0].max_length_cm, None);
        assert_eq!(records[0].trophic_level, Some(4.1));
    }

    #[tokio::test]
    async fn test_kingdom_defaults_to_animalia() {
        let table = species_table(b"scientific_name,family\nThunnus albacares,Scombridae\n");
        let store = MemoryStore::new();

        let (records, _) = build_species(&table, 1, &store).await.unwrap();
        assert_eq!(records[0].kingdom, "Animalia");
    }

    #[tokio::test]
    async fn test_synonym_resolution_applies() {
        let table = species_table(
            b"ScientificName,Vernacular_Name,IUCN_Status\nThunnus albacares,Yellowfin tuna,NT\n",
        );
        let store = MemoryStore::new();

        let (records, _) = build_species(&table, 7, &store).await.unwrap();
        assert_eq!(records[0].scientific_name, "Thunnus albacares");
        assert_eq!(records[0].common_name.as_deref(), Some("Yellowfin tuna"));
        assert_eq!(records[0].conservation_status.as_deref(), Some("NT"));
        assert_eq!(records[0].data_source, "dataset_7");
    }
}
