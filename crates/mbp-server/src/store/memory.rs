//! In-memory dataset store for pipeline tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::DatasetStore;
use crate::models::{
    Dataset, DatasetType, IngestMetrics, NewDataset, NewEdnaSample, NewOceanObservation,
    NewSpecies, RecordBatch,
};

#[derive(Default)]
struct Inner {
    datasets: Vec<Dataset>,
    species: Vec<NewSpecies>,
    ocean: Vec<NewOceanObservation>,
    edna: Vec<NewEdnaSample>,
    next_id: i64,
}

/// Mutex-guarded store double mirroring the Postgres semantics, including
/// an optional forced commit failure for exercising the rollback path.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `commit_ingest` fail, as a persistence fault
    /// would.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Seed a committed species row, as a previous ingestion run would have.
    pub fn seed_species(&self, scientific_name: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.species.push(NewSpecies {
            dataset_id: 0,
            scientific_name: scientific_name.to_string(),
            common_name: None,
            kingdom: "Animalia".to_string(),
            phylum: None,
            class_name: None,
            order_name: None,
            family: None,
            genus: None,
            habitat: None,
            conservation_status: None,
            commercial_importance: None,
            max_length_cm: None,
            trophic_level: None,
            depth_range_min_m: None,
            depth_range_max_m: None,
            temperature_range_min_c: None,
            temperature_range_max_c: None,
            description: None,
            threats: None,
            data_source: "seed".to_string(),
        });
    }

    pub fn species_count(&self) -> usize {
        self.inner.lock().unwrap().species.len()
    }

    pub fn ocean_count(&self) -> usize {
        self.inner.lock().unwrap().ocean.len()
    }

    pub fn edna_count(&self) -> usize {
        self.inner.lock().unwrap().edna.len()
    }

    pub fn species_names(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .species
            .iter()
            .map(|s| s.scientific_name.clone())
            .collect()
    }

    pub fn edna_samples(&self) -> Vec<NewEdnaSample> {
        self.inner.lock().unwrap().edna.clone()
    }

    pub fn ocean_observations(&self) -> Vec<NewOceanObservation> {
        self.inner.lock().unwrap().ocean.clone()
    }
}

#[async_trait]
impl DatasetStore for MemoryStore {
    async fn create_dataset(&self, new: NewDataset) -> Result<Dataset> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let dataset = Dataset {
            id: inner.next_id,
            name: new.name,
            dataset_type: new.dataset_type,
            source_type: new.source_type,
            original_filename: new.original_filename,
            file_size_mb: new.file_size_mb,
            content_sha256: new.content_sha256,
            description: new.description,
            region: new.region,
            uploaded_at: Utc::now(),
            processed: false,
            processing_errors: None,
            records_count: 0,
            data_quality_score: None,
            completeness_percentage: None,
        };
        inner.datasets.push(dataset.clone());
        Ok(dataset)
    }

    async fn dataset(&self, id: i64) -> Result<Option<Dataset>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.datasets.iter().find(|d| d.id == id).cloned())
    }

    async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let inner = self.inner.lock().unwrap();
        let mut datasets = inner.datasets.clone();
        datasets.reverse();
        Ok(datasets)
    }

    async fn species_name_exists(&self, scientific_name: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .species
            .iter()
            .any(|s| s.scientific_name == scientific_name))
    }

    async fn commit_ingest(
        &self,
        dataset_id: i64,
        resolved_type: DatasetType,
        batch: RecordBatch,
        metrics: IngestMetrics,
    ) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("forced commit failure"));
        }

        let mut inner = self.inner.lock().unwrap();
        match batch {
            RecordBatch::Species(records) => {
                for record in records {
                    // Same conflict policy as the unique constraint: first
                    // committed name wins.
                    if !inner
                        .species
                        .iter()
                        .any(|s| s.scientific_name == record.scientific_name)
                    {
                        inner.species.push(record);
                    }
                }
            },
            RecordBatch::Ocean(records) => inner.ocean.extend(records),
            RecordBatch::Edna(records) => inner.edna.extend(records),
        }

        let dataset = inner
            .datasets
            .iter_mut()
            .find(|d| d.id == dataset_id)
            .ok_or_else(|| anyhow!("dataset {} not found", dataset_id))?;
        dataset.dataset_type = resolved_type;
        dataset.processed = true;
        dataset.processing_errors = None;
        dataset.records_count = metrics.records_count;
        dataset.data_quality_score = Some(metrics.data_quality_score);
        dataset.completeness_percentage = Some(metrics.completeness_percentage);

        Ok(())
    }

    async fn record_failure(&self, dataset_id: i64, message: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let dataset = inner
            .datasets
            .iter_mut()
            .find(|d| d.id == dataset_id)
            .ok_or_else(|| anyhow!("dataset {} not found", dataset_id))?;
        dataset.processed = false;
        dataset.processing_errors = Some(message.to_string());
        dataset.records_count = 0;
        Ok(())
    }
}
