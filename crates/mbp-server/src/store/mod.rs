//! Persistence collaborator for the ingestion pipeline
//!
//! The core never talks SQL directly; it goes through [`DatasetStore`],
//! which exposes dataset provenance updates, the species natural-key
//! lookup, and the transactional batch commit. Transaction isolation is the
//! backing store's own mechanism — there are no application-level locks.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Dataset, DatasetType, IngestMetrics, NewDataset, RecordBatch};

pub mod pg;

#[cfg(test)]
pub mod memory;

pub use pg::PgDatasetStore;

/// Storage operations the ingestion core depends on.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Register a new dataset in the pending state.
    async fn create_dataset(&self, new: NewDataset) -> Result<Dataset>;

    /// Fetch one dataset provenance record.
    async fn dataset(&self, id: i64) -> Result<Option<Dataset>>;

    /// List all dataset provenance records, newest first.
    async fn list_datasets(&self) -> Result<Vec<Dataset>>;

    /// Natural-key lookup: has a species with this scientific name already
    /// been committed (by any dataset)?
    async fn species_name_exists(&self, scientific_name: &str) -> Result<bool>;

    /// Commit a staged batch and the dataset's updated metrics as a single
    /// transaction. The dataset becomes `processed = true` with its
    /// (possibly detected) type and cleared error message.
    async fn commit_ingest(
        &self,
        dataset_id: i64,
        resolved_type: DatasetType,
        batch: RecordBatch,
        metrics: IngestMetrics,
    ) -> Result<()>;

    /// Record a failed run: `processed = false` plus the reason, leaving the
    /// dataset as a durable audit trail of the failure.
    async fn record_failure(&self, dataset_id: i64, message: &str) -> Result<()>;
}
