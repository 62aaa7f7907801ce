//! Ingestion orchestrator
//!
//! Drives one dataset through the full run: load the raw bytes into a
//! table, resolve the dataset type (detecting it when unknown), dispatch to
//! the domain builder, compute quality metrics from the table snapshot, and
//! commit the staged batch plus the dataset's updated status as a single
//! transaction. Any failure marks the dataset unprocessed with the reason
//! and surfaces as a structured result, never a fault.

use anyhow::Result;
use serde::Serialize;
use tracing::{error, info, warn};

use super::builders::{build_edna, build_ocean, build_species, BuildReport};
use super::detect::detect_dataset_type;
use super::quality::{completeness_percentage, data_quality_score};
use super::table::{load_table, DataTable};
use crate::models::{Dataset, DatasetType, IngestMetrics, RecordBatch};
use crate::store::DatasetStore;

/// Result payload returned to the caller after one ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub success: bool,
    pub records_processed: i64,
    pub data_quality_score: f64,
    pub completeness_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessOutcome {
    fn success(metrics: IngestMetrics) -> Self {
        Self {
            success: true,
            records_processed: metrics.records_count,
            data_quality_score: metrics.data_quality_score,
            completeness_percentage: metrics.completeness_percentage,
            error: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            records_processed: 0,
            data_quality_score: 0.0,
            completeness_percentage: 0.0,
            error: Some(message.into()),
        }
    }
}

/// Ingestion pipeline over a storage collaborator.
pub struct IngestPipeline<'a> {
    store: &'a dyn DatasetStore,
}

impl<'a> IngestPipeline<'a> {
    pub fn new(store: &'a dyn DatasetStore) -> Self {
        Self { store }
    }

    /// Run ingestion for an already-registered dataset against a raw
    /// payload.
    ///
    /// Re-entrant per dataset id: re-running re-does detection and build;
    /// the species natural-key check keeps taxonomic entries idempotent,
    /// while ocean/eDNA batches append.
    #[tracing::instrument(skip(self, payload))]
    pub async fn process(&self, dataset_id: i64, payload: &[u8]) -> ProcessOutcome {
        let dataset = match self.store.dataset(dataset_id).await {
            Ok(Some(dataset)) => dataset,
            Ok(None) => {
                warn!(dataset_id, "ingestion requested for unknown dataset");
                return ProcessOutcome::failure(format!("dataset {} not found", dataset_id));
            },
            Err(e) => {
                error!(dataset_id, error = %e, "failed to fetch dataset");
                return ProcessOutcome::failure(format!("failed to fetch dataset: {}", e));
            },
        };

        info!(dataset_id, name = %dataset.name, "processing dataset");

        // Received -> Loaded
        let table = match load_table(payload, dataset.original_filename.as_deref()) {
            Ok(table) => table,
            Err(e) => {
                return self
                    .fail(dataset_id, format!("unreadable file: {}", e))
                    .await;
            },
        };
        info!(
            dataset_id,
            rows = table.row_count(),
            columns = table.column_count(),
            "table loaded"
        );

        // Loaded -> TypeResolved
        let resolved_type = if dataset.dataset_type == DatasetType::Unknown {
            let detected = detect_dataset_type(table.columns());
            info!(dataset_id, detected_type = %detected, "dataset type detected");
            detected
        } else {
            dataset.dataset_type
        };

        // TypeResolved -> Built
        let (batch, report) = match self.build(&dataset, resolved_type, &table).await {
            Ok(built) => built,
            Err(outcome) => return outcome,
        };

        if report.skipped() > 0 {
            warn!(
                dataset_id,
                built = report.built,
                skipped_missing = report.skipped_missing,
                skipped_unparsable = report.skipped_unparsable,
                skipped_duplicate = report.skipped_duplicate,
                "some rows were skipped"
            );
        }

        let metrics = IngestMetrics {
            records_count: report.built as i64,
            data_quality_score: data_quality_score(&table, report.built),
            completeness_percentage: completeness_percentage(&table),
        };

        // Built -> Persisted
        if let Err(e) = self
            .store
            .commit_ingest(dataset_id, resolved_type, batch, metrics)
            .await
        {
            return self
                .fail(dataset_id, format!("failed to persist batch: {}", e))
                .await;
        }

        info!(
            dataset_id,
            records = metrics.records_count,
            quality = metrics.data_quality_score,
            completeness = metrics.completeness_percentage,
            "dataset processed"
        );
        ProcessOutcome::success(metrics)
    }

    async fn build(
        &self,
        dataset: &Dataset,
        resolved_type: DatasetType,
        table: &DataTable,
    ) -> Result<(RecordBatch, BuildReport), ProcessOutcome> {
        let built = match resolved_type {
            DatasetType::Species => build_species(table, dataset.id, self.store)
                .await
                .map(|(records, report)| (RecordBatch::Species(records), report)),
            DatasetType::Ocean => {
                build_ocean(table, dataset.id).map(|(records, report)| (RecordBatch::Ocean(records), report))
            },
            DatasetType::Edna => {
                build_edna(table, dataset.id).map(|(records, report)| (RecordBatch::Edna(records), report))
            },
            DatasetType::Routes | DatasetType::Other | DatasetType::Unknown => {
                return Err(self
                    .fail(dataset.id, format!("unsupported dataset type: {}", resolved_type))
                    .await);
            },
        };

        match built {
            Ok(result) => Ok(result),
            Err(e) => Err(self
                .fail(dataset.id, format!("failed to build records: {}", e))
                .await),
        }
    }

    /// Record the failure on the dataset and produce the failure payload.
    async fn fail(&self, dataset_id: i64, message: String) -> ProcessOutcome {
        error!(dataset_id, message = %message, "ingestion failed");
        if let Err(e) = self.store.record_failure(dataset_id, &message).await {
            error!(dataset_id, error = %e, "failed to record ingestion failure");
        }
        ProcessOutcome::failure(message)
    }
}
