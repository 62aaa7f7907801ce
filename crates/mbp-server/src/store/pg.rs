//! PostgreSQL implementation of the dataset store

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use super::DatasetStore;
use crate::models::{
    Dataset, DatasetType, IngestMetrics, NewDataset, NewEdnaSample, NewOceanObservation,
    NewSpecies, RecordBatch,
};

/// Dataset store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgDatasetStore {
    pool: PgPool,
}

impl PgDatasetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Raw database row; enum fields travel as text.
#[derive(Debug, FromRow)]
struct DatasetRow {
    id: i64,
    name: String,
    dataset_type: String,
    source_type: String,
    original_filename: Option<String>,
    file_size_mb: Option<f64>,
    content_sha256: Option<String>,
    description: Option<String>,
    region: Option<String>,
    uploaded_at: DateTime<Utc>,
    processed: bool,
    processing_errors: Option<String>,
    records_count: i64,
    data_quality_score: Option<f64>,
    completeness_percentage: Option<f64>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            id: row.id,
            name: row.name,
            dataset_type: DatasetType::from(row.dataset_type),
            source_type: row.source_type.into(),
            original_filename: row.original_filename,
            file_size_mb: row.file_size_mb,
            content_sha256: row.content_sha256,
            description: row.description,
            region: row.region,
            uploaded_at: row.uploaded_at,
            processed: row.processed,
            processing_errors: row.processing_errors,
            records_count: row.records_count,
            data_quality_score: row.data_quality_score,
            completeness_percentage: row.completeness_percentage,
        }
    }
}

#[async_trait]
impl DatasetStore for PgDatasetStore {
    async fn create_dataset(&self, new: NewDataset) -> Result<Dataset> {
        let row = sqlx::query_as::<_, DatasetRow>(
            r#"
            INSERT INTO datasets (
                name, dataset_type, source_type, original_filename,
                file_size_mb, content_sha256, description, region
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, name, dataset_type, source_type, original_filename,
                file_size_mb, content_sha256, description, region,
                uploaded_at, processed, processing_errors, records_count,
                data_quality_score, completeness_percentage
            "#,
        )
        .bind(&new.name)
        .bind(new.dataset_type.as_str())
        .bind(new.source_type.as_str())
        .bind(&new.original_filename)
        .bind(new.file_size_mb)
        .bind(&new.content_sha256)
        .bind(&new.description)
        .bind(&new.region)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert dataset")?;

        Ok(row.into())
    }

    async fn dataset(&self, id: i64) -> Result<Option<Dataset>> {
        let row = sqlx::query_as::<_, DatasetRow>(
            r#"
            SELECT
                id, name, dataset_type, source_type, original_filename,
                file_size_mb, content_sha256, description, region,
                uploaded_at, processed, processing_errors, records_count,
                data_quality_score, completeness_percentage
            FROM datasets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch dataset")?;

        Ok(row.map(Into::into))
    }

    async fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let rows = sqlx::query_as::<_, DatasetRow>(
            r#"
            SELECT
                id, name, dataset_type, source_type, original_filename,
                file_size_mb, content_sha256, description, region,
                uploaded_at, processed, processing_errors, records_count,
                data_quality_score, completeness_percentage
            FROM datasets
            ORDER BY uploaded_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list datasets")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn species_name_exists(&self, scientific_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM species WHERE scientific_name = $1)",
        )
        .bind(scientific_name)
        .fetch_one(&self.pool)
        .await
        .context("Failed to check species natural key")?;

        Ok(exists)
    }

    async fn commit_ingest(
        &self,
        dataset_id: i64,
        resolved_type: DatasetType,
        batch: RecordBatch,
        metrics: IngestMetrics,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        match batch {
            RecordBatch::Species(records) => {
                for record in &records {
                    insert_species(&mut tx, record).await?;
                }
            },
            RecordBatch::Ocean(records) => {
                for record in &records {
                    insert_ocean(&mut tx, record).await?;
                }
            },
            RecordBatch::Edna(records) => {
                for record in &records {
                    insert_edna(&mut tx, record).await?;
                }
            },
        }

        sqlx::query(
            r#"
            UPDATE datasets
            SET dataset_type = $2,
                processed = TRUE,
                processing_errors = NULL,
                records_count = $3,
                data_quality_score = $4,
                completeness_percentage = $5
            WHERE id = $1
            "#,
        )
        .bind(dataset_id)
        .bind(resolved_type.as_str())
        .bind(metrics.records_count)
        .bind(metrics.data_quality_score)
        .bind(metrics.completeness_percentage)
        .execute(&mut *tx)
        .await
        .context("Failed to update dataset metrics")?;

        tx.commit().await.context("Failed to commit ingest batch")?;

        Ok(())
    }

    async fn record_failure(&self, dataset_id: i64, message: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE datasets
            SET processed = FALSE,
                processing_errors = $2,
                records_count = 0
            WHERE id = $1
            "#,
        )
        .bind(dataset_id)
        .bind(message)
        .execute(&self.pool)
        .await
        .context("Failed to record dataset failure")?;

        Ok(())
    }
}

/// Insert one species row. `ON CONFLICT DO NOTHING` keeps the global
/// natural-key invariant intact when two runs race on the same name.
async fn insert_species(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewSpecies,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO species (
            dataset_id, scientific_name, common_name, kingdom, phylum,
            class_name, order_name, family, genus, habitat,
            conservation_status, commercial_importance, max_length_cm,
            trophic_level, depth_range_min_m, depth_range_max_m,
            temperature_range_min_c, temperature_range_max_c, description,
            threats, data_source
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21)
        ON CONFLICT (scientific_name) DO NOTHING
        "#,
    )
    .bind(record.dataset_id)
    .bind(&record.scientific_name)
    .bind(&record.common_name)
    .bind(&record.kingdom)
    .bind(&record.phylum)
    .bind(&record.class_name)
    .bind(&record.order_name)
    .bind(&record.family)
    .bind(&record.genus)
    .bind(&record.habitat)
    .bind(&record.conservation_status)
    .bind(&record.commercial_importance)
    .bind(record.max_length_cm)
    .bind(record.trophic_level)
    .bind(record.depth_range_min_m)
    .bind(record.depth_range_max_m)
    .bind(record.temperature_range_min_c)
    .bind(record.temperature_range_max_c)
    .bind(&record.description)
    .bind(&record.threats)
    .bind(&record.data_source)
    .execute(&mut **tx)
    .await
    .context("Failed to insert species")?;

    Ok(())
}

async fn insert_ocean(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewOceanObservation,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO oceanographic_data (
            dataset_id, latitude, longitude, depth_m, temperature_c,
            salinity_psu, ph_level, dissolved_oxygen_ml_l,
            chlorophyll_a_mg_m3, turbidity_ntu, nitrate_mg_l,
            phosphate_mg_l, region, location_name, recorded_at,
            data_source, quality_flag
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17)
        "#,
    )
    .bind(record.dataset_id)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(record.depth_m)
    .bind(record.temperature_c)
    .bind(record.salinity_psu)
    .bind(record.ph_level)
    .bind(record.dissolved_oxygen_ml_l)
    .bind(record.chlorophyll_a_mg_m3)
    .bind(record.turbidity_ntu)
    .bind(record.nitrate_mg_l)
    .bind(record.phosphate_mg_l)
    .bind(&record.region)
    .bind(&record.location_name)
    .bind(record.recorded_at)
    .bind(&record.data_source)
    .bind(&record.quality_flag)
    .execute(&mut **tx)
    .await
    .context("Failed to insert oceanographic observation")?;

    Ok(())
}

async fn insert_edna(
    tx: &mut Transaction<'_, Postgres>,
    record: &NewEdnaSample,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO edna_samples (
            dataset_id, sample_id, latitude, longitude, depth_m,
            collection_date, total_reads, quality_reads, species_detected,
            shannon_diversity, simpson_diversity, processing_lab,
            sequencing_platform, location_description, taxa_summary
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15)
        "#,
    )
    .bind(record.dataset_id)
    .bind(&record.sample_id)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(record.depth_m)
    .bind(record.collection_date)
    .bind(record.total_reads)
    .bind(record.quality_reads)
    .bind(record.species_detected)
    .bind(record.shannon_diversity)
    .bind(record.simpson_diversity)
    .bind(&record.processing_lab)
    .bind(&record.sequencing_platform)
    .bind(&record.location_description)
    .bind(&record.taxa_summary)
    .execute(&mut **tx)
    .await
    .context("Failed to insert eDNA sample")?;

    Ok(())
}
