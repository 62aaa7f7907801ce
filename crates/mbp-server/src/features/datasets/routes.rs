//! Dataset routes: thin glue between HTTP and the ingestion pipeline

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::api::response::ApiResponse;
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::ingest::IngestPipeline;
use crate::models::{DatasetType, NewDataset, SourceType};
use crate::store::DatasetStore;
use mbp_common::checksum::sha256_hex;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_dataset))
        .route("/", get(list_datasets))
        .route("/:id", get(get_dataset))
        .route("/:id/process", post(reprocess_dataset))
}

/// Accept a multipart upload, register the dataset, and run ingestion
/// inline.
#[tracing::instrument(skip(state, multipart))]
async fn upload_dataset(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut payload: Option<Bytes> = None;
    let mut filename: Option<String> = None;
    let mut name: Option<String> = None;
    let mut dataset_type = DatasetType::Unknown;
    let mut region: Option<String> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().map(str::to_string);
                payload = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("failed to read file: {}", e)))?,
                );
            },
            Some("name") => name = Some(read_text(field).await?),
            Some("dataset_type") => {
                dataset_type = DatasetType::from(read_text(field).await?.as_str());
            },
            Some("region") => region = Some(read_text(field).await?),
            Some("description") => description = Some(read_text(field).await?),
            _ => {},
        }
    }

    let payload = payload.ok_or_else(|| AppError::BadRequest("missing file field".to_string()))?;

    let new = NewDataset {
        name: name
            .or_else(|| filename.clone())
            .unwrap_or_else(|| "unnamed dataset".to_string()),
        dataset_type,
        source_type: SourceType::Upload,
        original_filename: filename,
        file_size_mb: Some(payload.len() as f64 / (1024.0 * 1024.0)),
        content_sha256: Some(sha256_hex(&payload)),
        description,
        region,
    };

    let dataset = state.store.create_dataset(new).await?;
    tracing::info!(dataset_id = dataset.id, name = %dataset.name, "dataset registered");

    let outcome = IngestPipeline::new(&state.store)
        .process(dataset.id, &payload)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(json!({
            "dataset_id": dataset.id,
            "result": outcome,
        }))),
    )
        .into_response())
}

/// Re-run ingestion for an existing dataset with a freshly supplied body.
#[tracing::instrument(skip(state, body), fields(id = %id))]
async fn reprocess_dataset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> AppResult<Response> {
    if state.store.dataset(id).await?.is_none() {
        return Err(AppError::NotFound(format!("dataset {} not found", id)));
    }

    let outcome = IngestPipeline::new(&state.store).process(id, &body).await;

    Ok(Json(ApiResponse::success(outcome)).into_response())
}

#[tracing::instrument(skip(state))]
async fn list_datasets(State(state): State<AppState>) -> AppResult<Response> {
    let datasets = state.store.list_datasets().await?;
    Ok(Json(ApiResponse::success(datasets)).into_response())
}

#[tracing::instrument(skip(state), fields(id = %id))]
async fn get_dataset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let dataset = state
        .store
        .dataset(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("dataset {} not found", id)))?;

    Ok(Json(ApiResponse::success(dataset)).into_response())
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid field value: {}", e)))
}
