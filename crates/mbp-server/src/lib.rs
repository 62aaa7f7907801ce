//! MBP Server Library
//!
//! HTTP server for the marine-biodiversity data platform.
//!
//! # Overview
//!
//! The server ingests heterogeneous tabular datasets (species taxonomy,
//! oceanographic measurements, environmental-DNA samples), normalizes them
//! into a relational schema, and exposes dataset provenance through a REST
//! API.
//!
//! - **Ingestion Pipeline** (`ingest`): the core — table loading, dataset
//!   type detection, canonical column resolution, per-row record building
//!   with skip-and-continue fault tolerance, and quality scoring
//! - **Persistence** (`store`): repository-style collaborator over
//!   PostgreSQL via SQLx
//! - **API** (`api`, `features`): Axum routes for uploads and provenance
//!   queries
//! - **Configuration** (`config`): environment-based settings
//!
//! # Example
//!
//! ```no_run
//! use mbp_server::{api, config::Config, store::PgDatasetStore};
//! use sqlx::postgres::PgPoolOptions;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = PgPoolOptions::new().connect(&config.database.url).await?;
//!     api::serve(config, PgDatasetStore::new(pool)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use error::{AppError, AppResult};
