//! Dataset management feature: upload, reprocess, and provenance queries

pub mod routes;

pub use routes::routes;
