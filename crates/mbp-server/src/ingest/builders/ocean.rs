//! Oceanographic record builder
//!
//! Measurements have no natural key: every row with usable coordinates is
//! appended. The recorded-at timestamp goes through the permissive datetime
//! parser, so a missing or garbled value materializes as "now".

use anyhow::Result;
use tracing::debug;

use super::{BuildReport, RowOutcome, SkipReason};
use crate::ingest::coerce::{parse_datetime, safe_float};
use crate::ingest::resolve::{resolve, ResolvedView, SynonymTable};
use crate::ingest::table::DataTable;
use crate::models::NewOceanObservation;

/// Canonical oceanographic fields and their source-column synonyms, in
/// priority order.
pub const OCEAN_SYNONYMS: SynonymTable = &[
    ("latitude", &["latitude", "lat", "y", "coord_y"]),
    ("longitude", &["longitude", "lon", "lng", "long", "x", "coord_x"]),
    ("depth_m", &["depth", "depth_m", "depth_meters", "water_depth"]),
    ("temperature_c", &["temperature", "temp", "water_temp", "sst"]),
    ("salinity_psu", &["salinity", "sal"]),
    ("ph_level", &["ph", "ph_level", "ph_value"]),
    ("dissolved_oxygen_ml_l", &["oxygen", "do", "dissolved_oxygen", "o2"]),
    ("chlorophyll_a_mg_m3", &["chlorophyll", "chl", "chl_a"]),
    ("turbidity_ntu", &["turbidity"]),
    ("nitrate_mg_l", &["nitrate"]),
    ("phosphate_mg_l", &["phosphate"]),
    ("region", &["region", "area", "location", "site"]),
    ("location_name", &["location_name", "station", "site_name"]),
    ("recorded_at", &["date", "time", "datetime", "timestamp", "recorded_at", "sample_date"]),
    ("quality_flag", &["quality_flag", "qc_flag"]),
];

/// Build oceanographic records from a loaded table.
pub fn build_ocean(
    table: &DataTable,
    dataset_id: i64,
) -> Result<(Vec<NewOceanObservation>, BuildReport)> {
    let view = resolve(table, OCEAN_SYNONYMS);
    let mut records = Vec::new();
    let mut report = BuildReport::default();

    for row in 0..table.row_count() {
        match ocean_row(&view, row, dataset_id) {
            RowOutcome::Built(record) => {
                records.push(record);
                report.built += 1;
            },
            RowOutcome::Skipped(reason) => {
                report.tally(reason);
                debug!(row, %reason, "ocean row skipped");
            },
        }
    }

    Ok((records, report))
}

fn ocean_row(view: &ResolvedView<'_>, row: usize, dataset_id: i64) -> RowOutcome<NewOceanObservation> {
    let latitude = match required_coordinate(view, row, "latitude") {
        Ok(value) => value,
        Err(reason) => return RowOutcome::Skipped(reason),
    };
    let longitude = match required_coordinate(view, row, "longitude") {
        Ok(value) => value,
        Err(reason) => return RowOutcome::Skipped(reason),
    };

    RowOutcome::Built(NewOceanObservation {
        dataset_id,
        latitude,
        longitude,
        depth_m: safe_float(view.value(row, "depth_m")),
        temperature_c: safe_float(view.value(row, "temperature_c")),
        salinity_psu: safe_float(view.value(row, "salinity_psu")),
        ph_level: safe_float(view.value(row, "ph_level")),
        dissolved_oxygen_ml_l: safe_float(view.value(row, "dissolved_oxygen_ml_l")),
        chlorophyll_a_mg_m3: safe_float(view.value(row, "chlorophyll_a_mg_m3")),
        turbidity_ntu: safe_float(view.value(row, "turbidity_ntu")),
        nitrate_mg_l: safe_float(view.value(row, "nitrate_mg_l")),
        phosphate_mg_l: safe_float(view.value(row, "phosphate_mg_l")),
        region: view.text(row, "region"),
        location_name: view.text(row, "location_name"),
        recorded_at: parse_datetime(view.value(row, "recorded_at")),
        data_source: format!("dataset_{}", dataset_id),
        quality_flag: view
            .text(row, "quality_flag")
            .unwrap_or_else(|| "good".to_string()),
    })
}

fn required_coordinate(
    view: &ResolvedView<'_>,
    row: usize,
    field: &'static str,
) -> std::result::Result<f64, SkipReason> {
    match view.value(row, field) {
        None => Err(SkipReason::MissingRequired(field)),
        Some(raw) => safe_float(Some(raw)).ok_or(SkipReason::UnparsableRequired(field)),
    }
}
