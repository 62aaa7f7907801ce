//! Data-quality metrics for an ingested table
//!
//! Both figures are computed from the raw pre-resolution table snapshot,
//! never from the persisted output.

use super::table::DataTable;

/// Percentage of non-missing cells over `rows × columns`. 0.0 for an empty
/// table.
pub fn completeness_percentage(table: &DataTable) -> f64 {
    let total = table.total_cells();
    if total == 0 {
        return 0.0;
    }
    let present = total - table.missing_cells();
    present as f64 / total as f64 * 100.0
}

/// Composite quality score on a 0–1 scale: completeness fraction times the
/// fraction of rows that were successfully built.
///
/// Monotone in both inputs; 1.0 for an all-complete zero-skip table, 0.0
/// for an empty or fully-skipped one.
pub fn data_quality_score(table: &DataTable, rows_built: usize) -> f64 {
    let rows = table.row_count();
    if rows == 0 {
        return 0.0;
    }
    let accepted_ratio = rows_built.min(rows) as f64 / rows as f64;
    (completeness_percentage(table) / 100.0) * accepted_ratio
}
