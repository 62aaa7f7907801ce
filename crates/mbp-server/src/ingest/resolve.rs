//! Canonical column resolution
//!
//! Source files name the same field a dozen ways ("latitude", "Lat", "y",
//! "coord_y"). Each domain declares an ordered synonym table; resolution
//! binds every canonical field to the first actual column whose name
//! contains a synonym, case-insensitively. Synonym order outranks column
//! order; among columns matching the same synonym, the leftmost wins.

use super::table::DataTable;

/// Ordered (canonical field, synonym list) pairs for one domain.
pub type SynonymTable = &'static [(&'static str, &'static [&'static str])];

/// A resolved read-only view over a table: canonical field → source column.
#[derive(Debug)]
pub struct ResolvedView<'t> {
    table: &'t DataTable,
    bindings: Vec<(&'static str, usize)>,
}

/// Resolve a table's columns against a domain synonym table.
///
/// Pure transform; unmatched canonical fields are simply absent from the
/// view.
pub fn resolve<'t>(table: &'t DataTable, synonyms: SynonymTable) -> ResolvedView<'t> {
    let lowered: Vec<String> = table
        .columns()
        .iter()
        .map(|c| c.to_lowercase())
        .collect();

    let mut bindings = Vec::new();
    for (canonical, candidates) in synonyms {
        'candidates: for candidate in candidates.iter() {
            for (index, name) in lowered.iter().enumerate() {
                if name.contains(candidate) {
                    bindings.push((*canonical, index));
                    break 'candidates;
                }
            }
        }
    }

    ResolvedView { table, bindings }
}

impl<'t> ResolvedView<'t> {
    /// Cell value for a canonical field in the given row, if the field was
    /// bound and the cell is non-missing.
    pub fn value(&self, row: usize, canonical: &str) -> Option<&'t str> {
        let (_, col) = self
            .bindings
            .iter()
            .find(|(name, _)| *name == canonical)?;
        self.table.cell(row, *col)
    }

    /// Owned copy of a canonical field's cell value.
    pub fn text(&self, row: usize, canonical: &str) -> Option<String> {
        self.value(row, canonical).map(|s| s.to_string())
    }

    /// Whether a canonical field was bound to any source column.
    pub fn is_bound(&self, canonical: &str) -> bool {
        self.bindings.iter().any(|(name, _)| *name == canonical)
    }
}
