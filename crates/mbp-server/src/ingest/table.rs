//! In-memory tabular structure and raw-file loading
//!
//! Uploaded files arrive as bytes of unknown provenance. `load_table` turns
//! them into a [`DataTable`] by trying the format family the platform
//! accepts: delimited text (comma, semicolon, tab — with UTF-8 and
//! Windows-1252 decoding attempts), OOXML spreadsheets, and JSON record
//! arrays. Empty and NA-literal cells are normalized to missing.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

/// Errors raised while turning raw bytes into a table
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file format: .{0}")]
    UnsupportedFormat(String),

    #[error("no encoding/delimiter combination produced a table with more than one column")]
    NoDelimiter,

    #[error("invalid JSON records: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid spreadsheet: {0}")]
    Spreadsheet(String),
}

/// A loaded table: named columns and rows of optional cells.
///
/// A `None` cell is missing data — the raw cell was empty, whitespace, or an
/// NA literal ("na", "n/a", "nan", "null", "none", case-insensitive).
#[derive(Debug, Clone)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl DataTable {
    /// Build a table, padding short rows with missing cells.
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<Option<String>>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, None);
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    pub fn total_cells(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    pub fn missing_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|c| c.is_none()).count())
            .sum()
    }
}

/// Normalize one raw cell: trim, map empties and NA literals to missing.
fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "na" | "n/a" | "nan" | "null" | "none" => None,
        _ => Some(trimmed.to_string()),
    }
}

/// Load raw bytes into a table, dispatching on the filename extension.
///
/// A missing or `csv`/`txt` extension goes through the delimited-text
/// attempts; `tsv` is tab-only; `xlsx`/`xls` reads the first worksheet;
/// `json` expects an array of flat records.
pub fn load_table(bytes: &[u8], filename: Option<&str>) -> Result<DataTable, LoadError> {
    let extension = filename
        .and_then(|name| name.rsplit('.').next().filter(|ext| *ext != name))
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        None | Some("csv") | Some("txt") => from_delimited(bytes, &[b',', b';', b'\t']),
        Some("tsv") => from_delimited(bytes, &[b'\t']),
        Some("xlsx") | Some("xls") => from_spreadsheet(bytes),
        Some("json") => from_json_records(bytes),
        Some(other) => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Try each encoding × delimiter until a parse yields more than one column.
fn from_delimited(bytes: &[u8], delimiters: &[u8]) -> Result<DataTable, LoadError> {
    let encodings = [encoding_rs::UTF_8, encoding_rs::WINDOWS_1252];

    for encoding in encodings {
        let (text, _, had_errors) = encoding.decode(bytes);
        if had_errors {
            continue;
        }
        for &delimiter in delimiters {
            if let Some(table) = parse_delimited(&text, delimiter) {
                if table.column_count() > 1 {
                    debug!(
                        encoding = encoding.name(),
                        delimiter = delimiter,
                        columns = table.column_count(),
                        rows = table.row_count(),
                        "delimited parse accepted"
                    );
                    return Ok(table);
                }
            }
        }
    }

    Err(LoadError::NoDelimiter)
}

fn parse_delimited(text: &str, delimiter: u8) -> Option<DataTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.ok()?;
        rows.push(record.iter().map(normalize_cell).collect());
    }

    Some(DataTable::new(columns, rows))
}

/// Parse a JSON array of flat records; columns in first-appearance order.
fn from_json_records(bytes: &[u8]) -> Result<DataTable, LoadError> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(bytes)?;

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|col| record.get(col).and_then(json_cell))
                .collect()
        })
        .collect();

    Ok(DataTable::new(columns, rows))
}

fn json_cell(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => normalize_cell(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Read the first worksheet of an OOXML workbook.
///
/// Only what tabular ingestion needs: shared strings, inline strings, and
/// raw (numeric) cell values. The first row is the header.
fn from_spreadsheet(bytes: &[u8]) -> Result<DataTable, LoadError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?;

    let shared = match read_archive_entry(&mut archive, "xl/sharedStrings.xml") {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_xml = read_archive_entry(&mut archive, "xl/worksheets/sheet1.xml")
        .or_else(|| {
            let name = (0..archive.len())
                .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
                .find(|name| name.starts_with("xl/worksheets/"))?;
            read_archive_entry(&mut archive, &name)
        })
        .ok_or_else(|| LoadError::Spreadsheet("no worksheet found".to_string()))?;

    let grid = parse_worksheet(&sheet_xml, &shared)?;

    let mut grid = grid.into_iter();
    let header = grid.next().unwrap_or_default();
    let columns = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Some(name) => name.trim().to_string(),
            None => format!("column_{}", i + 1),
        })
        .collect();

    Ok(DataTable::new(columns, grid.collect()))
}

fn read_archive_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut content = String::new();
    entry.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Collect the string table: one entry per `<si>`, concatenating `<t>` runs.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                _ => {},
            },
            Ok(Event::Text(t)) if in_text => {
                current.push_str(
                    &t.unescape()
                        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?,
                );
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.push(current.clone()),
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::Spreadsheet(e.to_string())),
            _ => {},
        }
    }

    Ok(strings)
}

fn parse_worksheet(
    xml: &str,
    shared: &[String],
) -> Result<Vec<Vec<Option<String>>>, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut grid: Vec<Vec<Option<String>>> = Vec::new();
    let mut row: Vec<Option<String>> = Vec::new();

    let mut cell_col = 0usize;
    let mut cell_type = String::new();
    let mut value = String::new();
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    cell_col = row.len();
                    cell_type.clear();
                    value.clear();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"r" => {
                                let cell_ref = String::from_utf8_lossy(&attr.value);
                                if let Some(col) = column_from_ref(&cell_ref) {
                                    cell_col = col;
                                }
                            },
                            b"t" => {
                                cell_type = String::from_utf8_lossy(&attr.value).into_owned();
                            },
                            _ => {},
                        }
                    }
                },
                b"v" | b"t" => in_value = true,
                _ => {},
            },
            Ok(Event::Text(t)) if in_value => {
                value.push_str(
                    &t.unescape()
                        .map_err(|e| LoadError::Spreadsheet(e.to_string()))?,
                );
            },
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let resolved = if cell_type == "s" {
                        value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared.get(i))
                            .map(|s| s.as_str())
                            .unwrap_or("")
                            .to_string()
                    } else {
                        value.clone()
                    };
                    if row.len() <= cell_col {
                        row.resize(cell_col + 1, None);
                    }
                    row[cell_col] = normalize_cell(&resolved);
                },
                b"row" => grid.push(std::mem::take(&mut row)),
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(LoadError::Spreadsheet(e.to_string())),
            _ => {},
        }
    }

    Ok(grid)
}

/// 0-based column index from a cell reference like "B7".
fn column_from_ref(cell_ref: &str) -> Option<usize> {
    let letters: String = cell_ref
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let index = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    Some(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_csv() {
        let bytes = b"scientific_name,family\nThunnus albacares,Scombridae\n";
        let table = load_table(bytes, Some("upload.csv")).unwrap();
        assert_eq!(table.columns(), &["scientific_name", "family"]);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, 0), Some("Thunnus albacares"));
    }

    #[test]
    fn test_semicolon_fallback() {
        let bytes = b"latitude;longitude\n-4.5;55.2\n";
        let table = load_table(bytes, Some("data.csv")).unwrap();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.cell(0, 1), Some("55.2"));
    }

    #[test]
    fn test_tab_separated() {
        let bytes = b"sample_id\ttotal_reads\nEDNA-001\t48213\n";
        let table = load_table(bytes, Some("samples.tsv")).unwrap();
        assert_eq!(table.columns(), &["sample_id", "total_reads"]);
        assert_eq!(table.cell(0, 1), Some("48213"));
    }

    #[test]
    fn test_windows_1252_decoding() {
        // "région" encoded as Windows-1252 (0xE9 = é) is not valid UTF-8
        let bytes = b"r\xe9gion;temperature\nMah\xe9;27.4\n";
        let table = load_table(bytes, Some("ocean.csv")).unwrap();
        assert_eq!(table.columns()[0], "r\u{e9}gion");
        assert_eq!(table.cell(0, 0), Some("Mah\u{e9}"));
    }

    #[test]
    fn test_single_column_rejected() {
        let bytes = b"only_one_column\nvalue\n";
        let result = load_table(bytes, Some("narrow.csv"));
        assert!(matches!(result, Err(LoadError::NoDelimiter)));
    }

    #[test]
    fn test_na_literals_are_missing() {
        let bytes = b"a,b,c\nNA,n/a,1\n,null,2\n";
        let table = load_table(bytes, Some("gaps.csv")).unwrap();
        assert_eq!(table.cell(0, 0), None);
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(1, 1), None);
        assert_eq!(table.missing_cells(), 4);
        assert_eq!(table.total_cells(), 6);
    }

    #[test]
    fn test_json_records() {
        let bytes = br#"[
            {"scientific_name": "Lutjanus bohar", "max_length_cm": 90},
            {"scientific_name": "Epinephelus tukula", "habitat": "reef"}
        ]"#;
        let table = load_table(bytes, Some("species.json")).unwrap();
        assert_eq!(table.columns(), &["scientific_name", "max_length_cm", "habitat"]);
        assert_eq!(table.cell(0, 1), Some("90"));
        assert_eq!(table.cell(0, 2), None);
        assert_eq!(table.cell(1, 2), Some("reef"));
    }

    #[test]
    fn test_json_not_an_array() {
        let bytes = br#"{"not": "records"}"#;
        assert!(load_table(bytes, Some("bad.json")).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let result = load_table(b"whatever", Some("notes.pdf"));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat(ext)) if ext == "pdf"));
    }

    #[test]
    fn test_corrupt_spreadsheet() {
        let result = load_table(b"\x00\x01garbage", Some("sheet.xlsx"));
        assert!(matches!(result, Err(LoadError::Spreadsheet(_))));
    }

    #[test]
    fn test_short_rows_padded() {
        let bytes = b"a,b,c\n1,2\n";
        let table = load_table(bytes, Some("short.csv")).unwrap();
        assert_eq!(table.cell(0, 2), None);
    }

    #[test]
    fn test_column_from_ref() {
        assert_eq!(column_from_ref("A1"), Some(0));
        assert_eq!(column_from_ref("B7"), Some(1));
        assert_eq!(column_from_ref("AA3"), Some(26));
        assert_eq!(column_from_ref("12"), None);
    }

    #[test]
    fn test_shared_strings_parse() {
        let xml = r#"<?xml version="1.0"?>
            <sst><si><t>alpha</t></si><si><r><t>be</t></r><r><t>ta</t></r></si></sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_worksheet_parse_with_shared_and_numeric() {
        let shared = vec!["scientific_name".to_string(), "Thunnus albacares".to_string()];
        let xml = r#"<?xml version="1.0"?>
            <worksheet><sheetData>
              <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>1.5</v></c></row>
              <row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>42</v></c></row>
            </sheetData></worksheet>"#;
        let grid = parse_worksheet(xml, &shared).unwrap();
        assert_eq!(grid[0][0].as_deref(), Some("scientific_name"));
        assert_eq!(grid[1][0].as_deref(), Some("Thunnus albacares"));
        assert_eq!(grid[1][1].as_deref(), Some("42"));
    }
}
