//! Tabular loader
//!
//! Parses cleaned text into a string table. Rows that cannot be trusted
//! (record errors, wrong field count, unparsable feature values) are skipped
//! and counted rather than failing the whole upload.

use super::IngestError;
use csv::{ReaderBuilder, Trim};
use exo_common::schema::parse_feature_cell;
use exo_common::FeatureSchema;
use tracing::{debug, warn};

/// Rows keyed by position, columns as they appeared in the upload
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Row accounting for one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data records seen (blank lines excluded)
    pub records_seen: usize,
    /// Records dropped as malformed
    pub skipped_rows: usize,
}

impl CandidateTable {
    /// Build a table directly; every row must match the column count
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, IngestError> {
        if let Some(pos) = rows.iter().position(|r| r.len() != columns.len()) {
            return Err(IngestError::Parse(format!(
                "row {} has {} fields, expected {}",
                pos + 1,
                rows[pos].len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Build from rows already known to match the column count
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column with this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of a column in row order
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}

/// Parse cleaned CSV text into a table
///
/// Fails only when there is no header or no data row survives.
pub fn load_table(
    text: &str,
    delimiter: u8,
    schema: &FeatureSchema,
) -> Result<(CandidateTable, LoadReport), IngestError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::Parse(format!("Unable to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if columns.iter().all(|c| c.is_empty()) {
        return Err(IngestError::Parse("CSV has no header row".to_string()));
    }

    // Feature cells are validated here so a garbled row never reaches imputation
    let feature_indices: Vec<usize> = schema
        .features()
        .iter()
        .filter_map(|f| columns.iter().position(|c| c == f))
        .collect();

    let mut report = LoadReport::default();
    let mut rows = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.records_seen += 1;
                report.skipped_rows += 1;
                debug!(record = line + 1, "Skipping unreadable record: {}", e);
                continue;
            }
        };

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        report.records_seen += 1;

        if record.len() != columns.len() {
            report.skipped_rows += 1;
            debug!(
                record = line + 1,
                fields = record.len(),
                expected = columns.len(),
                "Skipping record with wrong field count"
            );
            continue;
        }

        if let Some(&bad) = feature_indices
            .iter()
            .find(|&&idx| parse_feature_cell(&record[idx]).is_err())
        {
            report.skipped_rows += 1;
            debug!(
                record = line + 1,
                column = %columns[bad],
                value = %&record[bad],
                "Skipping record with unparsable feature value"
            );
            continue;
        }

        rows.push(record.iter().map(|field| field.to_string()).collect());
    }

    if report.skipped_rows > 0 {
        warn!(
            skipped = report.skipped_rows,
            seen = report.records_seen,
            "Skipped malformed CSV rows"
        );
    }

    if rows.is_empty() {
        return Err(IngestError::Parse(
            "CSV is empty or has no valid rows".to_string(),
        ));
    }

    Ok((CandidateTable { columns, rows }, report))
}
