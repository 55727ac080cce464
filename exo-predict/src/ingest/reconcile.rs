//! Feature reconciliation
//!
//! Aligns an uploaded table with the feature schema:
//! - identifier column is mandatory
//! - absent feature columns (or columns with no value in any row) become 0
//! - gaps in a present column take the median of that column in this upload
//!
//! Medians are computed per upload, never from training statistics.

use super::{CandidateTable, IngestError};
use exo_common::schema::parse_feature_cell;
use exo_common::FeatureSchema;
use tracing::{info, warn};

/// Fully populated feature rows in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    ids: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// A column whose gaps were filled with its upload median
#[derive(Debug, Clone, PartialEq)]
pub struct ImputedColumn {
    pub column: String,
    pub median: f64,
    pub filled: usize,
}

/// What reconciliation changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    /// Columns filled with 0 (absent, or no value in any row)
    pub synthesized: Vec<String>,
    /// Columns with median-filled gaps
    pub imputed: Vec<ImputedColumn>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.synthesized.is_empty() && self.imputed.is_empty()
    }
}

impl FeatureMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render back to a string table with the identifier column first
    pub fn to_table(&self, schema: &FeatureSchema) -> CandidateTable {
        let mut columns = vec![schema.identifier().to_string()];
        columns.extend(self.columns.iter().cloned());
        let rows = self
            .ids
            .iter()
            .zip(&self.rows)
            .map(|(id, values)| {
                let mut row = vec![id.clone()];
                row.extend(values.iter().map(|v| v.to_string()));
                row
            })
            .collect();
        CandidateTable::from_parts(columns, rows)
    }
}

/// Reconcile a loaded table against the schema
pub fn reconcile(
    table: &CandidateTable,
    schema: &FeatureSchema,
) -> Result<(FeatureMatrix, ReconcileReport), IngestError> {
    let id_column = table.column(schema.identifier()).ok_or_else(|| {
        IngestError::Schema(format!(
            "CSV must contain the identifier column '{}'",
            schema.identifier()
        ))
    })?;
    let ids: Vec<String> = id_column.map(str::to_string).collect();

    let n_rows = table.row_count();
    let mut rows = vec![Vec::with_capacity(schema.len()); n_rows];
    let mut report = ReconcileReport::default();

    for feature in schema.features() {
        let values = resolve_column(table, feature, &mut report);
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    if !report.is_clean() {
        info!(
            synthesized = report.synthesized.len(),
            imputed = report.imputed.len(),
            rows = n_rows,
            "Reconciled upload against feature schema"
        );
    }

    Ok((
        FeatureMatrix {
            columns: schema.feature_list(),
            ids,
            rows,
        },
        report,
    ))
}

fn resolve_column(table: &CandidateTable, feature: &str, report: &mut ReconcileReport) -> Vec<f64> {
    let n_rows = table.row_count();

    let Some(cells) = table.column(feature) else {
        warn!(column = feature, "Feature column missing from upload, filling with 0");
        report.synthesized.push(feature.to_string());
        return vec![0.0; n_rows];
    };

    // The loader already dropped rows with unparsable feature cells
    let parsed: Vec<Option<f64>> = cells
        .map(|cell| parse_feature_cell(cell).ok().flatten())
        .collect();

    let mut present: Vec<f64> = parsed.iter().flatten().copied().collect();
    let Some(fill) = median(&mut present) else {
        warn!(column = feature, "Feature column has no values, filling with 0");
        report.synthesized.push(feature.to_string());
        return vec![0.0; n_rows];
    };

    let filled = parsed.iter().filter(|v| v.is_none()).count();
    if filled > 0 {
        info!(column = feature, median = fill, filled, "Imputed missing cells with column median");
        report.imputed.push(ImputedColumn {
            column: feature.to_string(),
            median: fill,
            filled,
        });
    }

    parsed.into_iter().map(|v| v.unwrap_or(fill)).collect()
}

/// Median of finite values; mean of the middle pair for even counts
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
