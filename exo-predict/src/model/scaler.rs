//! Standardization fitted once on the training partition

use super::ModelError;
use serde::{Deserialize, Serialize};

/// Per-feature `(x - mean) / scale`
///
/// `scale` is the population standard deviation; constant features get a
/// scale of 1 so they map to 0 instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on training rows
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, ModelError> {
        let first = rows
            .first()
            .ok_or_else(|| ModelError::Training("cannot fit scaler on zero rows".to_string()))?;
        let width = first.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != width) {
            return Err(ModelError::FeatureMismatch {
                expected: width,
                found: bad.len(),
            });
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((var, v), m) in variance.iter_mut().zip(row).zip(&mean) {
                *var += (v - m) * (v - m);
            }
        }

        let scale = variance
            .into_iter()
            .map(|var| {
                let std = (var / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    /// Number of features the scaler was fitted on
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }
}
