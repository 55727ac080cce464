//! Feature schema shared by training and inference
//!
//! The classifier consumes a fixed, ordered feature vector. The same schema is
//! used to build the training matrix and to reconcile uploaded tables, so a
//! column's position here is its position in every feature row.

/// Identifier column carried through to the per-row results
pub const IDENTIFIER_COLUMN: &str = "kepoi_name";

/// Label column present only in the labeled training dataset
pub const LABEL_COLUMN: &str = "koi_disposition";

/// Label value of the positive class
pub const POSITIVE_LABEL: &str = "CONFIRMED";

/// Label value of the negative class
pub const NEGATIVE_LABEL: &str = "FALSE POSITIVE";

/// Ordered Kepler Object of Interest features
pub const KEPLER_FEATURES: [&str; 15] = [
    "koi_period",    // orbital period (days)
    "koi_duration",  // transit duration (hours)
    "koi_depth",     // transit depth (ppm)
    "koi_prad",      // planetary radius (earth radii)
    "koi_teq",       // equilibrium temperature (K)
    "koi_insol",     // insolation flux (earth flux)
    "koi_model_snr", // transit signal-to-noise
    "koi_impact",    // impact parameter
    "koi_fpflag_nt", // not transit-like flag
    "koi_fpflag_ss", // stellar eclipse flag
    "koi_fpflag_co", // centroid offset flag
    "koi_fpflag_ec", // ephemeris match flag
    "koi_steff",     // stellar effective temperature (K)
    "koi_slogg",     // stellar surface gravity (log10(cm/s^2))
    "koi_srad",      // stellar radius (solar radii)
];

/// Cell spellings treated as "no value"
///
/// Matches the NA vocabulary of the common dataframe tooling that produces
/// these exports, compared after trimming whitespace.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Returns true when a raw cell carries no value
pub fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    MISSING_TOKENS.iter().any(|token| *token == trimmed)
}

/// Parse a raw cell as a feature value
///
/// `Ok(None)` for missing cells, `Err(())` when the cell holds something that
/// is neither missing nor a finite number.
#[allow(clippy::result_unit_err)]
pub fn parse_feature_cell(cell: &str) -> Result<Option<f64>, ()> {
    if is_missing(cell) {
        return Ok(None);
    }
    match cell.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        Ok(_) => Ok(None),
        Err(_) => Err(()),
    }
}

/// Static definition of the required feature columns and identifier column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSchema {
    identifier: &'static str,
    features: &'static [&'static str],
}

impl FeatureSchema {
    /// The deployed Kepler KOI schema
    pub const fn kepler() -> Self {
        Self {
            identifier: IDENTIFIER_COLUMN,
            features: &KEPLER_FEATURES,
        }
    }

    /// Identifier column name
    pub fn identifier(&self) -> &'static str {
        self.identifier
    }

    /// Feature column names in model order
    pub fn features(&self) -> &'static [&'static str] {
        self.features
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Position of a feature column, if it belongs to the schema
    pub fn position(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| *f == name)
    }

    /// True when `names` lists exactly the schema features in schema order
    pub fn matches<S: AsRef<str>>(&self, names: &[S]) -> bool {
        names.len() == self.features.len()
            && names
                .iter()
                .zip(self.features.iter())
                .all(|(a, b)| a.as_ref() == *b)
    }

    /// Owned copy of the feature list, as persisted next to a trained model
    pub fn feature_list(&self) -> Vec<String> {
        self.features.iter().map(|f| f.to_string()).collect()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::kepler()
    }
}
