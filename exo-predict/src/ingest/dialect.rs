//! Delimiter detection
//!
//! Counts each candidate delimiter (outside double quotes) on every complete
//! line of a sample and picks the one whose per-line count is the most
//! consistent. Detection is fallible; `delimiter_or_default` is the single
//! place where a failure turns into the comma fallback.

use std::collections::HashMap;
use thiserror::Error;

/// Bytes of cleaned text inspected by the detector
pub const SAMPLE_BYTES: usize = 8192;

/// Fallback when detection fails
pub const DEFAULT_DELIMITER: u8 = b',';

/// Candidates in preference order (earlier wins ties)
const CANDIDATES: [u8; 5] = [b',', b';', b'\t', b'|', b':'];

/// Share of lines that must agree on the delimiter count
const MIN_CONSISTENCY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectError {
    #[error("sample has no complete lines")]
    EmptySample,

    #[error("no candidate delimiter present in sample")]
    NoDelimiter,

    #[error("delimiter counts are inconsistent across lines (best agreement {0:.2})")]
    Inconsistent(f64),
}

/// Leading slice of `text` used for detection, cut on a char boundary
pub fn sample(text: &str) -> &str {
    if text.len() <= SAMPLE_BYTES {
        return text;
    }
    let mut end = SAMPLE_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Detect the most probable field delimiter of a sample
pub fn detect_delimiter(sample: &str) -> Result<u8, DetectError> {
    let mut lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    // A sample cut mid-file ends in a partial line; keep it only if it is all we have
    if lines.len() > 1 && !sample.ends_with('\n') {
        lines.pop();
    }
    if lines.is_empty() {
        return Err(DetectError::EmptySample);
    }

    let mut best: Option<(u8, f64)> = None;
    for &candidate in CANDIDATES.iter() {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_unquoted(line, candidate))
            .collect();

        let Some((mode, frequency)) = mode_of(&counts) else {
            continue;
        };
        if mode == 0 {
            continue;
        }

        let consistency = frequency as f64 / lines.len() as f64;
        match best {
            Some((_, best_consistency)) if best_consistency >= consistency => {}
            _ => best = Some((candidate, consistency)),
        }
    }

    match best {
        None => Err(DetectError::NoDelimiter),
        Some((_, consistency)) if consistency < MIN_CONSISTENCY => {
            Err(DetectError::Inconsistent(consistency))
        }
        Some((delimiter, _)) => Ok(delimiter),
    }
}

/// Detect the delimiter, falling back to comma on any detection failure
pub fn delimiter_or_default(sample: &str) -> u8 {
    match detect_delimiter(sample) {
        Ok(delimiter) => delimiter,
        Err(e) => {
            tracing::debug!("Delimiter detection failed ({}), using ','", e);
            DEFAULT_DELIMITER
        }
    }
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for &b in line.as_bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
        } else if b == delimiter && !in_quotes {
            count += 1;
        }
    }
    count
}

/// Most frequent value and its frequency; larger values win ties
fn mode_of(counts: &[usize]) -> Option<(usize, usize)> {
    let mut frequencies: HashMap<usize, usize> = HashMap::new();
    for &c in counts {
        *frequencies.entry(c).or_insert(0) += 1;
    }
    frequencies
        .into_iter()
        .max_by(|(va, fa), (vb, fb)| fa.cmp(fb).then(va.cmp(vb)))
}
