// 📋 Tabular Dataset - Parsed upload handed over by the table-parsing service
// Header + rows + optional provenance, with the schema checks the analytics need

use crate::error::{AnalyticsError, AnalyticsResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// CELL VALUES
// ============================================================================

/// Value - One scalar cell of an uploaded table
///
/// Untagged so rows arrive from JSON as plain objects:
/// `{"Hourly_Rate": 18.5, "Start_Time": "2024-03-01T09:00:00", "Employee": "Ana"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

/// Wall-clock layouts seen in exported POS / timeclock files
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only cells count as midnight
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

impl Value {
    /// Numeric view of the cell. Currency text like "$1,250.00" is accepted.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .chars()
                    .filter(|c| *c != '$' && *c != ',')
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Timestamp view of the cell (wall-clock, offsets are dropped)
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

/// Parse a timestamp in any of the supported layouts.
///
/// RFC 3339 values keep their local wall-clock time; hour bucketing is done
/// on the clock the shift was worked on, not on UTC.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Row - column name → cell value
pub type Row = HashMap<String, Value>;

// ============================================================================
// TABULAR DATASET
// ============================================================================

/// Wire shape; checked through `TabularDataset::new` before use
#[derive(Deserialize)]
struct RawTabularDataset {
    columns: Vec<String>,
    rows: Vec<Row>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabularDataset {
    /// Header, in upload order
    pub columns: Vec<String>,

    pub rows: Vec<Row>,

    /// Originating filename (only used as a classification hint)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl TabularDataset {
    /// Build a dataset, checking that names are unique and every row matches the header
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> AnalyticsResult<Self> {
        let mut seen = HashSet::new();
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(AnalyticsError::DuplicateColumn(name.clone()));
            }
        }

        for (index, row) in rows.iter().enumerate() {
            if let Some(missing) = columns.iter().find(|c| !row.contains_key(c.as_str())) {
                return Err(AnalyticsError::RowShapeMismatch {
                    row: index,
                    reason: format!("missing value for column '{}'", missing),
                });
            }
            if let Some(extra) = row.keys().find(|k| !seen.contains(k.as_str())) {
                return Err(AnalyticsError::RowShapeMismatch {
                    row: index,
                    reason: format!("unexpected column '{}'", extra),
                });
            }
        }

        Ok(TabularDataset {
            columns,
            rows,
            source: None,
        })
    }

    /// Header-only dataset (enough for classification)
    pub fn from_header<S: AsRef<str>>(columns: &[S]) -> AnalyticsResult<Self> {
        Self::new(columns.iter().map(|c| c.as_ref().to_string()).collect(), Vec::new())
    }

    /// Builder pattern: attach the originating filename
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Schema projection: fail fast on the first column the caller needs but the upload lacks
    pub fn require_columns(&self, names: &[&str]) -> AnalyticsResult<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(missing) => Err(AnalyticsError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'de> Deserialize<'de> for TabularDataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTabularDataset::deserialize(deserializer)?;
        let mut dataset =
            TabularDataset::new(raw.columns, raw.rows).map_err(serde::de::Error::custom)?;
        dataset.source = raw.source;
        Ok(dataset)
    }
}

// ============================================================================
// TESTS
// ============================================================================
