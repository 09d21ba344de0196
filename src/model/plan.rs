//! Warning detection over engine-native diagnostic tables.
//!
//! The tables are opaque rows keyed by entry index. Only a handful of column
//! names and markers are looked at, all of them configurable through
//! [`WarningMarkers`].

use crate::error::{AnalyzeError, AnalyzeResult};
use crate::spec::{PlanRow, SideTable};

use serde::Serialize;
use serde_json::Value;

/// Per-entry diagnostic tables, looked up by entry index.
pub trait PlanLookup {
    fn rows(&self, index: usize) -> Option<&[PlanRow]>;

    /// Indices the lookup holds rows for, in increasing order.
    fn indices(&self) -> Vec<usize>;
}

impl PlanLookup for SideTable {
    fn rows(&self, index: usize) -> Option<&[PlanRow]> {
        self.get(&index).map(Vec::as_slice)
    }

    fn indices(&self) -> Vec<usize> {
        self.keys().copied().collect()
    }
}

/// Column names and values that flag a row.
#[derive(Debug, Clone, PartialEq)]
pub struct WarningMarkers {
    /// Column present when the diagnostic query itself failed.
    pub error_column: String,
    /// Index-usage column; a null value means no index was used.
    pub key_column: String,
    /// Free-form column searched for `filesort_marker`.
    pub extra_column: String,
    pub filesort_marker: String,
    /// Per-stage duration column (seconds) of profile tables.
    pub duration_column: String,
}

impl Default for WarningMarkers {
    fn default() -> Self {
        Self {
            error_column: "Error".to_string(),
            key_column: "key".to_string(),
            extra_column: "Extra".to_string(),
            filesort_marker: "Using filesort".to_string(),
            duration_column: "Duration".to_string(),
        }
    }
}

/// Profile stages shorter than this are never highlighted.
pub const SLOW_STAGE_SECS: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Explain,
    Profile,
}

impl TableKind {
    fn name(self) -> &'static str {
        match self {
            TableKind::Explain => "explain table",
            TableKind::Profile => "profile table",
        }
    }
}

/// Rows of one entry's table plus which of them warn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanTable {
    pub kind: TableKind,
    pub rows: Vec<PlanRow>,
    pub warning_rows: Vec<usize>,
}

impl PlanTable {
    pub fn has_warnings(&self) -> bool {
        !self.warning_rows.is_empty()
    }
}

/// Fail if `lookup` holds rows for an entry that was never logged.
pub fn check_indices(
    lookup: &dyn PlanLookup,
    kind: TableKind,
    entry_count: usize,
) -> AnalyzeResult<()> {
    match lookup.indices().into_iter().find(|&i| i >= entry_count) {
        Some(index) => Err(AnalyzeError::IndexOutOfRange {
            table: kind.name(),
            index,
            len: entry_count,
        }),
        None => Ok(()),
    }
}

fn is_null(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.eq_ignore_ascii_case("null"),
        _ => false,
    }
}

fn as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl WarningMarkers {
    /// Whether `row` flags a problem, ignoring durations.
    pub fn row_warns(&self, row: &PlanRow) -> bool {
        if row.contains_key(&self.error_column) {
            return true;
        }
        if row.get(&self.key_column).is_some_and(is_null) {
            return true;
        }
        row.get(&self.extra_column)
            .and_then(Value::as_str)
            .is_some_and(|extra| extra.contains(&self.filesort_marker))
    }

    /// Scan one table. Profile tables also flag their two slowest stages
    /// when those took at least [`SLOW_STAGE_SECS`].
    pub fn scan(&self, kind: TableKind, rows: &[PlanRow]) -> PlanTable {
        let mut durations: Vec<f64> = rows
            .iter()
            .filter_map(|row| row.get(&self.duration_column).and_then(as_seconds))
            .collect();
        durations.sort_by(|a, b| b.total_cmp(a));
        let top = &durations[..durations.len().min(2)];

        let warning_rows = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                let slow = kind == TableKind::Profile
                    && row
                        .get(&self.duration_column)
                        .and_then(as_seconds)
                        .is_some_and(|d| d >= SLOW_STAGE_SECS && top.contains(&d));
                slow || self.row_warns(row)
            })
            .map(|(i, _)| i)
            .collect();

        PlanTable {
            kind,
            rows: rows.to_vec(),
            warning_rows,
        }
    }
}
