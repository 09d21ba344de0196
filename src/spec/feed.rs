//! Raw trace feed (trace.json), as handed over by the capture side.
//!
//! JSON shape:
//! {
//!   "name": "default",                      // optional profiler name
//!   "labels": ["SELECT ...", ...],          // one label per logged operation
//!   "timings": [0.10, 0.12, 0.12, 0.31],    // flat start/stop stamps, seconds
//!   "captures": { "0": { "memory_before": 1024, "memory_after": 4096,
//!                        "rows": 3, "call_stack": [...] } },
//!   "explain": { "0": [ { "key": null, "Extra": "Using filesort" } ] },
//!   "profile": { "0": [ { "Status": "init", "Duration": 0.0002 } ] },
//!   "checkpoints": [ { "name": "start", "time": 0.0, "memory": 1048576 } ]
//! }
//!
//! Only `labels` is required. Index-keyed tables are checked against the label
//! count by the analysis, not here.

use crate::error::{AnalyzeError, AnalyzeResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of an engine-native diagnostic table (execution plan, profile...).
pub type PlanRow = serde_json::Map<String, serde_json::Value>;

/// Diagnostic rows keyed by entry index.
pub type SideTable = BTreeMap<usize, Vec<PlanRow>>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraceFeed {
    #[serde(default)]
    pub name: Option<String>,

    pub labels: Vec<String>,

    #[serde(default)]
    pub timings: Vec<f64>,

    #[serde(default)]
    pub captures: BTreeMap<usize, Capture>,

    #[serde(default)]
    pub explain: SideTable,

    #[serde(default)]
    pub profile: SideTable,

    #[serde(default)]
    pub checkpoints: Vec<CheckpointMark>,
}

/// Memory and call path captured around one operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Capture {
    #[serde(default)]
    pub memory_before: Option<u64>,

    #[serde(default)]
    pub memory_after: Option<u64>,

    /// Only present for row-returning operations.
    #[serde(default)]
    pub rows: Option<u64>,

    #[serde(default)]
    pub call_stack: Vec<StackFrame>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StackFrame {
    pub function: String,

    #[serde(default)]
    pub class: Option<String>,

    /// Separator between class and function, e.g. "->" or "::".
    #[serde(default)]
    pub call_type: Option<String>,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub line: Option<u32>,
}

/// A named point with cumulative time (seconds) and memory (bytes) since run start.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CheckpointMark {
    pub name: String,
    pub time: f64,
    pub memory: u64,
}

impl TraceFeed {
    /// Reject feeds no analysis can make sense of.
    ///
    /// Short timing feeds, missing captures and empty runs are all fine; what is
    /// refused is numeric garbage (NaN or infinite stamps).
    pub fn validate(&self) -> AnalyzeResult<()> {
        if let Some(pos) = self.timings.iter().position(|t| !t.is_finite()) {
            return Err(AnalyzeError::InvalidFeed(format!(
                "timestamp #{} is not a finite number",
                pos
            )));
        }
        if let Some(mark) = self.checkpoints.iter().find(|m| !m.time.is_finite()) {
            return Err(AnalyzeError::InvalidFeed(format!(
                "checkpoint {:?} has a non-finite time",
                mark.name
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn minimal_feed_only_needs_labels() {
        let feed: TraceFeed = serde_json::from_str(r#"{ "labels": ["SELECT 1"] }"#).unwrap();
        assert_eq!(feed.labels, vec!["SELECT 1".to_string()]);
        assert!(feed.timings.is_empty());
        assert!(feed.captures.is_empty());
        assert_eq!(feed.name(), "default");
        assert_eq!(feed.validate(), Ok(()));
    }

    #[test]
    fn index_keyed_tables_parse_from_string_keys() {
        let feed: TraceFeed = serde_json::from_str(
            r#"{
                "name": "site",
                "labels": ["SELECT a FROM t", "UPDATE t SET a = 1"],
                "timings": [0.0, 0.5, 0.5, 1.0],
                "captures": { "1": { "memory_before": 10, "memory_after": 30, "rows": null,
                    "call_stack": [{ "function": "save", "class": "Repo", "call_type": "->",
                                     "file": "src/repo.php", "line": 42 }] } },
                "explain": { "0": [ { "key": null, "Extra": "Using where" } ] }
            }"#,
        )
        .unwrap();

        assert_eq!(feed.name(), "site");
        let capture = &feed.captures[&1];
        assert_eq!(capture.memory_before, Some(10));
        assert_eq!(capture.rows, None);
        assert_eq!(capture.call_stack[0].line, Some(42));
        assert_eq!(feed.explain[&0].len(), 1);
        assert!(feed.explain[&0][0]["key"].is_null());
    }

    #[test]
    fn non_finite_stamps_are_rejected() {
        let feed = TraceFeed {
            labels: vec!["a".into()],
            timings: vec![0.0, f64::NAN],
            ..TraceFeed::default()
        };
        assert!(matches!(feed.validate(), Err(AnalyzeError::InvalidFeed(_))));
    }
}
