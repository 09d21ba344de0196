//! Serializable report data handed to the renderers.

use crate::model::checkpoints::{CheckpointTimeline, Metric};
use crate::model::duplicates::DuplicateGroup;
use crate::model::families::{Bucket, FamilyRanking};
use crate::model::{Analysis, Totals, TraceEntry};

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub name: String,
    pub totals: Totals,
    pub entries: Vec<TraceEntry>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub families: FamiliesView,
    pub checkpoints: CheckpointsView,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamiliesView {
    pub primary: Vec<FamilyRanking>,
    pub other: Vec<FamilyRanking>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckpointsView {
    pub time: CheckpointTimeline,
    pub memory: CheckpointTimeline,
}

/// Snapshot one analysis pass into report data.
pub fn build_report_data(name: &str, analysis: &Analysis) -> ReportData {
    ReportData {
        name: name.to_string(),
        totals: analysis.totals().clone(),
        entries: analysis.entries().to_vec(),
        duplicate_groups: analysis.duplicate_groups().to_vec(),
        families: FamiliesView {
            primary: analysis.families(Bucket::Primary),
            other: analysis.families(Bucket::Other),
        },
        checkpoints: CheckpointsView {
            time: analysis.checkpoint_timeline(Metric::Time).clone(),
            memory: analysis.checkpoint_timeline(Metric::Memory).clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::spec::TraceFeed;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_with_lowercase_enums() {
        let feed = TraceFeed {
            labels: vec!["SELECT a FROM t".into(), "SELECT a FROM t".into()],
            timings: vec![0.0, 1.0, 1.0, 2.0],
            ..TraceFeed::default()
        };
        let analysis = Analysis::run(&feed, &Config::default()).unwrap();
        let data = build_report_data("site", &analysis);
        let value = serde_json::to_value(&data).unwrap();

        assert_eq!(value["name"], "site");
        assert_eq!(value["totals"]["duplicates"], 2);
        assert_eq!(value["entries"][0]["time_class"], "normal");
        assert_eq!(value["entries"][0]["bucket"], "primary");
        assert_eq!(value["entries"][1]["segment"]["width_percent"], 50.0);
        assert_eq!(value["entries"][1]["segment"]["style_class"], "bar-warning");
        assert_eq!(value["families"]["primary"][0]["count"], 2);
        assert_eq!(value["checkpoints"]["time"]["metric"], "time");
    }
}
