//! Analysis of one captured trace: timing, duplicates, anomaly classes,
//! timeline geometry and operation families.
//!
//! Everything here is computed once from an immutable feed. Independent feeds
//! can be analyzed concurrently; nothing is shared between passes.

pub mod checkpoints;
pub mod classify;
pub mod duplicates;
pub mod families;
pub mod layout;
pub mod plan;
pub mod report;
pub mod timing;

use crate::config::Config;
use crate::error::{AnalyzeError, AnalyzeResult};
use crate::spec::{StackFrame, TraceFeed};

use checkpoints::{CheckpointTimeline, Metric};
use classify::{Classification, Classifier};
use duplicates::{DuplicateGroup, Duplicates};
use families::{Bucket, Families, FamilyRanking};
use layout::{BarSegment, SegmentSpan};
use plan::{PlanLookup, PlanTable, TableKind};
use timing::{Timing, TimingFeed};

use serde::Serialize;

/// Row counts above these are flagged.
pub const ROWS_WARNING: u64 = 1000;
pub const ROWS_DANGER: u64 = 3000;

/// Share of the checkpoint run time spent in logged operations.
pub const SHARE_HIGH: f64 = 0.25;
pub const SHARE_LOW: f64 = 0.15;

/// Row-count class; `None` for operations that returned nothing.
pub fn classify_rows(rows: u64) -> Option<Classification> {
    match rows {
        0 => None,
        r if r > ROWS_DANGER => Some(Classification::High),
        r if r > ROWS_WARNING => Some(Classification::Normal),
        _ => Some(Classification::Low),
    }
}

/// Class of `operations` seconds against a `run` of seconds.
pub fn classify_share(operations: f64, run: f64) -> Option<Classification> {
    if run <= 0.0 {
        return None;
    }
    Some(if operations > run * SHARE_HIGH {
        Classification::High
    } else if operations < run * SHARE_LOW {
        Classification::Low
    } else {
        Classification::Normal
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallFrame {
    /// Counts down from the stack depth to 1 (outermost caller first).
    pub number: usize,
    #[serde(flatten)]
    pub frame: StackFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEntry {
    pub index: usize,
    pub label: String,

    /// `None` for unmatched entries and degenerate runs.
    pub timing: Option<Timing>,
    pub time_class: Option<Classification>,
    pub segment: Option<BarSegment>,

    pub memory_before: Option<u64>,
    pub memory_after: Option<u64>,
    pub memory_used: Option<i64>,
    pub memory_class: Option<Classification>,

    pub row_count: Option<u64>,
    pub rows_class: Option<Classification>,

    pub family: String,
    pub bucket: Bucket,

    /// Other members of this entry's duplicate group.
    pub duplicates: Vec<usize>,

    pub explain: Option<PlanTable>,
    pub profile: Option<PlanTable>,
    pub has_warnings: bool,

    pub call_stack: Vec<CallFrame>,
}

impl TraceEntry {
    pub fn is_matched(&self) -> bool {
        self.timing.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub entries: usize,
    pub matched: usize,
    /// Seconds between the first and the last stamp, when positive.
    pub total_span: Option<f64>,
    /// Sum of matched durations, seconds.
    pub operation_time: f64,
    pub operation_share: Option<Classification>,
    pub average_duration: Option<f64>,
    pub average_memory: Option<f64>,
    pub duplicates: usize,
    pub families: usize,
    pub warnings: usize,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    entries: Vec<TraceEntry>,
    duplicates: Duplicates,
    families: Families,
    time_timeline: CheckpointTimeline,
    memory_timeline: CheckpointTimeline,
    totals: Totals,
}

impl Analysis {
    pub fn run(feed: &TraceFeed, config: &Config) -> AnalyzeResult<Self> {
        feed.validate()?;
        let count = feed.labels.len();

        if let Some(&index) = feed.captures.keys().find(|&&i| i >= count) {
            return Err(AnalyzeError::IndexOutOfRange {
                table: "capture table",
                index,
                len: count,
            });
        }
        plan::check_indices(&feed.explain, TableKind::Explain, count)?;
        plan::check_indices(&feed.profile, TableKind::Profile, count)?;

        let paired = TimingFeed::new(feed.timings.clone())?.pair_entries(count);
        let labels = || feed.labels.iter().map(String::as_str);
        let duplicates = Duplicates::detect(labels());
        let families = Families::aggregate(&config.family, labels());

        let memory_used = |index: usize| {
            let capture = feed.captures.get(&index)?;
            let after = i128::from(capture.memory_after?);
            let before = i128::from(capture.memory_before?);
            i64::try_from(after - before).ok()
        };

        let time_classifier = Classifier::from_values(paired.matched().map(|(_, t)| t.duration));
        let memory_classifier = Classifier::from_values(
            paired
                .matched()
                .filter_map(|(i, _)| memory_used(i))
                .map(|m| m as f64),
        );

        let matched: Vec<(usize, &Timing)> = paired.matched().collect();
        let spans: Vec<SegmentSpan> = matched
            .iter()
            .map(|(_, t)| SegmentSpan {
                gap: t.gap_before,
                duration: t.duration,
            })
            .collect();
        let geometry = paired
            .total_span
            .map(|span| layout::layout(span, &spans))
            .unwrap_or_default();
        let mut segments: Vec<Option<BarSegment>> = vec![None; count];
        for ((index, timing), geometry) in matched.iter().zip(geometry) {
            let class = time_classifier.classify(timing.duration);
            segments[*index] = Some(BarSegment {
                geometry,
                style_class: class.bar_class(),
                tooltip: bar_tooltip(*index, &feed.labels[*index], timing.duration),
            });
        }

        let mut entries = Vec::with_capacity(count);
        for (index, label) in feed.labels.iter().enumerate() {
            let timing = paired.timings[index];
            let capture = feed.captures.get(&index);

            let explain = feed
                .explain
                .rows(index)
                .map(|rows| config.markers.scan(TableKind::Explain, rows));
            let profile = feed
                .profile
                .rows(index)
                .map(|rows| config.markers.scan(TableKind::Profile, rows));
            let has_warnings = explain.as_ref().is_some_and(PlanTable::has_warnings)
                || profile.as_ref().is_some_and(PlanTable::has_warnings);

            let used = memory_used(index);
            let row_count = capture.and_then(|c| c.rows);

            entries.push(TraceEntry {
                index,
                label: label.clone(),
                timing,
                time_class: timing.map(|t| time_classifier.classify(t.duration)),
                segment: segments[index].take(),
                memory_before: capture.and_then(|c| c.memory_before),
                memory_after: capture.and_then(|c| c.memory_after),
                memory_used: used,
                memory_class: timing
                    .and(used)
                    .map(|m| memory_classifier.classify(m as f64)),
                row_count,
                rows_class: row_count.and_then(classify_rows),
                family: config.family.family_key(label),
                bucket: config.family.bucket_of(label),
                duplicates: duplicates.others(index),
                explain,
                profile,
                has_warnings,
                call_stack: capture
                    .map(|c| number_frames(&c.call_stack, &config.ignored_frame_classes))
                    .unwrap_or_default(),
            });
        }

        let time_timeline = CheckpointTimeline::build(&feed.checkpoints, Metric::Time);
        let memory_timeline = CheckpointTimeline::build(&feed.checkpoints, Metric::Memory);

        let operation_time: f64 = matched.iter().map(|(_, t)| t.duration).sum();
        let totals = Totals {
            entries: count,
            matched: entries.iter().filter(|e| e.is_matched()).count(),
            total_span: paired.total_span,
            operation_time,
            operation_share: feed
                .checkpoints
                .last()
                .and_then(|last| classify_share(operation_time, last.time)),
            average_duration: time_classifier.average(),
            average_memory: memory_classifier.average(),
            duplicates: duplicates.total_count(),
            families: families.distinct_count(),
            warnings: entries.iter().filter(|e| e.has_warnings).count(),
        };

        tracing::debug!(
            entries = totals.entries,
            matched = totals.matched,
            duplicates = totals.duplicates,
            "trace analyzed"
        );

        Ok(Self {
            entries,
            duplicates,
            families,
            time_timeline,
            memory_timeline,
            totals,
        })
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn duplicate_groups(&self) -> &[DuplicateGroup] {
        self.duplicates.groups()
    }

    pub fn total_duplicate_count(&self) -> usize {
        self.duplicates.total_count()
    }

    pub fn families(&self, bucket: Bucket) -> Vec<FamilyRanking> {
        self.families.ranked(bucket)
    }

    pub fn checkpoint_timeline(&self, metric: Metric) -> &CheckpointTimeline {
        match metric {
            Metric::Time => &self.time_timeline,
            Metric::Memory => &self.memory_timeline,
        }
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }
}

/// Longest label excerpt shown in a bar tooltip.
const TOOLTIP_LABEL_CHARS: usize = 48;

/// Label excerpt plus duration, e.g. `SELECT a FROM t 2.00 ms`.
fn bar_tooltip(index: usize, label: &str, duration: f64) -> String {
    let words = label.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut excerpt: String = words.chars().take(TOOLTIP_LABEL_CHARS).collect();
    if words.chars().count() > TOOLTIP_LABEL_CHARS {
        excerpt.push_str("...");
    }
    if excerpt.is_empty() {
        excerpt = format!("#{}", index + 1);
    }
    format!("{} {:.2} ms", excerpt, duration * 1000.0)
}

/// Drop ignored frames. Numbers count down from the full stack depth, so
/// dropped frames still use up their number.
fn number_frames(stack: &[StackFrame], ignored_classes: &[String]) -> Vec<CallFrame> {
    let depth = stack.len();
    stack
        .iter()
        .enumerate()
        .filter(|(_, frame)| {
            frame.class.as_deref().is_none_or(|class| {
                !ignored_classes
                    .iter()
                    .any(|ignored| class.contains(ignored.as_str()))
            })
        })
        .map(|(i, frame)| CallFrame {
            number: depth - i,
            frame: frame.clone(),
        })
        .collect()
}
