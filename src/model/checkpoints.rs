//! Timeline of named checkpoints (cumulative time and memory since start).
//!
//! Unlike logged operations, checkpoints carry a single cumulative reading:
//! the cost of mark `i` is its delta against mark `i - 1`. The time and the
//! memory readings give two independent timelines over the same marks.

use crate::model::classify::{Classification, Classifier};
use crate::model::layout::{self, BarSegment, SegmentSpan};
use crate::spec::CheckpointMark;

use serde::Serialize;

const BYTES_PER_MB: f64 = 1_048_576.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Time,
    Memory,
}

impl Metric {
    fn reading(self, mark: &CheckpointMark) -> f64 {
        match self {
            Metric::Time => mark.time,
            Metric::Memory => mark.memory as f64,
        }
    }

    /// Tooltip text for a delta of this metric.
    fn describe(self, name: &str, delta: f64) -> String {
        match self {
            Metric::Time => format!("{} {:.2} ms", name, delta * 1000.0),
            Metric::Memory => format!("{} {:.3} MB", name, delta / BYTES_PER_MB),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointRow {
    pub mark: CheckpointMark,
    /// Seconds for the time metric, bytes for memory.
    pub delta: f64,
    pub classification: Classification,
    /// Absent when the timeline total is not positive.
    pub segment: Option<BarSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointTimeline {
    pub metric: Metric,
    /// Final cumulative reading.
    pub total: f64,
    pub average: Option<f64>,
    pub rows: Vec<CheckpointRow>,
}

impl CheckpointTimeline {
    pub fn build(marks: &[CheckpointMark], metric: Metric) -> Self {
        let readings: Vec<f64> = marks.iter().map(|m| metric.reading(m)).collect();
        let deltas: Vec<f64> = readings
            .iter()
            .enumerate()
            .map(|(i, &r)| if i == 0 { 0.0 } else { r - readings[i - 1] })
            .collect();

        let total = readings.last().copied().unwrap_or(0.0);
        let classifier = if marks.is_empty() {
            Classifier::default()
        } else {
            Classifier::with_average(total / marks.len() as f64)
        };

        let spans: Vec<SegmentSpan> = deltas
            .iter()
            .map(|&duration| SegmentSpan { gap: 0.0, duration })
            .collect();
        let mut geometry = layout::layout(total, &spans).into_iter();
        if total <= 0.0 && !marks.is_empty() {
            tracing::debug!(?metric, total, "checkpoint timeline has no positive total");
        }

        let rows = marks
            .iter()
            .zip(&deltas)
            .enumerate()
            .map(|(i, (mark, &delta))| {
                // The first mark is the baseline every delta is measured from.
                let classification = if i == 0 {
                    Classification::Normal
                } else {
                    classifier.classify(delta)
                };
                let segment = geometry.next().map(|geometry| BarSegment {
                    geometry,
                    style_class: classification.bar_class(),
                    tooltip: metric.describe(&mark.name, delta),
                });
                CheckpointRow {
                    mark: mark.clone(),
                    delta,
                    classification,
                    segment,
                }
            })
            .collect();

        Self {
            metric,
            total,
            average: classifier.average(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::layout::MIN_WIDTH;
    use pretty_assertions::assert_eq;

    fn marks(times: &[f64]) -> Vec<CheckpointMark> {
        times
            .iter()
            .enumerate()
            .map(|(i, &time)| CheckpointMark {
                name: format!("mark{}", i),
                time,
                memory: (i as u64 + 1) * 1_048_576,
            })
            .collect()
    }

    #[test]
    fn deltas_and_classes_against_run_average() {
        let timeline = CheckpointTimeline::build(&marks(&[0.0, 0.1, 0.35, 0.4]), Metric::Time);

        let deltas: Vec<f64> = timeline.rows.iter().map(|r| r.delta).collect();
        let expected = [0.0, 0.1, 0.25, 0.05];
        for (got, want) in deltas.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "{} != {}", got, want);
        }
        assert!((timeline.average.unwrap() - 0.1).abs() < 1e-12);

        let classes: Vec<Classification> =
            timeline.rows.iter().map(|r| r.classification).collect();
        assert_eq!(
            classes,
            vec![
                Classification::Normal,
                Classification::Normal,
                Classification::High,
                Classification::Low,
            ]
        );
    }

    #[test]
    fn segments_span_the_final_total() {
        let timeline = CheckpointTimeline::build(&marks(&[0.0, 0.1, 0.35, 0.4]), Metric::Time);
        let segments: Vec<&BarSegment> =
            timeline.rows.iter().filter_map(|r| r.segment.as_ref()).collect();
        assert_eq!(segments.len(), 4);

        // First mark has nothing to show but still gets the floor.
        assert_eq!(segments[0].geometry.width_percent, MIN_WIDTH);
        assert_eq!(segments[1].geometry.width_percent, 25.0);
        assert_eq!(segments[2].geometry.width_percent, 62.5);
        assert_eq!(segments[3].geometry.width_percent, 12.5);
        assert_eq!(segments[2].style_class, "bar-danger");
        assert_eq!(segments[2].tooltip, "mark2 250.00 ms");
    }

    #[test]
    fn memory_metric_uses_byte_readings() {
        let timeline = CheckpointTimeline::build(&marks(&[0.0, 1.0]), Metric::Memory);
        assert_eq!(timeline.total, 2.0 * 1_048_576.0);
        assert_eq!(timeline.rows[1].delta, 1_048_576.0);
        assert_eq!(
            timeline.rows[1].segment.as_ref().map(|s| s.tooltip.as_str()),
            Some("mark1 1.000 MB")
        );
    }

    #[test]
    fn empty_and_flat_runs_are_neutral() {
        let timeline = CheckpointTimeline::build(&[], Metric::Time);
        assert!(timeline.rows.is_empty());
        assert_eq!(timeline.average, None);

        let timeline = CheckpointTimeline::build(&marks(&[0.0, 0.0]), Metric::Time);
        assert!(timeline.rows.iter().all(|r| r.segment.is_none()));
        assert!(
            timeline
                .rows
                .iter()
                .all(|r| r.classification == Classification::Normal)
        );
    }
}
