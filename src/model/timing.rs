//! Pairing of the flat timestamp feed into per-entry (start, end) timings.
//!
//! The capture side pushes one stamp before and one after each operation, so
//! entry `i` owns stamps `2i` and `2i + 1`. A feed shorter than the label list
//! (capture interrupted) leaves the trailing entries unmatched.

use crate::error::{AnalyzeError, AnalyzeResult};

use serde::Serialize;

/// Validated flat timestamp feed, in seconds.
#[derive(Debug, Clone, Default)]
pub struct TimingFeed {
    stamps: Vec<f64>,
}

/// Start/end of one matched entry plus its idle gap since the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timing {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub gap_before: f64,
}

/// Result of pairing a feed against a label list.
#[derive(Debug, Clone, Default)]
pub struct PairedTimings {
    /// One slot per label; `None` for unmatched entries.
    pub timings: Vec<Option<Timing>>,

    /// `end - start` of the whole feed, only when strictly positive.
    pub total_span: Option<f64>,
}

impl TimingFeed {
    pub fn new(stamps: Vec<f64>) -> AnalyzeResult<Self> {
        if let Some(pos) = stamps.iter().position(|t| !t.is_finite()) {
            return Err(AnalyzeError::InvalidFeed(format!(
                "timestamp #{} is not a finite number",
                pos
            )));
        }
        Ok(Self { stamps })
    }

    /// Number of complete (start, stop) pairs in the feed.
    pub fn matched_count(&self) -> usize {
        self.stamps.len() / 2
    }

    /// The (start, stop) stamps of entry `index`, if the feed covers it.
    pub fn pair(&self, index: usize) -> Option<(f64, f64)> {
        let stop = self.stamps.get(2 * index + 1)?;
        Some((self.stamps[2 * index], *stop))
    }

    /// Distance between the first and last stamp of the feed.
    pub fn total_span(&self) -> Option<f64> {
        let first = self.stamps.first()?;
        let last = self.stamps.last()?;
        Some(last - first)
    }

    /// Pair the feed against `entry_count` logged operations.
    ///
    /// A non-positive span (single stamp, clock going backwards) is a valid
    /// degenerate run: every entry comes back without timing.
    pub fn pair_entries(&self, entry_count: usize) -> PairedTimings {
        let span = match self.total_span() {
            Some(span) if span > 0.0 => span,
            other => {
                tracing::debug!(span = ?other, "timing feed has no usable span");
                return PairedTimings {
                    timings: vec![None; entry_count],
                    total_span: None,
                };
            }
        };

        if self.matched_count() > entry_count {
            tracing::debug!(
                pairs = self.matched_count(),
                entries = entry_count,
                "timing feed has more pairs than logged entries"
            );
        }

        let mut timings = Vec::with_capacity(entry_count);
        let mut previous_end: Option<f64> = None;
        for index in 0..entry_count {
            let timing = self.pair(index).map(|(start, end)| {
                let gap_before = previous_end.map_or(0.0, |prev| (start - prev).max(0.0));
                Timing {
                    start,
                    end,
                    duration: (end - start).max(0.0),
                    gap_before,
                }
            });
            previous_end = timing.map(|t| t.end);
            timings.push(timing);
        }

        PairedTimings {
            timings,
            total_span: Some(span),
        }
    }
}

impl PairedTimings {
    pub fn matched(&self) -> impl Iterator<Item = (usize, &Timing)> {
        self.timings
            .iter()
            .enumerate()
            .filter_map(|(index, timing)| timing.as_ref().map(|t| (index, t)))
    }
}
