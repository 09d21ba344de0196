//! Proportional placement of segments on a shared 0..100% timeline.
//!
//! Each segment is a leading gap followed by a bar. Bars thinner than
//! [`MIN_WIDTH`] are widened, taking the extra room from their own leading gap
//! first. Whatever the gap cannot give is recorded as overflow: the bar then
//! overlaps its predecessor. The first bar has no gap of its own, so once the
//! forward pass is done its overflow is taken from the second segment's gap.
//!
//! The pass is strictly forward: adjusting segment `i` never touches segments
//! before it.

use serde::Serialize;

/// Narrowest bar rendered, in percent of the timeline.
pub const MIN_WIDTH: f64 = 0.3;

/// Input of one segment, in the same unit as the total span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSpan {
    pub gap: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Geometry {
    pub pre_gap_percent: f64,
    pub width_percent: f64,
    /// Part of the minimum width no gap could absorb.
    pub overflow_percent: f64,
}

/// One rendered timeline unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSegment {
    #[serde(flatten)]
    pub geometry: Geometry,
    pub style_class: &'static str,
    pub tooltip: String,
}

/// Round to the 4 decimals the report displays.
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Take `deficit` out of `gap`, returning what the gap could not give.
fn borrow(gap: &mut f64, deficit: f64) -> f64 {
    let left = *gap - deficit;
    if left < 0.0 {
        *gap = 0.0;
        round4(-left)
    } else {
        *gap = round4(left);
        0.0
    }
}

/// Lay out `spans` over `total_span`. A non-positive span lays out nothing.
pub fn layout(total_span: f64, spans: &[SegmentSpan]) -> Vec<Geometry> {
    if !(total_span > 0.0 && total_span.is_finite()) {
        return Vec::new();
    }
    let unit = total_span / 100.0;

    let mut out: Vec<Geometry> = Vec::with_capacity(spans.len());
    for span in spans {
        let mut geometry = Geometry {
            pre_gap_percent: round4(span.gap.max(0.0) / unit),
            width_percent: round4(span.duration / unit),
            overflow_percent: 0.0,
        };
        if geometry.width_percent < MIN_WIDTH {
            let deficit = MIN_WIDTH - geometry.width_percent;
            geometry.overflow_percent = borrow(&mut geometry.pre_gap_percent, deficit);
            geometry.width_percent = MIN_WIDTH;
        }
        out.push(geometry);
    }

    // First bar: push its overflow into the second segment's gap.
    if let [first, second, ..] = out.as_mut_slice() {
        if first.overflow_percent > 0.0 {
            first.overflow_percent = borrow(&mut second.pre_gap_percent, first.overflow_percent);
        }
    }

    out
}
