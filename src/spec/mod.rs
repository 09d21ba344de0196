//! Input schemas: the trace feed written by the capture side and the
//! shapes nested inside it. Parsing of plain-text logs lives in `log`.

pub mod feed;

pub use feed::{Capture, CheckpointMark, PlanRow, SideTable, StackFrame, TraceFeed};
