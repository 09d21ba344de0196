use crate::Result;
use crate::diagnostics;
use crate::spec::CheckpointMark;

use anyhow::{Context, bail};
use regex::Regex;
use std::collections::HashSet;
use std::fs;

/// Parse a checkpoint log file into marks, in file order.
///
/// Expected columns (whitespace-separated):
/// time_seconds  memory_bytes  name...
///
/// Example:
/// 0.105   2097152   afterRoute
pub fn parse_marks_file(path: &str) -> Result<Vec<CheckpointMark>> {
    let text = fs::read_to_string(path)
        .with_context(|| diagnostics::error_message(format!("read marks file {}", path)))?;
    parse_marks_str(&text, path)
}

/// Same as [`parse_marks_file`], on text already in memory. `origin` only
/// appears in error messages.
pub fn parse_marks_str(text: &str, origin: &str) -> Result<Vec<CheckpointMark>> {
    // Capture:
    // 1) time: seconds, plain or exponent notation
    // 2) memory: bytes
    // 3) name: rest of line (may contain spaces)
    const MARK_LINE_RE: &str =
        r#"^\s*([0-9]+(?:\.[0-9]*)?(?:[eE][-+]?[0-9]+)?)\s+(\d+)\s+(.*?)\s*$"#;
    let re = Regex::new(MARK_LINE_RE)?;

    let mut out: Vec<CheckpointMark> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (lineno, line) in text.lines().enumerate() {
        let lno = lineno + 1;
        let line = line.trim_end();

        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let Some(caps) = re.captures(line) else {
            // Header line.
            if line.contains("time") && line.contains("memory") && line.contains("name") {
                continue;
            }
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "marks parse error at {}:{}: cannot parse line: {:?}",
                    origin, lno, line
                ))
            );
        };

        let time: f64 = caps[1].parse().with_context(|| {
            diagnostics::error_message(format!("bad time at {}:{}: {}", origin, lno, &caps[1]))
        })?;
        let memory: u64 = caps[2].parse().with_context(|| {
            diagnostics::error_message(format!("bad memory at {}:{}: {}", origin, lno, &caps[2]))
        })?;
        let name = caps[3].to_string();
        if name.is_empty() {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "marks parse error at {}:{}: missing name",
                    origin, lno
                ))
            );
        }

        if let Some(prev) = out.last() {
            if time < prev.time {
                diagnostics::warn(format!(
                    "mark {:?} at {}:{} goes back in time ({} < {})",
                    name, origin, lno, time, prev.time
                ));
            }
        }
        if !seen.insert(name.clone()) {
            diagnostics::warn(format!(
                "mark {:?} at {}:{} is a repeated name",
                name, origin, lno
            ));
        }

        out.push(CheckpointMark { name, time, memory });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_marks_with_header_and_blank_lines() {
        let text = "time  memory  name\n\
                    0.000  1048576  Application start\n\
                    \n\
                    # routing\n\
                    0.105  2097152  afterRoute\n\
                    1.5e-1 2097152 afterDispatch\n";
        let marks = parse_marks_str(text, "marks.tsv").unwrap();
        assert_eq!(
            marks,
            vec![
                CheckpointMark { name: "Application start".into(), time: 0.0, memory: 1_048_576 },
                CheckpointMark { name: "afterRoute".into(), time: 0.105, memory: 2_097_152 },
                CheckpointMark { name: "afterDispatch".into(), time: 0.15, memory: 2_097_152 },
            ]
        );
    }

    #[test]
    fn malformed_line_reports_position() {
        let err = parse_marks_str("0.1 100 ok\nnot a mark\n", "marks.tsv").unwrap_err();
        assert!(err.to_string().contains("marks.tsv:2"), "{}", err);
    }

    #[test]
    fn mark_named_like_header_is_kept() {
        let text = "time memory name\n0.1 100 runtime memory rename\n";
        let marks = parse_marks_str(text, "m").unwrap();
        assert_eq!(
            marks,
            vec![CheckpointMark { name: "runtime memory rename".into(), time: 0.1, memory: 100 }]
        );
    }

    #[test]
    fn backwards_marks_are_kept() {
        let marks = parse_marks_str("0.2 1 a\n0.1 1 b\n", "m").unwrap();
        assert_eq!(marks.len(), 2);
    }
}
