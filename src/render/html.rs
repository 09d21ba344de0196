use crate::model::report::ReportData;

/// Render a self-contained HTML report (data embedded as JSON).
///
/// Important: we avoid `format!()` because the HTML contains many `{}` from JS
/// template literals (e.g., `${x}`), which would conflict with Rust formatting.
pub fn render_html_report(data: &ReportData) -> anyhow::Result<String> {
    // Labels are arbitrary text; keep them from closing the script element.
    let json = serde_json::to_string(data)?.replace("</", "<\\/");

    const TEMPLATE: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Trace Profiler</title>
<style>
  body { font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; margin: 0; color: #222; }
  header { padding: 12px 16px; border-bottom: 1px solid #ddd; }
  main { padding: 12px 16px; }
  h2 { font-size: 16px; margin: 18px 0 8px; }
  h3 { font-size: 14px; margin: 12px 0 6px; }

  .summary { display: flex; gap: 16px; flex-wrap: wrap; font-size: 14px; color: #333; }
  .pill { padding: 4px 8px; border: 1px solid #ddd; border-radius: 999px; background: #fafafa; }
  .muted { color: #777; font-size: 12px; }

  .label { display: inline-block; padding: 1px 6px; border-radius: 4px; font-size: 12px; color: white; background: #888; }
  .label-success { background: #3c9a4a; }
  .label-warning { background: #d89a1c; }
  .label-danger { background: #c9302c; }

  .bars { display: flex; height: 14px; background: #f1f1f1; border-radius: 3px; overflow: hidden; margin: 4px 0 8px; }
  .bar-spacer { height: 100%; flex: none; }
  .bar { height: 100%; flex: none; opacity: 0.35; }
  .bars:hover .bar { opacity: 0.6; }
  .bar:hover, .bar.active { opacity: 1; }
  .bar-success { background: #3c9a4a; }
  .bar-warning { background: #d89a1c; }
  .bar-danger { background: #c9302c; }

  ol.entries > li { margin-bottom: 14px; padding-bottom: 10px; border-bottom: 1px solid #eee; }
  pre { white-space: pre-wrap; background: #f7f7f7; padding: 6px 8px; border-radius: 4px; margin: 4px 0; }
  .alert { background: #fbeaea; border: 1px solid #f0c4c4; padding: 6px 8px; border-radius: 4px; margin: 6px 0; font-size: 13px; }
  table { border-collapse: collapse; margin: 6px 0; }
  th, td { border-bottom: 1px solid #eee; padding: 3px 8px; text-align: left; font-size: 13px; }
  tr.warning td { background: #ffffcc; color: #c9302c; font-weight: bold; }
  details { margin: 4px 0; font-size: 13px; }
  summary { cursor: pointer; }
  code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace; font-size: 13px; }
</style>
</head>
<body>
<header>
  <h1 id="title" style="font-size: 18px; margin: 0 0 8px;"></h1>
  <div class="summary" id="summary"></div>
</header>

<main>
  <section id="checkpoints"></section>
  <section id="entries"></section>
  <section id="families"></section>
</main>

<script>
// Embedded report data (JSON object literal)
const DATA = __DATA__;

function fmtMs(seconds) {
  return (seconds * 1000).toFixed(2) + " ms";
}

function fmtMb(bytes) {
  return (bytes / 1048576).toFixed(3) + " MB";
}

function escapeHtml(s) {
  return String(s)
    .replaceAll("&", "&amp;")
    .replaceAll("<", "&lt;")
    .replaceAll(">", "&gt;")
    .replaceAll('"', "&quot;")
    .replaceAll("'", "&#39;");
}

const LABEL_CLASS = { low: "label-success", normal: "label-warning", high: "label-danger" };

function label(text, cls) {
  return `<span class="label ${cls ? LABEL_CLASS[cls] : ""}">${text}</span>`;
}

function renderBars(segments, activeIndex) {
  const parts = [];
  segments.forEach((seg, i) => {
    if (!seg) return;
    if (seg.pre_gap_percent) {
      parts.push(`<div class="bar-spacer" style="width:${seg.pre_gap_percent}%"></div>`);
    }
    const active = i === activeIndex ? " active" : "";
    const overlap = seg.overflow_percent ? `margin-left:-${seg.overflow_percent}%;` : "";
    parts.push(`<div class="bar ${seg.style_class}${active}" title="${escapeHtml(seg.tooltip)}" style="${overlap}width:${seg.width_percent}%"></div>`);
  });
  return `<div class="bars">${parts.join("")}</div>`;
}

function renderTable(table) {
  if (!table || !table.rows.length) return "";
  const cols = Object.keys(table.rows[0]);
  const head = cols.map((c) => `<th>${escapeHtml(c)}</th>`).join("");
  const body = table.rows.map((row, i) => {
    const cls = table.warning_rows.includes(i) ? ' class="warning"' : "";
    const cells = cols.map((c) => `<td>${escapeHtml(row[c] === null ? "NULL" : row[c])}</td>`).join("");
    return `<tr${cls}>${cells}</tr>`;
  }).join("");
  return `<table><tr>${head}</tr>${body}</table>`;
}

function renderStack(frames) {
  if (!frames.length) return "";
  const rows = frames.map((f) => {
    const caller = f.class ? `${f.class}${f.call_type || ""}${f.function}()` : `${f.function}()`;
    const where = f.file ? `${f.file}${f.line ? ":" + f.line : ""}` : "same file";
    return `<tr><td>${f.number}</td><td><code>${escapeHtml(caller)}</code></td><td>${escapeHtml(where)}</td></tr>`;
  }).join("");
  return `<details><summary>Call stack</summary><table><tr><th>#</th><th>Caller</th><th>File and line</th></tr>${rows}</table></details>`;
}

function renderSummary() {
  const t = DATA.totals;
  document.getElementById("title").textContent = `${DATA.name} profiler`;
  document.getElementById("summary").innerHTML = `
    <span class="pill">operations: <b>${t.entries}</b></span>
    <span class="pill">timed: <b>${t.matched}</b></span>
    <span class="pill">operation time: ${label(fmtMs(t.operation_time), t.operation_share)}</span>
    <span class="pill">duplicates: <b>${t.duplicates}</b></span>
    <span class="pill">families: <b>${t.families}</b></span>
    <span class="pill">with warnings: <b>${t.warnings}</b></span>
  `;
}

function renderCheckpoints() {
  const time = DATA.checkpoints.time;
  const memory = DATA.checkpoints.memory;
  if (!time.rows.length) return;
  const list = time.rows.map((row, i) => {
    const mem = memory.rows[i];
    return `<div><code>${escapeHtml(row.mark.name)}</code> `
      + `${label(fmtMs(row.mark.time), null)} `
      + `${label("+" + fmtMs(row.delta), row.classification)} `
      + `${label(fmtMb(mem.mark.memory), null)} `
      + `${label("+" + fmtMb(mem.delta), mem.classification)}</div>`;
  }).join("");
  document.getElementById("checkpoints").innerHTML = `
    <h2>Profile information</h2>
    <h3>Time</h3>${renderBars(time.rows.map((r) => r.segment), null)}
    <h3>Memory</h3>${renderBars(memory.rows.map((r) => r.segment), null)}
    ${list}
  `;
}

function renderEntries() {
  const el = document.getElementById("entries");
  if (!DATA.entries.length) {
    el.innerHTML = "<h2>No operations logged</h2>";
    return;
  }
  const segments = DATA.entries.map((e) => e.segment);
  const parts = [`<h2>${DATA.entries.length} operations logged ${label(fmtMs(DATA.totals.operation_time), DATA.totals.operation_share)}</h2>`];

  if (DATA.totals.duplicates) {
    const groups = DATA.duplicate_groups.map((g) =>
      `<div>${g.indices.length} duplicates: ${g.indices.map((i) => `<a href="#entry-${i + 1}">#${i + 1}</a>`).join("&nbsp; ")}</div>`
    ).join("");
    parts.push(`<div class="alert"><b>${DATA.totals.duplicates} duplicate operations</b>${groups}</div>`);
  }

  const items = DATA.entries.map((e) => {
    const out = [`<a id="entry-${e.index + 1}"></a>`];
    if (e.timing) {
      let line = `Time: ${label(fmtMs(e.timing.duration), e.time_class)}`;
      if (e.timing.gap_before) line += ` after previous: ${label(fmtMs(e.timing.gap_before), null)}`;
      if (e.memory_used !== null) line += ` memory: ${label(fmtMb(e.memory_used), e.memory_class)}`;
      if (e.row_count !== null) line += ` rows: ${label(e.row_count, e.rows_class)}`;
      out.push(`<div>${line}</div>`);
      out.push(renderBars(segments, e.index));
    }
    if (e.duplicates.length) {
      out.push(`<div class="alert">Duplicate of: ${e.duplicates.map((i) => `<a href="#entry-${i + 1}">#${i + 1}</a>`).join("&nbsp; ")}</div>`);
    }
    out.push(`<pre>${escapeHtml(e.label)}</pre>`);
    if (e.explain) out.push(`<details${e.explain.warning_rows.length ? " open" : ""}><summary>Explain</summary>${renderTable(e.explain)}</details>`);
    if (e.profile) out.push(`<details><summary>Profile</summary>${renderTable(e.profile)}</details>`);
    out.push(renderStack(e.call_stack));
    return `<li>${out.join("")}</li>`;
  }).join("");
  parts.push(`<ol class="entries">${items}</ol>`);
  el.innerHTML = parts.join("");
}

function renderFamilies() {
  const f = DATA.families;
  const list = (title, ranked) => ranked.length
    ? `<h3>${title}</h3><ol>${ranked.map((r) => `<li><code>${escapeHtml(r.key)}</code> <span class="muted">&times;${r.count}</span></li>`).join("")}</ol>`
    : "";
  document.getElementById("families").innerHTML = `
    <h2>${f.primary.length + f.other.length} operation families</h2>
    ${list("Primary", f.primary)}
    ${list("Other", f.other)}
  `;
}

renderSummary();
renderCheckpoints();
renderEntries();
renderFamilies();
</script>
</body>
</html>
"##;

    Ok(TEMPLATE.replace("__DATA__", &json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::Analysis;
    use crate::model::report::build_report_data;
    use crate::spec::TraceFeed;

    #[test]
    fn embeds_data_and_escapes_script_close() {
        let feed = TraceFeed {
            labels: vec!["SELECT '</script>' FROM t".into()],
            timings: vec![0.0, 1.0],
            ..TraceFeed::default()
        };
        let analysis = Analysis::run(&feed, &Config::default()).unwrap();
        let html = render_html_report(&build_report_data("site", &analysis)).unwrap();

        assert!(!html.contains("__DATA__"));
        assert!(html.contains(r#""name":"site""#));
        assert!(html.contains(r"<\/script>' FROM t"));
        assert_eq!(html.matches("</script>").count(), 1);
    }
}
