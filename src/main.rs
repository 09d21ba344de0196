use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

mod config;
mod diagnostics;
mod error;
mod log;
mod model;
mod render;
mod spec;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "optrace-report")]
#[command(about = "Operation trace profiler", long_about = None)]
struct Cli {
    /// Log analysis details (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a captured trace and write the report.
    Report {
        /// Trace feed (JSON) produced by the capture side.
        #[arg(long)]
        trace: String,

        /// Plain-text checkpoint log; replaces the feed's checkpoints.
        #[arg(long)]
        marks: Option<String>,

        #[arg(short = 'o', long, conflicts_with = "dump_dir")]
        out: Option<String>,

        /// Write to DIR/profiler_<name>_<time>.html without overwriting.
        #[arg(long)]
        dump_dir: Option<String>,

        /// Emit the report data as JSON instead of HTML.
        #[arg(long)]
        json: bool,

        /// Profiler name (defaults to the feed's).
        #[arg(long)]
        name: Option<String>,

        /// Label prefix of primary operations.
        #[arg(long, default_value = "select")]
        primary_keyword: String,

        /// Keyword after which family boundaries are searched.
        #[arg(long, default_value = "from")]
        anchor_keyword: String,

        /// Family boundary keywords, by priority.
        #[arg(long = "boundary", default_values = ["where", "order by"])]
        boundaries: Vec<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// First free `profiler_<name>_<secs>[_n].html` in `dir`.
fn dump_path(dir: &Path, name: &str, secs: u64) -> PathBuf {
    let base = format!("profiler_{}_{}", name, secs);
    let mut candidate = dir.join(format!("{}.html", base));
    let mut n = 0;
    while candidate.exists() {
        n += 1;
        candidate = dir.join(format!("{}_{}.html", base, n));
    }
    candidate
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::Report {
            trace,
            marks,
            out,
            dump_dir,
            json,
            name,
            primary_keyword,
            anchor_keyword,
            boundaries,
        } => {
            // 1) Parse the trace feed (+ optional checkpoint log).
            let text = std::fs::read_to_string(&trace)
                .with_context(|| diagnostics::error_message(format!("read trace {}", trace)))?;
            let mut feed: spec::TraceFeed = serde_json::from_str(&text)
                .with_context(|| diagnostics::error_message(format!("parse trace {}", trace)))?;
            if let Some(marks) = &marks {
                feed.checkpoints = log::parse_marks_file(marks)?;
            }

            let config = config::Config {
                name,
                family: model::families::FamilyRules::new(
                    primary_keyword,
                    anchor_keyword,
                    boundaries,
                ),
                ..config::Config::default()
            };
            let name = config
                .name
                .clone()
                .unwrap_or_else(|| feed.name().to_string());

            // 2) Analyze.
            let analysis = model::Analysis::run(&feed, &config)
                .with_context(|| diagnostics::error_message(format!("analyze {}", trace)))?;
            let data = model::report::build_report_data(&name, &analysis);

            // 3) Render.
            let rendered = if json {
                serde_json::to_string_pretty(&data)?
            } else {
                render::render_html_report(&data)?
            };

            let out = match (out, dump_dir) {
                (Some(out), _) => PathBuf::from(out),
                (None, Some(dir)) => {
                    let secs = SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .map(|d| d.as_secs())
                        .unwrap_or_default();
                    dump_path(Path::new(&dir), &name, secs)
                }
                (None, None) => bail!("either --out or --dump-dir is required"),
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("write report {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dump_path_skips_existing_files() {
        let dir = std::env::temp_dir().join(format!("optrace-dump-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let first = dump_path(&dir, "site", 42);
        assert_eq!(first, dir.join("profiler_site_42.html"));
        std::fs::write(&first, "").unwrap();

        let second = dump_path(&dir, "site", 42);
        assert_eq!(second, dir.join("profiler_site_42_1.html"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from([
            "optrace-report",
            "report",
            "--trace",
            "t.json",
            "-o",
            "r.html",
        ])
        .unwrap();
        let Commands::Report {
            boundaries,
            primary_keyword,
            dump_dir,
            ..
        } = cli.cmd;
        assert_eq!(boundaries, vec!["where".to_string(), "order by".to_string()]);
        assert_eq!(primary_keyword, "select");
        assert_eq!(dump_dir, None);
    }
}
