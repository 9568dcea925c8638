// UI module
// Terminal output and the interactive decision prompt

pub mod diff_view;
pub mod prompt;
pub mod styles;

use std::collections::HashMap;
use std::io::{self, Write};

use crate::operations::{OverviewEntry, PairReport, Resolution, RunSummary};

pub use diff_view::{render_diff, render_review};
pub use prompt::TerminalPrompt;
pub use styles::Styles;

/// Print every differing pair before any decision is asked for
///
/// ```text
///   [1] foo.h
///         r1:foo.h    newer->    r2:foo.h
/// ```
pub fn render_overview(out: &mut impl Write, entries: &[OverviewEntry]) -> io::Result<()> {
    writeln!(out, "{}", Styles::header().apply("Differences found:"))?;

    let left_width = entries.iter().map(|e| e.left_name.len()).max().unwrap_or(0);
    let mut base_counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *base_counts.entry(entry.base.as_str()).or_default() += 1;
    }

    for entry in entries {
        writeln!(out)?;
        if base_counts[entry.base.as_str()] > 1 {
            writeln!(
                out,
                "  [{}] {} in {}",
                entry.index,
                entry.base,
                entry.left.display()
            )?;
        } else {
            writeln!(out, "  [{}] {}", entry.index, entry.base)?;
        }
        writeln!(
            out,
            "        {:>lw$} {:^13} {}",
            entry.left_name,
            entry.freshness.arrow(),
            entry.right_name,
            lw = left_width
        )?;
    }
    writeln!(out)
}

/// Print one line per reported pair, then the totals
pub fn render_summary(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    if summary.reports.is_empty() {
        return writeln!(out, "No differences found.");
    }

    writeln!(out)?;
    for report in &summary.reports {
        render_report(out, report)?;
    }
    writeln!(
        out,
        "{} resolved, {} skipped, {} errored ({} in sync)",
        Styles::resolved().apply(summary.resolved()),
        Styles::skipped().apply(summary.skipped()),
        Styles::errored().apply(summary.errored()),
        summary.in_sync
    )
}

fn render_report(out: &mut impl Write, report: &PairReport) -> io::Result<()> {
    let style = match report.resolution {
        Resolution::Copied { .. } | Resolution::DiffSaved(_) => Styles::resolved(),
        Resolution::Skipped => Styles::skipped(),
        Resolution::Failed(_) => Styles::errored(),
        Resolution::InSync => Styles::diff_context(),
    };
    writeln!(out, "{}", style.apply(report.to_string()))
}

/// Print the remind ledger, one path per line
pub fn render_remind(out: &mut impl Write, entries: &[std::path::PathBuf]) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "Nothing was overwritten by the last check.");
    }
    for path in entries {
        writeln!(out, "{}", path.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::Freshness;
    use std::path::PathBuf;

    #[test]
    fn test_empty_summary_reports_no_differences() {
        let mut out = Vec::new();
        render_summary(&mut out, &RunSummary::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No differences found.\n");
    }

    fn entry(index: usize, left: &str, left_name: &str, freshness: Freshness) -> OverviewEntry {
        let left = PathBuf::from(left);
        OverviewEntry {
            index,
            base: left.file_name().unwrap().to_string_lossy().into_owned(),
            left,
            left_name: left_name.to_string(),
            right_name: "r2:foo.h".to_string(),
            freshness,
        }
    }

    #[test]
    fn test_overview_lists_each_pair_with_arrow() {
        let entries = vec![
            entry(1, "/r1/foo.h", "r1:foo.h", Freshness::RightNewer),
            entry(2, "/r1/bar.h", "r1:bar.h", Freshness::Tie),
        ];
        let mut out = Vec::new();
        render_overview(&mut out, &entries).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Differences found:"));
        assert!(text.contains("  [1] foo.h\n"));
        assert!(text.contains("  [2] bar.h\n"));
        assert!(text.contains("newer->"));
        assert!(text.contains("!="));
    }

    #[test]
    fn test_overview_qualifies_repeated_basenames() {
        let entries = vec![
            entry(1, "/r1/a/foo.h", "a:foo.h", Freshness::LeftNewer),
            entry(2, "/r1/b/foo.h", "b:foo.h", Freshness::LeftNewer),
        ];
        let mut out = Vec::new();
        render_overview(&mut out, &entries).unwrap();

        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("[1] foo.h in /r1/a/foo.h"));
        assert!(text.contains("[2] foo.h in /r1/b/foo.h"));
    }

    #[test]
    fn test_remind_lists_paths_in_order() {
        let entries = vec![PathBuf::from("/b/foo.h"), PathBuf::from("/a/bar.h")];
        let mut out = Vec::new();
        render_remind(&mut out, &entries).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "/b/foo.h\n/a/bar.h\n");
    }
}
