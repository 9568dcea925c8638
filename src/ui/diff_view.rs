// Diff View Component
// Prints a pair review: paths, freshness, and the colored unified diff

use crossterm::style::ContentStyle;
use std::io::{self, Write};

use super::Styles;
use crate::operations::{PairReview, Side};

/// Horizontal rule between sections
pub const HORIZ_BREAK: &str = "------------------------------------";

/// Print everything the operator needs before choosing an action
pub fn render_review(out: &mut impl Write, review: &PairReview<'_>) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", Styles::header().apply("Diff between:"))?;
    match review.older_newer() {
        Some((older, newer)) => {
            writeln!(out, "older: {}", older.display())?;
            writeln!(out, "newer: {}", newer.display())?;
        }
        None => {
            writeln!(out, "left:  {}", review.pair.left.display())?;
            writeln!(out, "right: {}", review.pair.right.display())?;
            writeln!(out, "(equal modification times)")?;
        }
    }
    writeln!(
        out,
        "{} {} {}",
        review.name(Side::Left),
        review.freshness,
        review.name(Side::Right)
    )?;
    if let Some(note) = review.note() {
        writeln!(out, "{}", Styles::note().apply(format!("note: {}", note)))?;
    }
    writeln!(out)?;

    render_diff(out, &review.diff)?;
    writeln!(out, "{}", HORIZ_BREAK)
}

/// Print a unified diff, coloring each line by its prefix
pub fn render_diff(out: &mut impl Write, diff: &str) -> io::Result<()> {
    for line in diff.lines() {
        writeln!(out, "{}", style_diff_line(line).apply(line))?;
    }
    Ok(())
}

/// Style a single diff line based on its prefix
fn style_diff_line(line: &str) -> ContentStyle {
    if line.starts_with("+++") || line.starts_with("---") {
        Styles::diff_file_header()
    } else if line.starts_with('+') {
        Styles::diff_added()
    } else if line.starts_with('-') {
        Styles::diff_removed()
    } else if line.starts_with('@') {
        Styles::diff_hunk_header()
    } else {
        Styles::diff_context()
    }
}
