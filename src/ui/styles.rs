// UI Styles
// Color scheme for terminal output

use crossterm::style::{ContentStyle, Stylize};

/// Application color scheme and styles
pub struct Styles;

impl Styles {
    // === Headings ===

    pub fn header() -> ContentStyle {
        ContentStyle::new().cyan().bold()
    }

    pub fn actions() -> ContentStyle {
        ContentStyle::new().yellow()
    }

    pub fn note() -> ContentStyle {
        ContentStyle::new().magenta()
    }

    // === Diff Colors ===

    pub fn diff_added() -> ContentStyle {
        ContentStyle::new().green()
    }

    pub fn diff_removed() -> ContentStyle {
        ContentStyle::new().red()
    }

    pub fn diff_hunk_header() -> ContentStyle {
        ContentStyle::new().cyan()
    }

    pub fn diff_file_header() -> ContentStyle {
        ContentStyle::new().bold()
    }

    pub fn diff_context() -> ContentStyle {
        ContentStyle::new()
    }

    // === Run Summary ===

    pub fn resolved() -> ContentStyle {
        ContentStyle::new().green().bold()
    }

    pub fn skipped() -> ContentStyle {
        ContentStyle::new().yellow().bold()
    }

    pub fn errored() -> ContentStyle {
        ContentStyle::new().red().bold()
    }
}
