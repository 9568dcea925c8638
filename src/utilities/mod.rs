// Utilities module
// Path helpers and walk exclusion patterns

pub mod paths;
pub mod patterns;

pub use paths::{absolutize, normalize_path, short_names, unique_subpaths};
pub use patterns::{matches_pattern, PatternMatcher};
