// Path Utilities
// Helper functions for path manipulation and compact display names

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving . and .. components lexically
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            Component::CurDir => {}
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Make a path absolute against a base directory without touching the filesystem
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Strip the components two paths share at the front and at the back
///
/// Given `/x/A/y/f.h` and `/x/B/y/f.h` this returns (`A`, `B`). Also reports
/// how many trailing components were shared so callers know whether the
/// basename was stripped.
pub fn unique_subpaths(a: &Path, b: &Path) -> (PathBuf, PathBuf, usize) {
    let left: Vec<Component> = a.components().collect();
    let right: Vec<Component> = b.components().collect();
    let shortest = left.len().min(right.len());

    let mut prefix = 0;
    while prefix < shortest && left[prefix] == right[prefix] {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < shortest - prefix
        && left[left.len() - 1 - suffix] == right[right.len() - 1 - suffix]
    {
        suffix += 1;
    }

    let uniq_left = left[prefix..left.len() - suffix].iter().collect();
    let uniq_right = right[prefix..right.len() - suffix].iter().collect();
    (uniq_left, uniq_right, suffix)
}

/// Minimally identifying display names for two paths, e.g. `A:f.h` and `B:f.h`
pub fn short_names(a: &Path, b: &Path) -> (String, String) {
    let (uniq_a, uniq_b, shared_tail) = unique_subpaths(a, b);

    let display = |uniq: &Path| {
        if uniq.as_os_str().is_empty() {
            ".".to_string()
        } else {
            uniq.display().to_string()
        }
    };

    match a.file_name() {
        Some(base) if shared_tail > 0 => {
            let base = base.to_string_lossy();
            (
                format!("{}:{}", display(&uniq_a), base),
                format!("{}:{}", display(&uniq_b), base),
            )
        }
        _ => (display(&uniq_a), display(&uniq_b)),
    }
}

/// A sibling of `path` whose file name has `suffix` appended
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
