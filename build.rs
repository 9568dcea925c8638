// Build script - reads config.yaml at compile time and generates defaults
// Change defaults by editing src/config.yaml, no source edits needed

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src/config.yaml");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("compiled_config.rs");

    let config = if Path::new("src/config.yaml").exists() {
        let content = fs::read_to_string("src/config.yaml")
            .expect("Failed to read src/config.yaml");
        parse_config(&content)
    } else {
        CompiledConfig::default()
    };

    let generated = format!(
        r#"// Auto-generated from config.yaml at compile time
// Do not edit - modify config.yaml and rebuild instead

pub const CONTEXT_LINES: usize = {context_lines};
pub const SAVE_SUFFIX: &str = {save_suffix:?};
pub const STORE_FILE_NAME: &str = {store_file_name:?};

pub const GLOBAL_EXCLUDES: &[&str] = &[
{excludes}
];
"#,
        context_lines = config.context_lines,
        save_suffix = config.save_suffix,
        store_file_name = config.store_file_name,
        excludes = config
            .global_excludes
            .iter()
            .map(|e| format!("    {:?},", e))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    fs::write(&dest_path, generated).expect("Failed to write compiled config");
}

struct CompiledConfig {
    context_lines: usize,
    save_suffix: String,
    store_file_name: String,
    global_excludes: Vec<String>,
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            context_lines: 3,
            save_suffix: ".syncer.diff".to_string(),
            store_file_name: ".syncer".to_string(),
            global_excludes: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "*.swp".to_string(),
                "*~".to_string(),
            ],
        }
    }
}

#[derive(PartialEq)]
enum Section {
    None,
    Diff,
    Store,
    Excludes,
}

fn parse_config(content: &str) -> CompiledConfig {
    let mut config = CompiledConfig::default();

    // Simple YAML parsing (avoiding external dependencies in build script)
    let mut section = Section::None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Top-level keys switch sections
        if !line.starts_with(' ') && !line.starts_with('\t') {
            section = match trimmed {
                "diff:" => Section::Diff,
                "store:" => Section::Store,
                "global_excludes:" => {
                    config.global_excludes.clear();
                    Section::Excludes
                }
                _ => Section::None,
            };
            continue;
        }

        if section == Section::Excludes {
            if let Some(item) = trimmed.strip_prefix("- ") {
                config.global_excludes.push(unquote(item).to_string());
            }
            continue;
        }

        if let Some((key, value)) = parse_kv(trimmed) {
            match (&section, key) {
                (Section::Diff, "context_lines") => {
                    config.context_lines = value.parse().unwrap_or(3)
                }
                (Section::Diff, "save_suffix") => config.save_suffix = unquote(value).to_string(),
                (Section::Store, "file_name") => {
                    config.store_file_name = unquote(value).to_string()
                }
                _ => {}
            }
        }
    }

    config
}

fn parse_kv(line: &str) -> Option<(&str, &str)> {
    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim();
    let mut value = line[colon_pos + 1..].trim();

    // Strip inline comments
    if let Some(comment_pos) = value.find(" #") {
        value = value[..comment_pos].trim();
    }

    if value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}
