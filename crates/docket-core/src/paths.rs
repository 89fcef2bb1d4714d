use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DOCKET_DIR: &str = ".docket";
pub const CONFIG_FILE: &str = ".docket/config.yaml";
pub const TEMPLATES_DIR: &str = ".docket/templates";
pub const ARCHIVE_DIR: &str = ".docket/archive";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn docket_dir(root: &Path) -> PathBuf {
    root.join(DOCKET_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn templates_dir(root: &Path) -> PathBuf {
    root.join(TEMPLATES_DIR)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

pub fn items_dir(root: &Path, items: &str) -> PathBuf {
    root.join(items)
}

pub fn status_dir(root: &Path, items: &str, folder: &str) -> PathBuf {
    root.join(items).join(folder)
}

// ---------------------------------------------------------------------------
// Work-item ids and filenames
// ---------------------------------------------------------------------------

/// Render a numeric id at the configured width, e.g. `7` → `"007"`.
pub fn format_id(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

/// Parse an id back to its numeric value. Returns `None` for anything that is
/// not the exact fixed-width digit string (`"007"` parses, `"7"` does not).
pub fn id_value(id: &str, width: usize) -> Option<u64> {
    if id.len() != width || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// Lowercase-alphanumeric-and-hyphen slug for filenames. Runs of other
/// characters collapse to a single hyphen; leading/trailing hyphens are
/// stripped.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Filename for a new item: `007-fix-login.md`.
pub fn item_file_name(id: &str, title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("{id}.md")
    } else {
        format!("{id}-{slug}.md")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
