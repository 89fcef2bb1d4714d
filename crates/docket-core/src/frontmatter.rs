use crate::error::{DocketError, Result};
use std::path::Path;

pub const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// One decoded `key: value` line. The original source line is kept verbatim so
/// that re-encoding an untouched entry reproduces its exact bytes, leading
/// zeros and original spacing included.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: String,
    value: String,
    raw: String,
}

impl Entry {
    fn render(key: &str, value: &str) -> Entry {
        Entry {
            key: key.to_string(),
            value: value.to_string(),
            raw: format!("{key}: {value}"),
        }
    }
}

/// Ordered frontmatter mapping. Keys keep their source order; `set` rewrites
/// a single entry in place and never perturbs the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    entries: Vec<Entry>,
}

impl Frontmatter {
    /// Split a document into its frontmatter block and body. The body slice
    /// starts immediately after the closing delimiter line, so
    /// `fm.encode() + body` reconstructs the input byte-for-byte.
    pub fn split<'a>(file: &Path, text: &'a str) -> Result<(Frontmatter, &'a str)> {
        let parse_err = |message: String| DocketError::Parse {
            file: file.to_path_buf(),
            message,
        };

        let mut rest = text
            .strip_prefix(&format!("{DELIMITER}\n"))
            .ok_or_else(|| parse_err("missing frontmatter delimiter".to_string()))?;

        let mut entries = Vec::new();
        loop {
            // Closing delimiter as the very last line, no trailing newline.
            if rest == DELIMITER {
                return Ok((Frontmatter { entries }, ""));
            }
            let Some(newline) = rest.find('\n') else {
                return Err(parse_err("unterminated frontmatter block".to_string()));
            };
            let line = &rest[..newline];
            rest = &rest[newline + 1..];

            if line == DELIMITER {
                return Ok((Frontmatter { entries }, rest));
            }

            let Some(colon) = line.find(':') else {
                return Err(parse_err(format!("invalid frontmatter line: '{line}'")));
            };
            let key = line[..colon].trim();
            if key.is_empty() {
                return Err(parse_err(format!("invalid frontmatter line: '{line}'")));
            }
            entries.push(Entry {
                key: key.to_string(),
                value: line[colon + 1..].trim().to_string(),
                raw: line.to_string(),
            });
        }
    }

    /// Re-encode the block. Untouched entries emit their original lines.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push_str(DELIMITER);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.raw);
            out.push('\n');
        }
        out.push_str(DELIMITER);
        out.push('\n');
        out
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    /// Set a key's value. An existing entry keeps its position and is
    /// re-rendered canonically; a new key is appended at the end of the block.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(entry) => *entry = Entry::render(key, value),
            None => self.entries.push(Entry::render(key, value)),
        }
    }

    /// Remove a key. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        self.entries.len() != before
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
