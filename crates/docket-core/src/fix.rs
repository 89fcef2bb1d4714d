use crate::config::Config;
use crate::error::Result;
use crate::item::{Corpus, WorkItem};
use crate::paths;
use crate::schema::{FieldSchema, FieldType};
use crate::validate::{is_canonical_date, is_valid_email, Rule, DATE_FORMAT};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Alternate date shapes the fix engine recognizes, tried in order. The
/// order is part of the contract: year-first shapes win over day-first, and
/// US month-first is not attempted.
const ALT_DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y.%m.%d", "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y"];

// ---------------------------------------------------------------------------
// FixOutcome
// ---------------------------------------------------------------------------

/// Result of one attempted fix. `fixed: false` means the category matched but
/// no safe correction exists; the caller reports these separately.
#[derive(Debug, Clone, Serialize)]
pub struct FixOutcome {
    pub file: PathBuf,
    pub rule: Rule,
    pub fixed: bool,
    pub message: String,
}

impl FixOutcome {
    fn fixed(file: impl Into<PathBuf>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            rule,
            fixed: true,
            message: message.into(),
        }
    }

    fn unfixable(file: impl Into<PathBuf>, rule: Rule, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            rule,
            fixed: false,
            message: message.into(),
        }
    }

    /// Rule label with outcome prefix, e.g. `fixed:date` / `unfixable:enum`.
    pub fn label(&self) -> String {
        let prefix = if self.fixed { "fixed" } else { "unfixable" };
        format!("{prefix}:{}", self.rule)
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {}",
            self.file.display(),
            self.label(),
            self.message
        )
    }
}

// ---------------------------------------------------------------------------
// Duplicate ids
// ---------------------------------------------------------------------------

/// Reassign colliding ids. Per group, the oldest document (mtime, then path)
/// keeps the id; the rest are reassigned the highest id in use plus one.
/// Returns the indices of changed items.
pub fn fix_duplicate_ids(
    items: &mut [WorkItem],
    cfg: &Config,
    outcomes: &mut Vec<FixOutcome>,
) -> Vec<usize> {
    let width = cfg.id_digits;
    let mut used: BTreeSet<u64> = items
        .iter()
        .filter_map(|i| i.id().and_then(|id| paths::id_value(id, width)))
        .collect();

    // Group item indices by id, first-occurrence order.
    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (idx, item) in items.iter().enumerate() {
        let Some(id) = item.id() else { continue };
        match groups.iter_mut().find(|(gid, _)| gid.as_str() == id) {
            Some((_, indices)) => indices.push(idx),
            None => groups.push((id.to_string(), vec![idx])),
        }
    }

    let mut changed = Vec::new();
    for (old_id, mut indices) in groups {
        if indices.len() < 2 {
            continue;
        }
        indices.sort_by(|&a, &b| {
            (items[a].modified, &items[a].path).cmp(&(items[b].modified, &items[b].path))
        });
        for &idx in &indices[1..] {
            let next = used.last().copied().unwrap_or(0) + 1;
            if next >= 10u64.pow(width as u32) {
                outcomes.push(FixOutcome::unfixable(
                    &items[idx].path,
                    Rule::Duplicate,
                    format!("cannot reassign id '{old_id}': no free {width}-digit id"),
                ));
                continue;
            }
            used.insert(next);
            let new_id = paths::format_id(next, width);
            items[idx].frontmatter.set("id", &new_id);
            changed.push(idx);
            outcomes.push(FixOutcome::fixed(
                &items[idx].path,
                Rule::Duplicate,
                format!("reassigned duplicate id '{old_id}' to '{new_id}'"),
            ));
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

fn recognize_date(value: &str) -> Option<NaiveDate> {
    ALT_DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
}

/// Rewrite date fields in a recognizable alternate shape to canonical form.
pub fn fix_dates(item: &mut WorkItem, schema: &FieldSchema, outcomes: &mut Vec<FixOutcome>) -> bool {
    let mut changed = false;
    for def in schema.iter() {
        if def.rule.field_type != FieldType::Date {
            continue;
        }
        let Some(value) = item.frontmatter.get(&def.name).map(str::to_string) else {
            continue;
        };
        if is_canonical_date(&value) {
            continue;
        }
        match recognize_date(&value) {
            Some(date) => {
                let canonical = date.format(DATE_FORMAT).to_string();
                item.frontmatter.set(&def.name, &canonical);
                changed = true;
                outcomes.push(FixOutcome::fixed(
                    &item.path,
                    Rule::Date,
                    format!("rewrote '{}' from '{value}' to '{canonical}'", def.name),
                ));
            }
            None => outcomes.push(FixOutcome::unfixable(
                &item.path,
                Rule::Date,
                format!(
                    "'{}' value '{value}' matches no recognizable date shape",
                    def.name
                ),
            )),
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Field defaults, enum casing, emails
// ---------------------------------------------------------------------------

/// Populate missing required fields from schema defaults and normalize enum
/// values that differ only in case. Malformed emails have no safe correction
/// and are reported unfixable.
pub fn fix_fields(
    item: &mut WorkItem,
    schema: &FieldSchema,
    outcomes: &mut Vec<FixOutcome>,
) -> bool {
    let mut changed = false;
    for def in schema.iter() {
        let name = def.name.as_str();
        let rule = &def.rule;

        let Some(value) = item.frontmatter.get(name).map(str::to_string) else {
            if rule.required {
                match &rule.default {
                    Some(default) => {
                        item.frontmatter.set(name, default);
                        changed = true;
                        outcomes.push(FixOutcome::fixed(
                            &item.path,
                            Rule::MissingField,
                            format!("populated '{name}' with default '{default}'"),
                        ));
                    }
                    None => outcomes.push(FixOutcome::unfixable(
                        &item.path,
                        Rule::MissingDefault,
                        format!("'{name}' is required and has no default"),
                    )),
                }
            }
            continue;
        };

        match rule.field_type {
            FieldType::Enum => {
                if rule.allowed.iter().any(|a| a == &value) {
                    continue;
                }
                match rule.allowed.iter().find(|a| a.eq_ignore_ascii_case(&value)) {
                    Some(canonical) => {
                        let canonical = canonical.clone();
                        item.frontmatter.set(name, &canonical);
                        changed = true;
                        outcomes.push(FixOutcome::fixed(
                            &item.path,
                            Rule::Enum,
                            format!("normalized '{name}' from '{value}' to '{canonical}'"),
                        ));
                    }
                    None => outcomes.push(FixOutcome::unfixable(
                        &item.path,
                        Rule::Enum,
                        format!("'{name}' value '{value}' has no case-insensitive match"),
                    )),
                }
            }
            FieldType::Email => {
                if !is_valid_email(&value) {
                    outcomes.push(FixOutcome::unfixable(
                        &item.path,
                        Rule::Email,
                        format!("'{name}' value '{value}' has no safe correction"),
                    ));
                }
            }
            _ => {}
        }
    }
    changed
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run every fix category over a scanned corpus and persist changed
/// documents atomically. Categories are independent: a failure in one never
/// aborts the others, and the engine does not re-validate afterwards.
pub fn fix_corpus(corpus: &mut Corpus, cfg: &Config) -> Result<Vec<FixOutcome>> {
    let mut outcomes = Vec::new();
    let mut dirty: BTreeSet<usize> = BTreeSet::new();

    for idx in fix_duplicate_ids(&mut corpus.items, cfg, &mut outcomes) {
        dirty.insert(idx);
    }
    for (idx, item) in corpus.items.iter_mut().enumerate() {
        if fix_dates(item, &cfg.schema, &mut outcomes) {
            dirty.insert(idx);
        }
        if fix_fields(item, &cfg.schema, &mut outcomes) {
            dirty.insert(idx);
        }
    }

    for idx in dirty {
        corpus.items[idx].save()?;
    }
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
