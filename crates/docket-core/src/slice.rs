use crate::error::{DocketError, Result};
use crate::frontmatter::Frontmatter;
use crate::section;
use crate::validate::{Finding, Rule};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

pub const SECTION_NAME: &str = "Slices";

/// Sections that must stay last in a document; a newly created Slices section
/// is inserted before the first of these.
const TRAILING_SECTIONS: &[&str] = &["Release Notes"];

const TASK_ID_DIGITS: usize = 3;

// ---------------------------------------------------------------------------
// Task / Slice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slice {
    pub name: String,
    pub tasks: Vec<Task>,
}

impl Slice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }
}

static TASK_RE: OnceLock<Regex> = OnceLock::new();

fn task_re() -> &'static Regex {
    TASK_RE.get_or_init(|| Regex::new(r"^- \[([ xX])\] (T\d{3}):[ \t]*(.*)$").unwrap())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the Slices section of a body. A missing section yields an empty
/// list, not an error. Lines that don't match the checkbox-task grammar are
/// skipped; tasks above the first subheading have no owning slice and are
/// skipped too.
pub fn parse_slices(body: &str) -> Vec<Slice> {
    let Some(sec) = section::find(body, SECTION_NAME) else {
        return Vec::new();
    };

    let mut slices: Vec<Slice> = Vec::new();
    for line in sec.content(body).lines() {
        let hashes = line.bytes().take_while(|&b| b == b'#').count();
        if hashes == sec.level + 1 {
            if let Some(name) = line[hashes..].strip_prefix(' ') {
                slices.push(Slice::new(name.trim()));
                continue;
            }
        }
        if let (Some(slice), Some(caps)) = (slices.last_mut(), task_re().captures(line)) {
            slice.tasks.push(Task {
                id: caps[2].to_string(),
                description: caps[3].to_string(),
                done: &caps[1] != " ",
            });
        }
    }
    slices
}

// ---------------------------------------------------------------------------
// Serialization and byte-preserving writes
// ---------------------------------------------------------------------------

fn serialize(slices: &[Slice], level: usize) -> String {
    let mut out = String::new();
    out.push_str(&"#".repeat(level));
    out.push(' ');
    out.push_str(SECTION_NAME);
    out.push('\n');
    for slice in slices {
        out.push('\n');
        out.push_str(&"#".repeat(level + 1));
        out.push(' ');
        out.push_str(&slice.name);
        out.push('\n');
        if !slice.tasks.is_empty() {
            out.push('\n');
            for task in &slice.tasks {
                let mark = if task.done { 'x' } else { ' ' };
                out.push_str(&format!("- [{mark}] {}: {}\n", task.id, task.description));
            }
        }
    }
    out
}

/// Replace the Slices section of `document` with a serialization of
/// `slices`, leaving every byte outside the section untouched. When no
/// section exists and the list is non-empty, a new section is inserted before
/// the first trailing section (Release Notes), or appended at document end.
pub fn write_slices(document: &str, slices: &[Slice]) -> String {
    // Headings inside the frontmatter block must not be spliced over.
    let body_offset = match Frontmatter::split(Path::new(""), document) {
        Ok((_, body)) => document.len() - body.len(),
        Err(_) => 0,
    };
    let (head, body) = document.split_at(body_offset);

    if let Some(sec) = section::find(body, SECTION_NAME) {
        let mut out = String::with_capacity(document.len());
        out.push_str(head);
        out.push_str(&body[..sec.start]);
        out.push_str(&serialize(slices, sec.level));
        if sec.end < body.len() {
            out.push('\n');
        }
        out.push_str(&body[sec.end..]);
        return out;
    }

    if slices.is_empty() {
        return document.to_string();
    }

    for &name in TRAILING_SECTIONS {
        if let Some(trailing) = section::find(body, name) {
            let mut out = String::with_capacity(document.len());
            out.push_str(head);
            out.push_str(&body[..trailing.start]);
            if !out.ends_with("\n\n") {
                out.push('\n');
            }
            out.push_str(&serialize(slices, trailing.level));
            out.push('\n');
            out.push_str(&body[trailing.start..]);
            return out;
        }
    }

    let mut out = document.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&serialize(slices, 2));
    out
}

// ---------------------------------------------------------------------------
// Slice list operations (operate on a mutable Vec<Slice>)
// ---------------------------------------------------------------------------

fn find_slice_mut<'a>(slices: &'a mut [Slice], name: &str) -> Result<&'a mut Slice> {
    slices
        .iter_mut()
        .find(|s| s.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| DocketError::SliceNotFound(name.to_string()))
}

fn find_task_mut<'a>(slices: &'a mut [Slice], id: &str) -> Result<&'a mut Task> {
    slices
        .iter_mut()
        .flat_map(|s| s.tasks.iter_mut())
        .find(|t| t.id == id)
        .ok_or_else(|| DocketError::TaskNotFound(id.to_string()))
}

/// Slice names are unique per document, case-insensitively.
pub fn add_slice(slices: &mut Vec<Slice>, name: impl Into<String>) -> Result<()> {
    let name = name.into();
    if slices.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
        return Err(DocketError::DuplicateSlice(name));
    }
    slices.push(Slice::new(name));
    Ok(())
}

/// Next free task id across all slices of one document.
pub fn next_task_id(slices: &[Slice]) -> Result<String> {
    let max = slices
        .iter()
        .flat_map(|s| &s.tasks)
        .filter_map(|t| t.id.strip_prefix('T').and_then(|n| n.parse::<u64>().ok()))
        .max()
        .unwrap_or(0);
    let next = max + 1;
    if next >= 10u64.pow(TASK_ID_DIGITS as u32) {
        return Err(DocketError::IdSpaceExhausted {
            width: TASK_ID_DIGITS,
        });
    }
    Ok(format!("T{next:0width$}", width = TASK_ID_DIGITS))
}

/// Add a task to a named slice; the id is allocated document-wide.
pub fn add_task(
    slices: &mut Vec<Slice>,
    slice_name: &str,
    description: impl Into<String>,
) -> Result<String> {
    let id = next_task_id(slices)?;
    let slice = find_slice_mut(slices, slice_name)?;
    slice.tasks.push(Task {
        id: id.clone(),
        description: description.into(),
        done: false,
    });
    Ok(id)
}

pub fn set_done(slices: &mut [Slice], task_id: &str, done: bool) -> Result<()> {
    find_task_mut(slices, task_id)?.done = done;
    Ok(())
}

pub fn edit_description(
    slices: &mut [Slice],
    task_id: &str,
    description: impl Into<String>,
) -> Result<()> {
    find_task_mut(slices, task_id)?.description = description.into();
    Ok(())
}

pub fn remove_task(slices: &mut [Slice], task_id: &str) -> Result<()> {
    for slice in slices.iter_mut() {
        let before = slice.tasks.len();
        slice.tasks.retain(|t| t.id != task_id);
        if slice.tasks.len() != before {
            return Ok(());
        }
    }
    Err(DocketError::TaskNotFound(task_id.to_string()))
}

pub fn remove_slice(slices: &mut Vec<Slice>, name: &str) -> Result<()> {
    let before = slices.len();
    slices.retain(|s| !s.name.eq_ignore_ascii_case(name));
    if slices.len() == before {
        return Err(DocketError::SliceNotFound(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task-level diffs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskChanges {
    pub completed: Vec<String>,
    pub reopened: Vec<String>,
    pub added: Vec<String>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.reopened.is_empty() && self.added.is_empty()
    }

    /// Commit-message fragment: one clause per non-empty set, `None` when
    /// nothing changed.
    pub fn summary(&self) -> Option<String> {
        let mut clauses = Vec::new();
        if !self.completed.is_empty() {
            clauses.push(format!("completes {}", self.completed.join(", ")));
        }
        if !self.reopened.is_empty() {
            clauses.push(format!("reopens {}", self.reopened.join(", ")));
        }
        if !self.added.is_empty() {
            clauses.push(format!("adds {}", self.added.join(", ")));
        }
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join("; "))
        }
    }
}

fn done_by_id(slices: &[Slice]) -> HashMap<&str, bool> {
    slices
        .iter()
        .flat_map(|s| &s.tasks)
        .map(|t| (t.id.as_str(), t.done))
        .collect()
}

/// Diff two slice snapshots at the task level. Removed tasks are not
/// reported; removal is a separate explicit action. Insensitive to task
/// ordering within and across slices.
pub fn detect_task_changes(previous: &[Slice], current: &[Slice]) -> TaskChanges {
    let prev = done_by_id(previous);
    let cur = done_by_id(current);

    let mut changes = TaskChanges::default();
    for (id, &done) in &cur {
        match prev.get(id).copied() {
            None => changes.added.push(id.to_string()),
            Some(false) if done => changes.completed.push(id.to_string()),
            Some(true) if !done => changes.reopened.push(id.to_string()),
            Some(_) => {}
        }
    }
    changes.completed.sort();
    changes.reopened.sort();
    changes.added.sort();
    changes
}

// ---------------------------------------------------------------------------
// Lint
// ---------------------------------------------------------------------------

/// Slice lint rules, independent of the field-schema validator.
pub fn lint(file: &Path, body: &str, require_section: bool) -> Vec<Finding> {
    let mut findings = Vec::new();

    if section::find(body, SECTION_NAME).is_none() {
        if require_section {
            findings.push(Finding::new(
                file,
                Rule::MissingSection,
                format!("no '{SECTION_NAME}' section"),
            ));
        }
        return findings;
    }

    let slices = parse_slices(body);

    let mut seen_ids: Vec<&str> = Vec::new();
    let mut dup_ids: Vec<&str> = Vec::new();
    for task in slices.iter().flat_map(|s| &s.tasks) {
        if seen_ids.contains(&task.id.as_str()) {
            if !dup_ids.contains(&task.id.as_str()) {
                dup_ids.push(&task.id);
            }
        } else {
            seen_ids.push(&task.id);
        }
    }
    for id in dup_ids {
        findings.push(Finding::new(
            file,
            Rule::DuplicateTaskId,
            format!("task id '{id}' appears more than once"),
        ));
    }

    let mut seen_names: Vec<String> = Vec::new();
    let mut dup_names: Vec<&str> = Vec::new();
    for slice in &slices {
        let lower = slice.name.to_ascii_lowercase();
        if seen_names.contains(&lower) {
            if !dup_names.iter().any(|n| n.eq_ignore_ascii_case(&slice.name)) {
                dup_names.push(&slice.name);
            }
        } else {
            seen_names.push(lower);
        }
    }
    for name in dup_names {
        findings.push(Finding::new(
            file,
            Rule::DuplicateSliceName,
            format!("slice name '{name}' appears more than once"),
        ));
    }

    findings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\nid: 001\nstatus: doing\n---\n\n# Fix login\n\n## Requirements\n\n- redirect works\n\n## Slices\n\n### S1\n\n- [x] T001: wire redirect\n- [ ] T002: add tests\n\n### S2\n\n- [ ] T003: update docs\n\n## Release Notes\n\n- none\n";

    fn body(doc: &str) -> &str {
        let at = doc.find("\n---\n").unwrap() + 5;
        &doc[at..]
    }

    #[test]
    fn parse_two_slices() {
        let slices = parse_slices(body(DOC));
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].name, "S1");
        assert_eq!(slices[0].tasks.len(), 2);
        assert!(slices[0].tasks[0].done);
        assert_eq!(slices[0].tasks[1].id, "T002");
        assert_eq!(slices[1].tasks[0].description, "update docs");
    }

    #[test]
    fn missing_section_yields_empty_list() {
        assert!(parse_slices("# Title\n\n## Requirements\n").is_empty());
    }

    #[test]
    fn malformed_task_lines_are_skipped() {
        let body = "## Slices\n\n### S1\n\n- [x] T001: good\n- [x] 002: no T prefix\n- T003: no checkbox\nplain text\n- [y] T004: bad mark\n";
        let slices = parse_slices(body);
        assert_eq!(slices[0].tasks.len(), 1);
        assert_eq!(slices[0].tasks[0].id, "T001");
    }

    #[test]
    fn tasks_before_first_subheading_are_skipped() {
        let body = "## Slices\n\n- [ ] T001: stray\n\n### S1\n\n- [ ] T002: owned\n";
        let slices = parse_slices(body);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].tasks.len(), 1);
        assert_eq!(slices[0].tasks[0].id, "T002");
    }

    #[test]
    fn write_identical_list_is_byte_identical() {
        let slices = parse_slices(body(DOC));
        assert_eq!(write_slices(DOC, &slices), DOC);
    }

    #[test]
    fn write_identical_list_at_end_of_file() {
        let doc = "---\nid: 001\n---\n\n# T\n\n## Slices\n\n### S1\n\n- [ ] T001: a\n";
        let slices = parse_slices(body(doc));
        assert_eq!(write_slices(doc, &slices), doc);
    }

    #[test]
    fn write_preserves_bytes_outside_the_section() {
        let mut slices = parse_slices(body(DOC));
        set_done(&mut slices, "T002", true).unwrap();
        let out = write_slices(DOC, &slices);
        assert!(out.contains("- [x] T002: add tests"));
        // Everything else is untouched.
        assert!(out.starts_with("---\nid: 001\nstatus: doing\n---\n\n# Fix login\n\n## Requirements\n\n- redirect works\n"));
        assert!(out.ends_with("## Release Notes\n\n- none\n"));
    }

    #[test]
    fn write_inserts_before_release_notes() {
        let doc = "---\nid: 001\n---\n\n# T\n\n## Requirements\n\n- r\n\n## Release Notes\n\n- none\n";
        let slices = vec![Slice {
            name: "S1".to_string(),
            tasks: vec![Task {
                id: "T001".to_string(),
                description: "a".to_string(),
                done: false,
            }],
        }];
        let out = write_slices(doc, &slices);
        let slices_at = out.find("## Slices").unwrap();
        let notes_at = out.find("## Release Notes").unwrap();
        assert!(slices_at < notes_at);
        assert!(out.contains("## Slices\n\n### S1\n\n- [ ] T001: a\n\n## Release Notes"));
        // The new section parses back.
        assert_eq!(parse_slices(body(&out)).len(), 1);
    }

    #[test]
    fn write_appends_at_end_without_trailing_sections() {
        let doc = "---\nid: 001\n---\n\n# T\n\n## Requirements\n\n- r\n";
        let slices = vec![Slice::new("S1")];
        let out = write_slices(doc, &slices);
        assert_eq!(
            out,
            "---\nid: 001\n---\n\n# T\n\n## Requirements\n\n- r\n\n## Slices\n\n### S1\n"
        );
    }

    #[test]
    fn write_empty_list_without_section_is_a_no_op() {
        let doc = "---\nid: 001\n---\n\n# T\n";
        assert_eq!(write_slices(doc, &[]), doc);
    }

    #[test]
    fn heading_inside_frontmatter_is_not_spliced() {
        // A frontmatter value that looks like a heading must not be treated
        // as the Slices section.
        let doc = "---\ntitle: ## Slices\n---\n\n# T\n\n## Slices\n\n### S1\n";
        let out = write_slices(doc, &[Slice::new("S1")]);
        assert!(out.starts_with("---\ntitle: ## Slices\n---\n"));
    }

    // -----------------------------------------------------------------------
    // Slice list operations
    // -----------------------------------------------------------------------

    #[test]
    fn add_slice_rejects_case_insensitive_duplicate() {
        let mut slices = Vec::new();
        add_slice(&mut slices, "API").unwrap();
        assert!(matches!(
            add_slice(&mut slices, "api"),
            Err(DocketError::DuplicateSlice(_))
        ));
    }

    #[test]
    fn task_ids_allocate_document_wide() {
        let mut slices = Vec::new();
        add_slice(&mut slices, "S1").unwrap();
        add_slice(&mut slices, "S2").unwrap();
        assert_eq!(add_task(&mut slices, "S1", "a").unwrap(), "T001");
        assert_eq!(add_task(&mut slices, "S2", "b").unwrap(), "T002");
        assert_eq!(add_task(&mut slices, "S1", "c").unwrap(), "T003");
    }

    #[test]
    fn add_task_to_missing_slice() {
        let mut slices = Vec::new();
        assert!(matches!(
            add_task(&mut slices, "S1", "a"),
            Err(DocketError::SliceNotFound(_))
        ));
    }

    #[test]
    fn set_done_and_reopen() {
        let mut slices = Vec::new();
        add_slice(&mut slices, "S1").unwrap();
        let id = add_task(&mut slices, "S1", "a").unwrap();
        set_done(&mut slices, &id, true).unwrap();
        assert!(slices[0].tasks[0].done);
        set_done(&mut slices, &id, false).unwrap();
        assert!(!slices[0].tasks[0].done);
        assert!(matches!(
            set_done(&mut slices, "T099", true),
            Err(DocketError::TaskNotFound(_))
        ));
    }

    #[test]
    fn remove_task_and_slice() {
        let mut slices = Vec::new();
        add_slice(&mut slices, "S1").unwrap();
        let id = add_task(&mut slices, "S1", "a").unwrap();
        remove_task(&mut slices, &id).unwrap();
        assert!(slices[0].tasks.is_empty());
        remove_slice(&mut slices, "s1").unwrap();
        assert!(slices.is_empty());
        assert!(remove_slice(&mut slices, "S1").is_err());
    }

    // -----------------------------------------------------------------------
    // Task diffs
    // -----------------------------------------------------------------------

    fn snapshot(tasks: &[(&str, bool)]) -> Vec<Slice> {
        vec![Slice {
            name: "S1".to_string(),
            tasks: tasks
                .iter()
                .map(|(id, done)| Task {
                    id: id.to_string(),
                    description: String::new(),
                    done: *done,
                })
                .collect(),
        }]
    }

    #[test]
    fn detect_changes() {
        let prev = snapshot(&[("T001", false), ("T002", true), ("T003", false)]);
        let cur = snapshot(&[("T001", true), ("T002", false), ("T004", false)]);
        let changes = detect_task_changes(&prev, &cur);
        assert_eq!(changes.completed, ["T001"]);
        assert_eq!(changes.reopened, ["T002"]);
        assert_eq!(changes.added, ["T004"]);
    }

    #[test]
    fn removed_tasks_are_not_reported() {
        let prev = snapshot(&[("T001", false), ("T002", false)]);
        let cur = snapshot(&[("T001", false)]);
        assert!(detect_task_changes(&prev, &cur).is_empty());
    }

    #[test]
    fn detect_changes_ignores_task_order() {
        let prev = snapshot(&[("T001", false), ("T002", true)]);
        let prev_reordered = snapshot(&[("T002", true), ("T001", false)]);
        let cur = snapshot(&[("T002", false), ("T001", true), ("T003", false)]);
        assert_eq!(
            detect_task_changes(&prev, &cur),
            detect_task_changes(&prev_reordered, &cur)
        );
    }

    #[test]
    fn summary_clauses() {
        let prev = snapshot(&[("T001", false)]);
        let cur = snapshot(&[("T001", true), ("T002", false)]);
        let summary = detect_task_changes(&prev, &cur).summary().unwrap();
        assert_eq!(summary, "completes T001; adds T002");
        assert!(detect_task_changes(&prev, &prev).summary().is_none());
    }

    // -----------------------------------------------------------------------
    // Lint
    // -----------------------------------------------------------------------

    #[test]
    fn lint_missing_section_only_when_required() {
        let body = "# T\n\n## Requirements\n";
        assert!(lint(Path::new("x.md"), body, false).is_empty());
        let findings = lint(Path::new("x.md"), body, true);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::MissingSection);
    }

    #[test]
    fn lint_duplicate_task_id_across_slices() {
        let body = "## Slices\n\n### S1\n\n- [ ] T001: a\n\n### S2\n\n- [x] T001: b\n";
        let findings = lint(Path::new("x.md"), body, false);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::DuplicateTaskId);
        assert!(findings[0].message.contains("T001"));
    }

    #[test]
    fn lint_duplicate_slice_name_case_insensitive() {
        let body = "## Slices\n\n### API\n\n- [ ] T001: a\n\n### api\n\n- [ ] T002: b\n";
        let findings = lint(Path::new("x.md"), body, false);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, Rule::DuplicateSliceName);
    }

    #[test]
    fn lint_clean_document() {
        assert!(lint(Path::new("x.md"), body(DOC), false).is_empty());
    }
}
