use crate::error::{DocketError, Result};
use crate::paths;
use std::path::Path;

// ---------------------------------------------------------------------------
// Built-in templates
// ---------------------------------------------------------------------------

const TASK_TEMPLATE: &str = "---\nid: {{id}}\nstatus: {{status}}\nkind: task\ncreated: {{created}}\npriority: medium\n---\n\n# {{title}}\n\n## Requirements\n\n_TBD_\n\n## Acceptance Criteria\n\n- [ ] _TBD_\n\n## Slices\n\n## Release Notes\n";

const BUG_TEMPLATE: &str = "---\nid: {{id}}\nstatus: {{status}}\nkind: bug\ncreated: {{created}}\npriority: high\n---\n\n# {{title}}\n\n## Reproduction\n\n_TBD_\n\n## Expected\n\n_TBD_\n\n## Actual\n\n_TBD_\n\n## Slices\n\n## Release Notes\n";

const FEATURE_TEMPLATE: &str = "---\nid: {{id}}\nstatus: {{status}}\nkind: feature\ncreated: {{created}}\npriority: medium\n---\n\n# {{title}}\n\n## Requirements\n\n_TBD_\n\n## Acceptance Criteria\n\n- [ ] _TBD_\n\n## Slices\n\n## Release Notes\n";

fn builtin(kind: &str) -> Option<&'static str> {
    match kind {
        "task" => Some(TASK_TEMPLATE),
        "bug" => Some(BUG_TEMPLATE),
        "feature" => Some(FEATURE_TEMPLATE),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewItem<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub status: &'a str,
    pub created: &'a str,
}

/// Render a new work-item document for `kind`. A file at
/// `.docket/templates/<kind>.md` overrides the built-in template; a kind with
/// neither is an error.
pub fn render(root: &Path, kind: &str, item: &NewItem<'_>) -> Result<String> {
    let override_path = paths::templates_dir(root).join(format!("{kind}.md"));
    let template = if override_path.exists() {
        std::fs::read_to_string(&override_path)?
    } else {
        builtin(kind)
            .ok_or_else(|| DocketError::UnknownKind(kind.to_string()))?
            .to_string()
    };

    Ok(template
        .replace("{{id}}", item.id)
        .replace("{{title}}", item.title)
        .replace("{{status}}", item.status)
        .replace("{{created}}", item.created))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::frontmatter::Frontmatter;
    use crate::validate;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn ctx<'a>() -> NewItem<'a> {
        NewItem {
            id: "007",
            title: "Fix login",
            status: "backlog",
            created: "2024-03-01",
        }
    }

    #[test]
    fn renders_builtin_task() {
        let dir = TempDir::new().unwrap();
        let doc = render(dir.path(), "task", &ctx()).unwrap();
        assert!(doc.starts_with("---\nid: 007\nstatus: backlog\nkind: task\n"));
        assert!(doc.contains("# Fix login"));
        assert!(doc.contains("## Slices"));
        assert!(doc.ends_with("## Release Notes\n"));
    }

    #[test]
    fn rendered_document_passes_validation() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::new("t");
        for kind in ["task", "bug", "feature"] {
            let text = render(dir.path(), kind, &ctx()).unwrap();
            let path = dir.path().join("x.md");
            let (frontmatter, body) = Frontmatter::split(&path, &text).unwrap();
            let item = crate::item::WorkItem {
                path: path.clone(),
                frontmatter,
                body: body.to_string(),
                modified: SystemTime::UNIX_EPOCH,
            };
            let findings = validate::validate_item(&item, &cfg.schema, true);
            assert!(findings.is_empty(), "{kind}: {findings:?}");
        }
    }

    #[test]
    fn unknown_kind_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            render(dir.path(), "epic", &ctx()),
            Err(DocketError::UnknownKind(_))
        ));
    }

    #[test]
    fn template_file_overrides_builtin() {
        let dir = TempDir::new().unwrap();
        let tdir = dir.path().join(".docket/templates");
        std::fs::create_dir_all(&tdir).unwrap();
        std::fs::write(tdir.join("task.md"), "---\nid: {{id}}\n---\n\n# {{title}}\n").unwrap();
        let doc = render(dir.path(), "task", &ctx()).unwrap();
        assert_eq!(doc, "---\nid: 007\n---\n\n# Fix login\n");
    }

    #[test]
    fn override_enables_custom_kinds() {
        let dir = TempDir::new().unwrap();
        let tdir = dir.path().join(".docket/templates");
        std::fs::create_dir_all(&tdir).unwrap();
        std::fs::write(tdir.join("spike.md"), "---\nid: {{id}}\n---\n").unwrap();
        assert!(render(dir.path(), "spike", &ctx()).is_ok());
    }
}
