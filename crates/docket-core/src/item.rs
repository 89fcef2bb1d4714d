use crate::config::Config;
use crate::error::{DocketError, Result};
use crate::frontmatter::Frontmatter;
use crate::{io, paths};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// One parsed work-item document. The body is kept as raw bytes; the
/// frontmatter is the ordered mapping from [`Frontmatter`]. Rebuilding the
/// document from an untouched item reproduces the file byte-for-byte.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub body: String,
    /// Filesystem mtime at load, used as the duplicate-id tie-break.
    pub modified: SystemTime,
}

impl WorkItem {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let modified = std::fs::metadata(path)?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let (frontmatter, body) = Frontmatter::split(path, &text)?;
        Ok(Self {
            path: path.to_path_buf(),
            frontmatter,
            body: body.to_string(),
            modified,
        })
    }

    /// Full document bytes: re-encoded frontmatter plus the untouched body.
    pub fn document(&self) -> String {
        self.frontmatter.encode() + &self.body
    }

    pub fn save(&self) -> Result<()> {
        io::atomic_write(&self.path, self.document().as_bytes())
    }

    pub fn id(&self) -> Option<&str> {
        self.frontmatter.get("id")
    }

    pub fn status(&self) -> Option<&str> {
        self.frontmatter.get("status")
    }

    pub fn kind(&self) -> Option<&str> {
        self.frontmatter.get("kind")
    }

    /// Name of the folder the document lives in.
    pub fn folder(&self) -> Option<&str> {
        self.path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
    }

    /// First `# ` heading in the body, used as the display title.
    pub fn title(&self) -> Option<&str> {
        self.body
            .lines()
            .find_map(|l| l.strip_prefix("# "))
            .map(str::trim)
    }
}

// ---------------------------------------------------------------------------
// Corpus scan
// ---------------------------------------------------------------------------

/// A document that could not be parsed. Fatal to that one document only; the
/// scan always continues.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Corpus {
    pub items: Vec<WorkItem>,
    pub failures: Vec<ParseFailure>,
}

impl Corpus {
    pub fn find(&self, id: &str) -> Option<&WorkItem> {
        self.items.iter().find(|i| i.id() == Some(id))
    }

    /// Highest numeric id in use, honoring the configured width.
    pub fn max_id(&self, width: usize) -> u64 {
        self.items
            .iter()
            .filter_map(|i| i.id().and_then(|id| paths::id_value(id, width)))
            .max()
            .unwrap_or(0)
    }
}

/// Collect every work item under the configured status folders. Documents are
/// visited in lexical path order so findings are deterministic; per-file parse
/// errors are reported alongside the parsed corpus.
pub fn scan(root: &Path, cfg: &Config) -> Result<Corpus> {
    let mut files: Vec<PathBuf> = Vec::new();
    for status in &cfg.statuses {
        let dir = paths::status_dir(root, &cfg.items_dir, &status.folder);
        if !dir.exists() {
            continue;
        }
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "md") {
                files.push(path);
            }
        }
    }
    files.sort();

    let mut corpus = Corpus::default();
    for path in files {
        match WorkItem::load(&path) {
            Ok(item) => corpus.items.push(item),
            Err(e) => corpus.failures.push(ParseFailure {
                path,
                message: e.to_string(),
            }),
        }
    }
    Ok(corpus)
}

/// Load a single item by id, scanning the corpus.
pub fn load_by_id(root: &Path, cfg: &Config, id: &str) -> Result<WorkItem> {
    let corpus = scan(root, cfg)?;
    corpus
        .find(id)
        .cloned()
        .ok_or_else(|| DocketError::ItemNotFound(id.to_string()))
}

/// Move a document into the archive directory, bytes untouched.
pub fn archive(root: &Path, item: &WorkItem) -> Result<PathBuf> {
    let file_name = item
        .path
        .file_name()
        .ok_or_else(|| DocketError::ItemNotFound(item.path.display().to_string()))?;
    let dest = paths::archive_dir(root).join(file_name);
    io::move_file(&item.path, &dest)?;
    Ok(dest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = "---\nid: 001\nstatus: backlog\nkind: task\ncreated: 2024-03-01\npriority: medium\n---\n\n# Fix login\n\n## Requirements\n\n- redirect works\n";

    fn write_item(root: &Path, folder: &str, name: &str, text: &str) -> PathBuf {
        let dir = root.join("work").join(folder);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn load_and_accessors() {
        let dir = TempDir::new().unwrap();
        let path = write_item(dir.path(), "backlog", "001-fix-login.md", DOC);
        let item = WorkItem::load(&path).unwrap();
        assert_eq!(item.id(), Some("001"));
        assert_eq!(item.status(), Some("backlog"));
        assert_eq!(item.kind(), Some("task"));
        assert_eq!(item.folder(), Some("backlog"));
        assert_eq!(item.title(), Some("Fix login"));
    }

    #[test]
    fn document_roundtrip_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = write_item(dir.path(), "backlog", "001.md", DOC);
        let item = WorkItem::load(&path).unwrap();
        assert_eq!(item.document(), DOC);
    }

    #[test]
    fn scan_sorts_by_path_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "doing", "002-b.md", DOC);
        write_item(dir.path(), "backlog", "001-a.md", DOC);
        write_item(dir.path(), "backlog", "003-broken.md", "no frontmatter\n");

        let cfg = Config::new("t");
        let corpus = scan(dir.path(), &cfg).unwrap();
        assert_eq!(corpus.items.len(), 2);
        assert_eq!(corpus.failures.len(), 1);
        assert!(corpus.failures[0].path.ends_with("003-broken.md"));
        // Lexical order: backlog/001-a.md before doing/002-b.md.
        assert!(corpus.items[0].path.ends_with("001-a.md"));
        assert!(corpus.items[1].path.ends_with("002-b.md"));
    }

    #[test]
    fn scan_ignores_non_markdown() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "backlog", "notes.txt", "irrelevant");
        let cfg = Config::new("t");
        let corpus = scan(dir.path(), &cfg).unwrap();
        assert!(corpus.items.is_empty());
        assert!(corpus.failures.is_empty());
    }

    #[test]
    fn find_and_max_id() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "backlog", "001.md", DOC);
        write_item(
            dir.path(),
            "doing",
            "007.md",
            &DOC.replace("id: 001", "id: 007").replace("backlog", "doing"),
        );
        let cfg = Config::new("t");
        let corpus = scan(dir.path(), &cfg).unwrap();
        assert!(corpus.find("007").is_some());
        assert!(corpus.find("099").is_none());
        assert_eq!(corpus.max_id(3), 7);
    }

    #[test]
    fn archive_moves_file() {
        let dir = TempDir::new().unwrap();
        let path = write_item(dir.path(), "done", "001-old.md", DOC);
        let item = WorkItem::load(&path).unwrap();
        let dest = archive(dir.path(), &item).unwrap();
        assert!(!path.exists());
        assert!(dest.ends_with(".docket/archive/001-old.md"));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), DOC);
    }
}
