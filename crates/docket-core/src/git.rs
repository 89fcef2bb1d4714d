use crate::config::GitConfig;
use crate::error::{DocketError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

fn git_binary() -> Result<PathBuf> {
    which::which("git").map_err(|_| DocketError::GitNotInstalled)
}

fn run(root: &Path, git: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new(git).arg("-C").arg(root).args(args).output()?;
    if !output.status.success() {
        return Err(DocketError::Git(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}

/// Stage `files` and commit them with `message`. Author identity comes from
/// the docket config when set, otherwise git's own configuration applies.
/// Callers only invoke this when a commit was requested; a missing git binary
/// is an error here, not globally.
pub fn commit_files(root: &Path, files: &[&Path], message: &str, cfg: &GitConfig) -> Result<()> {
    let git = git_binary()?;

    let mut add: Vec<&str> = vec!["add", "--"];
    let rendered: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
    add.extend(rendered.iter().map(String::as_str));
    run(root, &git, &add)?;

    let mut commit: Vec<String> = Vec::new();
    if let Some(name) = &cfg.author_name {
        commit.push("-c".to_string());
        commit.push(format!("user.name={name}"));
    }
    if let Some(email) = &cfg.author_email {
        commit.push("-c".to_string());
        commit.push(format!("user.email={email}"));
    }
    commit.push("commit".to_string());
    commit.push("-m".to_string());
    commit.push(message.to_string());
    let args: Vec<&str> = commit.iter().map(String::as_str).collect();
    run(root, &git, &args)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_available() -> bool {
        which::which("git").is_ok()
    }

    fn init_repo(dir: &TempDir) {
        let git = which::which("git").unwrap();
        assert!(Command::new(&git)
            .arg("-C")
            .arg(dir.path())
            .args(["init", "-q"])
            .status()
            .unwrap()
            .success());
    }

    #[test]
    fn commit_with_configured_author() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        init_repo(&dir);
        let file = dir.path().join("001.md");
        std::fs::write(&file, "---\nid: 001\n---\n").unwrap();

        let cfg = GitConfig {
            author_name: Some("Docket Bot".to_string()),
            author_email: Some("docket@example.com".to_string()),
            auto_commit: true,
        };
        commit_files(dir.path(), &[&file], "docket: add 001", &cfg).unwrap();

        let git = which::which("git").unwrap();
        let log = Command::new(&git)
            .arg("-C")
            .arg(dir.path())
            .args(["log", "-1", "--format=%an <%ae> %s"])
            .output()
            .unwrap();
        let line = String::from_utf8_lossy(&log.stdout);
        assert!(line.contains("Docket Bot <docket@example.com>"));
        assert!(line.contains("docket: add 001"));
    }

    #[test]
    fn commit_outside_a_repo_fails() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("001.md");
        std::fs::write(&file, "x").unwrap();
        let err = commit_files(dir.path(), &[&file], "m", &GitConfig::default()).unwrap_err();
        assert!(matches!(err, DocketError::Git(_)));
    }
}
