use crate::output::print_json;
use anyhow::Context;
use docket_core::error::DocketError;
use docket_core::{config::Config, git, io, item, paths, validate, workflow};
use std::path::Path;

pub fn run(root: &Path, id: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let mut work_item = item::load_by_id(root, &cfg, id)?;

    let from = work_item.status().unwrap_or("").to_string();
    workflow::can_transition(&cfg, &from, status)?;

    work_item.frontmatter.set("status", status);
    if cfg.schema.contains("updated") {
        let today = chrono::Utc::now()
            .date_naive()
            .format(validate::DATE_FORMAT)
            .to_string();
        work_item.frontmatter.set("updated", &today);
    }

    let folder = cfg
        .folder_for_status(status)
        .ok_or_else(|| DocketError::UnknownStatus(status.to_string()))?;
    let file_name = work_item
        .path
        .file_name()
        .ok_or_else(|| DocketError::ItemNotFound(id.to_string()))?;
    let dest = paths::status_dir(root, &cfg.items_dir, folder).join(file_name);

    let source = work_item.path.clone();
    io::atomic_write(&dest, work_item.document().as_bytes())
        .with_context(|| format!("failed to write {}", dest.display()))?;
    std::fs::remove_file(&source)
        .with_context(|| format!("failed to remove {}", source.display()))?;

    if cfg.git.auto_commit {
        let message = format!("docket: move {id} from {from} to {status}");
        git::commit_files(root, &[&source, &dest], &message, &cfg.git)
            .context("failed to commit move")?;
    }

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "from": from,
            "to": status,
            "path": dest,
        }))?;
    } else {
        println!("Moved [{id}] {from} -> {status}");
        println!("  {}", dest.display());
    }
    Ok(())
}
