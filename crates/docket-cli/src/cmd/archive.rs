use crate::output::print_json;
use anyhow::Context;
use docket_core::{config::Config, git, item};
use std::path::Path;

pub fn run(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let work_item = item::load_by_id(root, &cfg, id)?;
    let source = work_item.path.clone();
    let dest = item::archive(root, &work_item).context("failed to archive")?;

    if cfg.git.auto_commit {
        let message = format!("docket: archive {id}");
        git::commit_files(root, &[&source, &dest], &message, &cfg.git)
            .context("failed to commit archive")?;
    }

    if json {
        print_json(&serde_json::json!({ "id": id, "path": dest }))?;
    } else {
        println!("Archived [{id}]");
        println!("  {}", dest.display());
    }
    Ok(())
}
