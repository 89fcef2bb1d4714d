use crate::output::print_json;
use anyhow::Context;
use docket_core::error::DocketError;
use docket_core::template::NewItem;
use docket_core::{config::Config, io, item, paths, template, validate};
use std::path::Path;

pub fn run(
    root: &Path,
    kind: &str,
    title: &str,
    status: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;

    let status = status.unwrap_or_else(|| cfg.initial_status());
    let folder = cfg
        .folder_for_status(status)
        .ok_or_else(|| DocketError::UnknownStatus(status.to_string()))?;

    let corpus = item::scan(root, &cfg).context("failed to scan work items")?;
    let next = corpus.max_id(cfg.id_digits) + 1;
    if next >= 10u64.pow(cfg.id_digits as u32) {
        return Err(DocketError::IdSpaceExhausted {
            width: cfg.id_digits,
        }
        .into());
    }
    let id = paths::format_id(next, cfg.id_digits);

    let created = chrono::Utc::now()
        .date_naive()
        .format(validate::DATE_FORMAT)
        .to_string();
    let document = template::render(
        root,
        kind,
        &NewItem {
            id: &id,
            title,
            status,
            created: &created,
        },
    )?;

    let path = paths::status_dir(root, &cfg.items_dir, folder)
        .join(paths::item_file_name(&id, title));
    io::atomic_write(&path, document.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "kind": kind,
            "status": status,
            "path": path,
        }))?;
    } else {
        println!("Created [{id}] {title}");
        println!("  {}", path.display());
    }
    Ok(())
}
