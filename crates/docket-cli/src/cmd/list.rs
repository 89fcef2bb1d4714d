use crate::output::{print_json, print_table};
use docket_core::{config::Config, item};
use std::path::Path;

pub fn run(root: &Path, status: Option<&str>, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let corpus = item::scan(root, &cfg)?;
    for failure in &corpus.failures {
        tracing::warn!("{}: {}", failure.path.display(), failure.message);
    }

    let items: Vec<&item::WorkItem> = corpus
        .items
        .iter()
        .filter(|i| status.is_none() || i.status() == status)
        .collect();

    if json {
        let listing: Vec<serde_json::Value> = items
            .iter()
            .map(|i| {
                serde_json::json!({
                    "id": i.id(),
                    "status": i.status(),
                    "kind": i.kind(),
                    "title": i.title(),
                    "path": i.path,
                })
            })
            .collect();
        return print_json(&listing);
    }

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|i| {
            vec![
                i.id().unwrap_or("-").to_string(),
                i.status().unwrap_or("-").to_string(),
                i.kind().unwrap_or("-").to_string(),
                i.title().unwrap_or("(untitled)").to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "KIND", "TITLE"], &rows);
    Ok(())
}
