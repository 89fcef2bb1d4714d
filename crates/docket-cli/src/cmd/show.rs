use crate::output::print_json;
use docket_core::{config::Config, item, slice};
use std::path::Path;

pub fn run(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let work_item = item::load_by_id(root, &cfg, id)?;

    if json {
        let slices = slice::parse_slices(&work_item.body);
        return print_json(&serde_json::json!({
            "id": work_item.id(),
            "status": work_item.status(),
            "kind": work_item.kind(),
            "title": work_item.title(),
            "path": work_item.path,
            "slices": slices,
        }));
    }

    print!("{}", work_item.document());
    Ok(())
}
