use anyhow::Context;
use docket_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing docket in: {}", root.display());

    // Config first: folder layout below follows it.
    let config_path = paths::config_path(root);
    let cfg = if config_path.exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config.yaml")?
    } else {
        let cfg = Config::new(&project_name);
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        cfg
    };

    for warning in cfg.validate() {
        tracing::warn!("config: {}", warning.message);
    }

    io::ensure_dir(&paths::templates_dir(root))?;
    io::ensure_dir(&paths::archive_dir(root))?;
    for status in &cfg.statuses {
        let dir = paths::status_dir(root, &cfg.items_dir, &status.folder);
        io::ensure_dir(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    println!(
        "  folders: {}/{{{}}}",
        cfg.items_dir,
        cfg.statuses
            .iter()
            .map(|s| s.folder.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );

    println!("\nDocket initialized.");
    println!("Next: docket new task \"...\"");
    Ok(())
}
