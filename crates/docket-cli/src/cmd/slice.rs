use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use docket_core::slice::{self, Slice};
use docket_core::{config::Config, git, io, item};
use std::path::Path;

#[derive(Subcommand)]
pub enum SliceSubcommand {
    /// List slices and tasks for a work item
    List { id: String },
    /// Add a slice
    Add { id: String, name: String },
    /// Add a task to a slice
    AddTask {
        id: String,
        slice: String,
        #[arg(required = true)]
        description: Vec<String>,
    },
    /// Mark a task done
    Done { id: String, task_id: String },
    /// Reopen a completed task
    Reopen { id: String, task_id: String },
    /// Edit a task's description
    Edit {
        id: String,
        task_id: String,
        #[arg(required = true)]
        description: Vec<String>,
    },
    /// Remove a task
    RemoveTask { id: String, task_id: String },
    /// Remove a slice and its tasks
    Remove { id: String, name: String },
}

pub fn run(root: &Path, subcmd: SliceSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SliceSubcommand::List { id } => list(root, &id, json),
        SliceSubcommand::Add { id, name } => {
            edit(root, &id, json, |slices| slice::add_slice(slices, &name))
        }
        SliceSubcommand::AddTask {
            id,
            slice: name,
            description,
        } => edit(root, &id, json, |slices| {
            slice::add_task(slices, &name, description.join(" ")).map(|_| ())
        }),
        SliceSubcommand::Done { id, task_id } => {
            edit(root, &id, json, |slices| slice::set_done(slices, &task_id, true))
        }
        SliceSubcommand::Reopen { id, task_id } => {
            edit(root, &id, json, |slices| slice::set_done(slices, &task_id, false))
        }
        SliceSubcommand::Edit {
            id,
            task_id,
            description,
        } => edit(root, &id, json, |slices| {
            slice::edit_description(slices, &task_id, description.join(" "))
        }),
        SliceSubcommand::RemoveTask { id, task_id } => {
            edit(root, &id, json, |slices| slice::remove_task(slices, &task_id))
        }
        SliceSubcommand::Remove { id, name } => {
            edit(root, &id, json, |slices| slice::remove_slice(slices, &name))
        }
    }
}

fn list(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let work_item = item::load_by_id(root, &cfg, id)?;
    let slices = slice::parse_slices(&work_item.body);

    if json {
        return print_json(&slices);
    }

    let mut rows = Vec::new();
    for s in &slices {
        for t in &s.tasks {
            rows.push(vec![
                s.name.clone(),
                t.id.clone(),
                if t.done { "x" } else { " " }.to_string(),
                t.description.clone(),
            ]);
        }
    }
    print_table(&["SLICE", "TASK", "DONE", "DESCRIPTION"], &rows);
    Ok(())
}

/// Load an item, apply one mutation to its slice list, and splice the result
/// back leaving every byte outside the Slices section untouched.
fn edit(
    root: &Path,
    id: &str,
    json: bool,
    mutate: impl FnOnce(&mut Vec<Slice>) -> docket_core::Result<()>,
) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let work_item = item::load_by_id(root, &cfg, id)?;

    let before = slice::parse_slices(&work_item.body);
    let mut after = before.clone();
    mutate(&mut after)?;

    let document = slice::write_slices(&work_item.document(), &after);
    io::atomic_write(&work_item.path, document.as_bytes())
        .with_context(|| format!("failed to write {}", work_item.path.display()))?;

    let changes = slice::detect_task_changes(&before, &after);
    if cfg.git.auto_commit {
        let message = match changes.summary() {
            Some(summary) => format!("docket: update {id} slices ({summary})"),
            None => format!("docket: update {id} slices"),
        };
        git::commit_files(root, &[&work_item.path], &message, &cfg.git)
            .context("failed to commit slice edit")?;
    }

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "changes": changes,
            "slices": after,
        }))?;
    } else {
        match changes.summary() {
            Some(summary) => println!("Updated [{id}] slices: {summary}"),
            None => println!("Updated [{id}] slices"),
        }
    }
    Ok(())
}
