use crate::config::Config;
use crate::error::{DocketError, Result};
use crate::item::WorkItem;
use crate::validate::{Finding, Rule};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Corpus checks
// ---------------------------------------------------------------------------

/// Cross-document invariants. Requires the full corpus (collect first, then
/// check): per-item status↔folder agreement in scan order, then one
/// `duplicate` finding per colliding id listing every path involved.
pub fn check(items: &[WorkItem], cfg: &Config) -> Vec<Finding> {
    let mut findings = Vec::new();

    for item in items {
        let Some(folder) = item.folder() else {
            continue;
        };
        let Some(canonical) = cfg.status_for_folder(folder) else {
            continue;
        };
        match item.status() {
            Some(status) if status == canonical => {}
            Some(status) => findings.push(Finding::new(
                &item.path,
                Rule::Workflow,
                format!("status '{status}' does not match folder '{folder}' (expected '{canonical}')"),
            )),
            None => findings.push(Finding::new(
                &item.path,
                Rule::Workflow,
                format!("no status set; folder '{folder}' expects '{canonical}'"),
            )),
        }
    }

    // Group by id, preserving first-occurrence order.
    let mut order: Vec<&str> = Vec::new();
    let mut by_id: HashMap<&str, Vec<&WorkItem>> = HashMap::new();
    for item in items {
        let Some(id) = item.id() else { continue };
        let group = by_id.entry(id).or_default();
        if group.is_empty() {
            order.push(id);
        }
        group.push(item);
    }
    for id in order {
        let group = &by_id[id];
        if group.len() < 2 {
            continue;
        }
        let listing = group
            .iter()
            .map(|i| i.path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        findings.push(Finding::new(
            &group[0].path,
            Rule::Duplicate,
            format!("id '{id}' is used by {} documents: {listing}", group.len()),
        ));
    }

    findings
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Check one status transition against the configured graph.
pub fn can_transition(cfg: &Config, from: &str, to: &str) -> Result<()> {
    if !cfg.is_status(from) {
        return Err(DocketError::UnknownStatus(from.to_string()));
    }
    if !cfg.is_status(to) {
        return Err(DocketError::UnknownStatus(to.to_string()));
    }
    if from == to {
        return Err(DocketError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "already in that status".to_string(),
        });
    }
    if !cfg.transitions_from(from).iter().any(|t| t == to) {
        return Err(DocketError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
            reason: "not an allowed transition".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
