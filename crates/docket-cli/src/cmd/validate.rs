use crate::output::{print_findings, print_fix_outcomes, print_json, print_parse_failures};
use docket_core::validate::Finding;
use docket_core::{config::Config, fix, item, slice, validate, workflow};
use std::path::Path;

pub fn run(root: &Path, strict: bool, apply_fixes: bool, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root)?;
    let strict = strict || cfg.strict;

    let mut outcomes = Vec::new();
    if apply_fixes {
        let mut corpus = item::scan(root, &cfg)?;
        outcomes = fix::fix_corpus(&mut corpus, &cfg)?;
    }

    // Re-scan after fixes; the fix engine never re-validates on its own.
    let corpus = item::scan(root, &cfg)?;
    let mut findings: Vec<Finding> = Vec::new();
    for work_item in &corpus.items {
        findings.extend(validate::validate_item(work_item, &cfg.schema, strict));
        findings.extend(slice::lint(
            &work_item.path,
            &work_item.body,
            cfg.require_slices,
        ));
    }
    findings.extend(workflow::check(&corpus.items, &cfg));

    if json {
        print_json(&serde_json::json!({
            "documents": corpus.items.len(),
            "fixes": outcomes,
            "findings": findings,
            "parse_errors": corpus
                .failures
                .iter()
                .map(|f| serde_json::json!({ "file": f.path, "message": f.message }))
                .collect::<Vec<_>>(),
        }))?;
    } else {
        print_fix_outcomes(&outcomes);
        print_parse_failures(&corpus.failures);
        print_findings(&findings);
    }

    let broken = findings.len() + corpus.failures.len();
    if broken > 0 {
        anyhow::bail!("{broken} finding(s) in {} document(s)", corpus.items.len());
    }
    if !json {
        println!("OK: {} document(s) validated", corpus.items.len());
    }
    Ok(())
}
