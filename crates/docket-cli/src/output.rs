use docket_core::fix::FixOutcome;
use docket_core::item::ParseFailure;
use docket_core::validate::Finding;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let render = |cells: Vec<String>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{c:<width$}", width = widths.get(i).copied().unwrap_or(0)))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!(
        "{}",
        render(headers.iter().map(|h| h.to_string()).collect())
    );
    println!(
        "{}",
        widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in rows {
        println!("{}", render(row.clone()));
    }
}

pub fn print_findings(findings: &[Finding]) {
    for finding in findings {
        println!("{finding}");
    }
}

pub fn print_parse_failures(failures: &[ParseFailure]) {
    for failure in failures {
        println!("{}: [parse] {}", failure.path.display(), failure.message);
    }
}

pub fn print_fix_outcomes(outcomes: &[FixOutcome]) {
    for outcome in outcomes {
        println!("{outcome}");
    }
}
