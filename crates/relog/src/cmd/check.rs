use std::path::Path;

use miette::Result;
use relog_changelog::{Sections, lint};
use serde_json::json;
use tracing::debug;

use crate::cmd::load_changelog;

pub(crate) fn run(path: &Path, sections: &Sections, strict: bool, json: bool) -> Result<()> {
    let changelog = load_changelog(path)?;
    let report = lint::check(&changelog, sections);
    debug!(
        "found {count} problems in {path}",
        count = report.problems().len(),
        path = path.display()
    );

    if json {
        let problems = report
            .problems()
            .iter()
            .map(|problem| {
                json!({
                    "code": problem.code(),
                    "line": problem.line(),
                    "severity": if problem.is_warning() { "warning" } else { "error" },
                    "message": problem.to_string(),
                })
            })
            .collect::<Vec<_>>();
        println!("{json}", json = json!(problems));
    }

    if report.fails(strict) {
        return Err(report.into());
    }
    if !json && !report.is_empty() {
        // Warnings don't fail the run but still deserve a report.
        eprintln!("{report:?}", report = miette::Report::new(report));
    }
    Ok(())
}
