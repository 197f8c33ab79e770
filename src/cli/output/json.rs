use serde::Serialize;
use std::path::Path;

use crate::types::{CheckResult, Severity};

#[derive(Serialize)]
struct JsonOutput<'a> {
    findings: Vec<JsonFinding<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonFinding<'a> {
    file: String,
    line: usize,
    rule: &'a str,
    tag: &'a str,
    severity: Severity,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    info: usize,
}

fn build_output<'a>(result: &'a CheckResult, project_root: &Path) -> JsonOutput<'a> {
    let findings = result
        .findings
        .iter()
        .map(|f| JsonFinding {
            file: super::relative_path(&f.file, project_root),
            line: f.line,
            rule: f.rule,
            tag: &f.tag,
            severity: f.severity,
            message: &f.message,
        })
        .collect();

    JsonOutput {
        findings,
        summary: JsonSummary {
            errors: result.error_count(),
            warnings: result.warning_count(),
            info: result.info_count(),
        },
    }
}

pub fn render(result: &CheckResult, project_root: &Path) {
    let output = build_output(result, project_root);
    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("failed to serialize findings: {e}"),
    }
}
