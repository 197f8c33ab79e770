pub mod attach;
pub mod correlate;
pub mod document;
pub mod renamed;
pub mod runner;
pub(crate) mod scanner;
pub mod suppress;

use anyhow::Result;
use rayon::prelude::*;
use std::path::Path;

use crate::config::Config;
use crate::error::LintError;
use crate::rules::all_rules;
use crate::types::{CheckResult, Finding, Severity};
use document::Document;

pub fn run(project_root: &Path, config: &Config) -> Result<CheckResult> {
    let paths = scanner::scan(project_root, config);
    if paths.is_empty() {
        anyhow::bail!("No YAML files found in {}", project_root.display());
    }
    let rules = all_rules(config)?;

    let findings: Vec<Finding> = paths
        .par_iter()
        .flat_map_iter(|p| match Document::read(p, project_root) {
            Ok(doc) => {
                tracing::debug!("linting {} as {}", doc.path.display(), doc.kind);
                runner::run_rules(&doc, &rules)
            }
            Err(e @ LintError::Parse(_)) => {
                let display = p.strip_prefix(project_root).unwrap_or(p);
                vec![runner::load_failure(display, &e)]
            }
            Err(e) => {
                tracing::warn!("failed to read {}: {e}", p.display());
                Vec::new()
            }
        })
        .collect();

    let mut result = CheckResult { findings };
    apply_lists(&mut result, config);

    result.findings.sort_by(|a, b| {
        (&a.file, a.line, &a.tag, &a.message).cmp(&(&b.file, b.line, &b.tag, &b.message))
    });
    result.findings.dedup_by(|a, b| {
        a.file == b.file && a.line == b.line && a.tag == b.tag && a.message == b.message
    });

    Ok(result)
}

fn listed(list: &[String], finding: &Finding) -> bool {
    list.iter().any(|entry| *entry == finding.rule || *entry == finding.tag)
}

/// Drop `skip_list` findings and downgrade `warn_list` ones to info.
fn apply_lists(result: &mut CheckResult, config: &Config) {
    result.findings.retain(|f| !listed(&config.skip_list, f));
    for finding in &mut result.findings {
        if listed(&config.warn_list, finding) {
            finding.severity = Severity::Info;
        }
    }
}
