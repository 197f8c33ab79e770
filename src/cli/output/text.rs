use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{CheckResult, Finding, Severity};

fn rule_line(f: &Finding) -> String {
    let tag = match f.severity {
        Severity::Error => f.tag.red().bold().to_string(),
        Severity::Warning => f.tag.yellow().bold().to_string(),
        Severity::Info => f.tag.blue().to_string(),
    };
    format!("      L{:<4} {tag} {}", f.line, f.message)
}

pub fn render(result: &CheckResult, project_root: &Path) {
    let rule = "\u{2501}".repeat(50);
    if result.findings.is_empty() {
        println!();
        println!("  {}", rule.dimmed());
        println!("  {}", "no issues found".green());
        println!();
        return;
    }

    let mut by_file: BTreeMap<String, Vec<&Finding>> = BTreeMap::new();
    for f in &result.findings {
        by_file
            .entry(super::relative_path(&f.file, project_root))
            .or_default()
            .push(f);
    }

    for (file, found) in &by_file {
        let worst = found.iter().map(|f| f.severity).max().unwrap_or(Severity::Info);
        let icon = match worst {
            Severity::Error => "\u{2717}".red().to_string(),
            Severity::Warning => "\u{26a0}".yellow().to_string(),
            Severity::Info => "\u{2139}".blue().to_string(),
        };
        println!();
        println!("  {icon} {} {}", file.bold(), format!("({})", found.len()).dimmed());
        for f in found {
            println!("{}", rule_line(f));
        }
    }

    let errors = result.error_count();
    let warnings = result.warning_count();
    let infos = result.info_count();
    let mut parts = Vec::new();
    if errors > 0 {
        parts.push(format!("{errors} errors").red().bold().to_string());
    }
    if warnings > 0 {
        parts.push(format!("{warnings} warnings").yellow().bold().to_string());
    }
    if infos > 0 {
        parts.push(format!("{infos} info").blue().to_string());
    }

    println!();
    println!("  {}", rule.dimmed());
    println!("  {} across {} files", parts.join(", "), by_file.len().bold());
    println!("  {}", rule.dimmed());
    println!();
}
