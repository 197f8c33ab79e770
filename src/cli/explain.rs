use std::fmt::Write;

use crate::engine::renamed::current_name;
use crate::rules::{find_meta, RuleMeta, CATALOG};

const SUGGESTION_THRESHOLD: f64 = 0.8;

pub fn list_rules() -> String {
    let mut out = String::from("Available rules:\n\n");
    for meta in CATALOG {
        let _ = writeln!(out, "  {:<18} {}", meta.id, meta.description);
    }
    out.push_str("\nRun `playlint explain <rule>` for details.");
    out
}

/// Rule id of `query`, which may be a current id, a sub-tag or an outdated
/// name.
fn resolve(query: &str) -> Option<&'static RuleMeta> {
    let current = current_name(query).unwrap_or(query);
    let id = current.split_once('[').map_or(current, |(id, _)| id);
    find_meta(id)
}

pub fn explain(query: &str) -> Option<String> {
    let meta = resolve(query)?;
    let mut out = String::new();
    if let Some(new) = current_name(query) {
        let _ = writeln!(out, "`{query}` is an outdated name for `{new}`.\n");
    }
    let _ = writeln!(out, "{}: {}", meta.id, meta.description);
    let _ = writeln!(out);
    let _ = writeln!(out, "Severity: {}", meta.severity);
    if !meta.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", meta.tags.join(", "));
    }
    if !meta.sub_ids.is_empty() {
        let _ = writeln!(out, "\nSub-tags:");
        for (tag, desc) in meta.sub_ids {
            let _ = writeln!(out, "  {tag:<28} {desc}");
        }
    }
    let _ = write!(
        out,
        "\nSilence it on one line with `# noqa: {}`, or for a whole task by\n\
         placing the comment anywhere inside the task.",
        meta.id
    );
    Some(out)
}

/// Closest known rule id or sub-tag to a mistyped `query`.
pub fn suggest(query: &str) -> Option<&'static str> {
    CATALOG
        .iter()
        .flat_map(|meta| std::iter::once(meta.id).chain(meta.sub_ids.iter().map(|(t, _)| *t)))
        .map(|candidate| (candidate, strsim::jaro_winkler(query, candidate)))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}
