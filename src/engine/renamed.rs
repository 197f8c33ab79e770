//! Outdated rule identifiers and their current names.
//!
//! Suppression comments and config lists written against older releases still
//! use numeric ids or since-renamed tags. Every identifier read from a comment
//! or a config list goes through [`normalize_tag`].

use std::collections::HashSet;
use std::path::Path;
use std::sync::{LazyLock, Mutex};

pub const RENAMED_TAGS: &[(&str, &str)] = &[
    ("102", "no-jinja-when"),
    ("104", "deprecated-bare-vars"),
    ("105", "deprecated-module"),
    ("106", "role-name"),
    ("202", "risky-octal"),
    ("203", "no-tabs"),
    ("205", "playbook-extension"),
    ("206", "jinja[spacing]"),
    ("207", "jinja[invalid]"),
    ("208", "risky-file-permissions"),
    ("301", "no-changed-when"),
    ("302", "no-free-form"),
    ("303", "command-instead-of-module"),
    ("304", "inline-env-var"),
    ("305", "command-instead-of-shell"),
    ("306", "risky-shell-pipe"),
    ("401", "latest[git]"),
    ("402", "latest[hg]"),
    ("403", "package-latest"),
    ("404", "no-relative-paths"),
    ("501", "partial-become"),
    ("502", "name[missing]"),
    ("503", "no-handler"),
    ("504", "deprecated-local-action"),
    ("505", "missing-import"),
    ("601", "literal-compare"),
    ("602", "empty-string-compare"),
    ("701", "meta-no-info"),
    ("702", "meta-no-tags"),
    ("703", "meta-incorrect"),
    ("704", "meta-video-links"),
    ("911", "syntax-check"),
    ("comparison-to-empty-string", "empty-string-compare"),
    ("comparison-to-literal-bool", "literal-compare"),
    ("fqcn-builtins", "fqcn[action-core]"),
    ("git-latest", "latest[git]"),
    ("hg-latest", "latest[hg]"),
    ("unnamed-task", "name[missing]"),
    ("var-spacing", "jinja[spacing]"),
];

/// Outdated tags already reported in this process. Reset only by restarting.
static WARNED: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

pub fn current_name(tag: &str) -> Option<&'static str> {
    RENAMED_TAGS
        .iter()
        .find(|(old, _)| *old == tag)
        .map(|(_, new)| *new)
}

/// Map an outdated tag to its current name. Current names pass through
/// unchanged.
pub fn normalize_tag(tag: &str) -> String {
    current_name(tag).map_or_else(|| tag.to_string(), str::to_string)
}

/// Like [`normalize_tag`], but warns the first time each outdated tag is seen.
pub fn normalize_tag_with_warning(tag: &str, file: &Path, line: usize) -> String {
    match current_name(tag) {
        Some(new) => {
            if note_outdated(tag) {
                tracing::warn!(
                    target: "playlint::outdated_tag",
                    "{}:{line}: replaced outdated tag '{tag}' with '{new}', replace it to avoid future errors",
                    file.display()
                );
            }
            new.to_string()
        }
        None => tag.to_string(),
    }
}

/// Record `tag` as reported. Returns `true` only for the first call per tag.
pub fn note_outdated(tag: &str) -> bool {
    match WARNED.lock() {
        Ok(mut warned) => warned.insert(tag.to_string()),
        Err(poisoned) => poisoned.into_inner().insert(tag.to_string()),
    }
}
