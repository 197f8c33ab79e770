use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use super::renamed::normalize_tag_with_warning;
use crate::parser::comments::{CommentNode, CommentToken, CommentTree, CommentValue};

const MARKER: &str = "# noqa";

/// A comment that starts with the marker. A bare `# noqa` is accepted too.
static NOQA_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*# noqa(\s|:|$)").unwrap());

/// What one source line suppresses.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineSkips {
    /// A marker without identifiers silences every rule on the line.
    pub all: bool,
    pub rules: BTreeSet<String>,
}

impl LineSkips {
    fn merge(&mut self, other: &LineSkips) {
        self.all |= other.all;
        self.rules.extend(other.rules.iter().cloned());
    }
}

/// Line number to suppressed identifiers, for one document. Only grows.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuppressionMap {
    lines: BTreeMap<usize, LineSkips>,
}

impl SuppressionMap {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, line: usize) -> Option<&LineSkips> {
        self.lines.get(&line)
    }

    /// Union `rules` into the set for `line`. An empty list marks the whole
    /// line as suppressed.
    pub fn add(&mut self, line: usize, rules: Vec<String>) {
        let entry = self.lines.entry(line).or_default();
        entry.all |= rules.is_empty();
        entry.rules.extend(rules);
    }

    /// Whether a finding tagged `tag` on `line` was silenced. A sub-tagged
    /// finding such as `var-naming[pattern]` is also silenced by its bare
    /// `rule_id`.
    pub fn is_suppressed(&self, line: usize, tag: &str, rule_id: &str) -> bool {
        self.lines.get(&line).is_some_and(|skips| {
            skips.all || skips.rules.contains(tag) || skips.rules.contains(rule_id)
        })
    }
}

/// Identifiers named by a marker comment, normalized to their current names.
pub fn rule_skips_from_line(text: &str, file: &Path, line: usize) -> Vec<String> {
    let Some((_, rest)) = text.split_once(MARKER) else {
        return Vec::new();
    };
    rest.trim_start_matches([' ', ':'])
        .split_whitespace()
        .map(|tag| normalize_tag_with_warning(tag, file, line))
        .collect()
}

fn is_marker(token: &CommentToken) -> bool {
    NOQA_COMMENT.is_match(&token.text)
}

/// Build the line map of every marker comment in the document, then let
/// standalone marker lines carry over to the next non-blank line.
pub fn extract_line_skips(tree: &CommentTree, file: &Path) -> SuppressionMap {
    let mut map = SuppressionMap::default();
    for doc in tree.documents.iter().filter(|d| d.is_collection()) {
        visit_comments(doc, &mut |token: &CommentToken| {
            if is_marker(token) {
                map.add(token.line, rule_skips_from_line(&token.text, file, token.line));
            }
        });
    }
    continue_skip_next_lines(&mut map, &tree.lines);
    map
}

fn continue_skip_next_lines(map: &mut SuppressionMap, lines: &[String]) {
    let standalone: Vec<usize> = map
        .lines
        .keys()
        .copied()
        .filter(|&line| {
            lines
                .get(line - 1)
                .is_some_and(|text| NOQA_COMMENT.is_match(text))
        })
        .collect();

    for line in standalone {
        let Some(next) = (line + 1..=lines.len()).find(|&n| !lines[n - 1].trim().is_empty())
        else {
            continue;
        };
        if let Some(skips) = map.lines.get(&line).cloned() {
            map.lines.entry(next).or_default().merge(&skips);
        }
    }
}

/// Identifiers named by marker comments anywhere inside `node`, sorted and
/// without duplicates. Used for the per-task and per-file suppression lists.
pub fn subtree_skips(node: &CommentNode, file: &Path) -> Vec<String> {
    let mut rules = BTreeSet::new();
    visit_comments(node, &mut |token: &CommentToken| {
        if is_marker(token) {
            rules.extend(rule_skips_from_line(&token.text, file, token.line));
        }
    });
    rules.into_iter().collect()
}

fn visit_comments<'a>(node: &'a CommentNode, f: &mut impl FnMut(&'a CommentToken)) {
    node.comments.iter().for_each(&mut *f);
    match &node.value {
        CommentValue::Mapping(entries) => {
            for entry in entries {
                visit_comments(&entry.value, f);
            }
        }
        CommentValue::Sequence(items) => {
            for item in items {
                visit_comments(item, f);
            }
        }
        CommentValue::Scalar(_) => {}
    }
}
