use std::collections::BTreeSet;
use std::path::Path;

use super::correlate::{correlate, Correlation, TaskTree};
use super::suppress::subtree_skips;
use crate::error::LintError;
use crate::parser::comments::CommentTree;
use crate::parser::types::{Node, NodePath, Value};
use crate::types::FileKind;

/// Install suppression lists on `root`: one list on the document root for
/// flat files, one per task for task-bearing files.
///
/// A correlation failure is logged and leaves `root` exactly as it was.
pub fn append_skipped_rules(root: &mut Node, tree: &CommentTree, kind: FileKind, file: &Path) {
    if let Err(e) = try_append_skipped_rules(root, tree, kind, file) {
        tracing::error!("{}: {e}", file.display());
    }
}

fn try_append_skipped_rules(
    root: &mut Node,
    tree: &CommentTree,
    kind: FileKind,
    file: &Path,
) -> Result<(), LintError> {
    if kind.is_metadata_like() {
        let skips: BTreeSet<String> = tree
            .documents
            .iter()
            .filter(|d| d.is_collection())
            .flat_map(|d| subtree_skips(d, file))
            .collect();
        attach_to_root(root, skips.into_iter().collect());
        return Ok(());
    }

    let plan = plan_task_skips(root, tree, kind, file)?;
    for (path, skips) in plan {
        if let Some(task) = root.at_path_mut(&path) {
            task.skipped_rules = Some(skips);
        }
    }
    Ok(())
}

fn attach_to_root(root: &mut Node, skips: Vec<String>) {
    match &mut root.value {
        Value::Mapping(_) => root.skipped_rules = Some(skips),
        Value::Sequence(items) if !skips.is_empty() => {
            if let Some(first) = items.first_mut() {
                first.skipped_rules = Some(skips);
            }
        }
        _ => {}
    }
}

/// Decide every task's list before touching the tree, so that a mismatch
/// halfway through changes nothing.
fn plan_task_skips(
    root: &Node,
    tree: &CommentTree,
    kind: FileKind,
    file: &Path,
) -> Result<Vec<(NodePath, Vec<String>)>, LintError> {
    let Correlation::Pairs(pairs) = correlate(root, tree.root(), kind) else {
        tracing::debug!("{}: no task correlation for {kind} document", file.display());
        return Ok(Vec::new());
    };

    let mut plan = Vec::new();
    for (position, pair) in pairs.into_iter().enumerate() {
        match pair {
            (Some(semantic), _) if semantic.node.is_string() => continue,
            (Some(semantic), Some(comment)) => {
                let (left, right) = (semantic.node.task_name(), comment.node.task_name());
                if left != right {
                    return Err(LintError::Correlation {
                        position,
                        semantic: left,
                        comment: right,
                    });
                }
                plan.push((semantic.path, subtree_skips(comment.node, file)));
            }
            (semantic, comment) => {
                return Err(LintError::Correlation {
                    position,
                    semantic: semantic.and_then(|t| t.node.task_name()),
                    comment: comment.and_then(|t| t.node.task_name()),
                });
            }
        }
    }
    Ok(plan)
}
