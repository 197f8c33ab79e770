//! Positional pairing of tasks across the semantic tree and the comment tree.
//!
//! Both trees come from the same text, so flattening them the same way must
//! produce the same task sequence. Names are compared later, when
//! suppression lists are attached.

use crate::parser::comments::{CommentNode, CommentValue};
use crate::parser::task::{NESTED_TASK_KEYS, PLAYBOOK_TASK_KEYWORDS};
use crate::parser::types::{Node, NodePath, PathSeg, Scalar, Value};
use crate::types::FileKind;

/// The shape both trees share, as far as task traversal needs it.
pub trait TaskTree: Sized {
    fn is_mapping(&self) -> bool;
    fn is_string(&self) -> bool;
    fn is_truthy(&self) -> bool;
    fn items(&self) -> Option<&[Self]>;
    /// Entry index and value for `key`; the last duplicate wins.
    fn lookup(&self, key: &str) -> Option<(usize, &Self)>;

    /// The `name` field as source-like text.
    fn task_name(&self) -> Option<String>;
}

impl TaskTree for Node {
    fn is_mapping(&self) -> bool {
        Node::is_mapping(self)
    }

    fn is_string(&self) -> bool {
        self.as_str().is_some()
    }

    fn is_truthy(&self) -> bool {
        Node::is_truthy(self)
    }

    fn items(&self) -> Option<&[Self]> {
        self.as_sequence()
    }

    fn lookup(&self, key: &str) -> Option<(usize, &Self)> {
        let idx = self.entry_index(key)?;
        self.as_mapping().map(|entries| (idx, &entries[idx].value))
    }

    fn task_name(&self) -> Option<String> {
        self.get("name").map(|n| match &n.value {
            Value::Scalar(s) => s.text(),
            Value::Sequence(_) => "<sequence>".to_string(),
            Value::Mapping(_) => "<mapping>".to_string(),
        })
    }
}

impl TaskTree for CommentNode {
    fn is_mapping(&self) -> bool {
        matches!(self.value, CommentValue::Mapping(_))
    }

    fn is_string(&self) -> bool {
        matches!(self.value, CommentValue::Scalar(Scalar::String(_)))
    }

    fn is_truthy(&self) -> bool {
        match &self.value {
            CommentValue::Scalar(s) => s.is_truthy(),
            CommentValue::Sequence(items) => !items.is_empty(),
            CommentValue::Mapping(entries) => !entries.is_empty(),
        }
    }

    fn items(&self) -> Option<&[Self]> {
        self.as_sequence()
    }

    fn lookup(&self, key: &str) -> Option<(usize, &Self)> {
        match &self.value {
            CommentValue::Mapping(entries) => entries
                .iter()
                .enumerate()
                .rev()
                .find(|(_, e)| e.key.as_scalar().and_then(Scalar::as_str) == Some(key))
                .map(|(idx, e)| (idx, &e.value)),
            _ => None,
        }
    }

    fn task_name(&self) -> Option<String> {
        self.get("name").map(|n| match &n.value {
            CommentValue::Scalar(s) => s.text(),
            CommentValue::Sequence(_) => "<sequence>".to_string(),
            CommentValue::Mapping(_) => "<mapping>".to_string(),
        })
    }
}

/// A task found by flattening, with the path that reaches it from the root.
#[derive(Debug)]
pub struct FlatTask<'a, T> {
    pub path: NodePath,
    pub node: &'a T,
}

/// Task lists of a document: the root for task and handler files, every
/// play's `tasks`, `pre_tasks`, `post_tasks` and `handlers` for playbooks.
///
/// `None` when the document does not have the shape its kind promises.
pub fn task_blocks<T: TaskTree>(root: &T, kind: FileKind) -> Option<Vec<FlatTask<'_, T>>> {
    let blocks = match kind {
        FileKind::Tasks | FileKind::Handlers => index_items(root.items()?, &[]),
        FileKind::Playbook => {
            let mut blocks = Vec::new();
            for (pi, play) in root.items()?.iter().enumerate() {
                if !play.is_mapping() {
                    return None;
                }
                for key in PLAYBOOK_TASK_KEYWORDS {
                    let Some((ei, value)) = play.lookup(key) else {
                        continue;
                    };
                    if !value.is_truthy() {
                        continue;
                    }
                    let prefix = [PathSeg::Item(pi), PathSeg::Entry(ei)];
                    blocks.extend(index_items(value.items()?, &prefix));
                }
            }
            blocks
        }
        _ => return None,
    };
    Some(blocks)
}

fn index_items<'a, T>(items: &'a [T], prefix: &[PathSeg]) -> Vec<FlatTask<'a, T>> {
    items
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let mut path = prefix.to_vec();
            path.push(PathSeg::Item(i));
            FlatTask { path, node }
        })
        .collect()
}

/// Expand container tasks. Nested tasks come before the container that holds
/// them; falsy entries are dropped.
pub fn flatten_tasks<T: TaskTree>(blocks: Vec<FlatTask<'_, T>>) -> Vec<FlatTask<'_, T>> {
    let mut out = Vec::new();
    for task in blocks {
        push_with_nested(task, &mut out);
    }
    out
}

fn push_with_nested<'a, T: TaskTree>(task: FlatTask<'a, T>, out: &mut Vec<FlatTask<'a, T>>) {
    if !task.node.is_truthy() {
        return;
    }
    for key in NESTED_TASK_KEYS {
        let Some((ei, value)) = task.node.lookup(key) else {
            continue;
        };
        // A mapping under a container key is not a task list.
        let Some(items) = value.items().filter(|_| value.is_truthy()) else {
            continue;
        };
        let mut prefix = task.path.clone();
        prefix.push(PathSeg::Entry(ei));
        for sub in index_items(items, &prefix) {
            push_with_nested(sub, out);
        }
    }
    out.push(task);
}

pub type TaskPair<'a> = (
    Option<FlatTask<'a, Node>>,
    Option<FlatTask<'a, CommentNode>>,
);

#[derive(Debug)]
pub enum Correlation<'a> {
    /// No task-level correlation applies; the semantic tree stays as loaded.
    Unsupported,
    Pairs(Vec<TaskPair<'a>>),
}

/// Pair the flattened tasks of both trees by position. Sequences of unequal
/// length pad the shorter side with `None`.
pub fn correlate<'a>(
    semantic: &'a Node,
    comments: Option<&'a CommentNode>,
    kind: FileKind,
) -> Correlation<'a> {
    let Some(comments) = comments else {
        return Correlation::Unsupported;
    };
    let (Some(left), Some(right)) = (task_blocks(semantic, kind), task_blocks(comments, kind))
    else {
        return Correlation::Unsupported;
    };

    let mut left = flatten_tasks(left).into_iter();
    let mut right = flatten_tasks(right).into_iter();
    let mut pairs = Vec::new();
    loop {
        match (left.next(), right.next()) {
            (None, None) => break,
            pair => pairs.push(pair),
        }
    }
    Correlation::Pairs(pairs)
}
