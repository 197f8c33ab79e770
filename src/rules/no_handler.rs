use super::{Rule, RuleMeta, TaskMatch};
use crate::engine::document::Document;
use crate::parser::task::Task;
use crate::types::Severity;

pub const META: RuleMeta = RuleMeta {
    id: "no-handler",
    description: "Tasks that run when changed should likely be handlers.",
    severity: Severity::Error,
    tags: &["idiom"],
    sub_ids: &[],
};

const CHANGED_MARKERS: &[&str] = &[
    ".changed",
    "|changed",
    "[\"changed\"]",
    "['changed']",
    "is changed",
];

/// A lone `result.changed` test. Compound conditions are left alone.
fn changed_in_when(condition: &str) -> bool {
    if condition
        .split_whitespace()
        .any(|word| matches!(word, "and" | "or" | "not"))
    {
        return false;
    }
    CHANGED_MARKERS.iter().any(|m| condition.contains(m))
}

pub struct NoHandlerRule;

impl Rule for NoHandlerRule {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn match_task(&self, task: &Task<'_>, _doc: &Document) -> TaskMatch {
        if task.is_handler {
            return TaskMatch::Pass;
        }
        let condition = match task.get("when") {
            Some(when) => match when.as_sequence() {
                Some([only]) => only.as_str(),
                Some(_) => None,
                None => when.as_str(),
            },
            None => None,
        };
        if condition.is_some_and(changed_in_when) {
            TaskMatch::Violation
        } else {
            TaskMatch::Pass
        }
    }
}
