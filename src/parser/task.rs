use super::types::{Node, Value};

/// Keys under which a container task nests further task lists.
pub const NESTED_TASK_KEYS: &[&str] = &["block", "always", "rescue"];

/// Play keys that hold task lists, in traversal order.
pub const PLAYBOOK_TASK_KEYWORDS: &[&str] = &["tasks", "pre_tasks", "post_tasks", "handlers"];

/// Pseudo action name reported for container tasks.
pub const CONTAINER_ACTION: &str = "block/always/rescue";

/// A task tagged with this is ignored by every task rule.
pub const SKIP_TAG: &str = "skip_ansible_lint";

/// Task keys that are keywords rather than the module being invoked.
const TASK_KEYWORDS: &[&str] = &[
    "action",
    "always",
    "any_errors_fatal",
    "args",
    "async",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "block",
    "changed_when",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "delay",
    "delegate_facts",
    "delegate_to",
    "diff",
    "environment",
    "failed_when",
    "ignore_errors",
    "ignore_unreachable",
    "listen",
    "local_action",
    "loop",
    "loop_control",
    "module_defaults",
    "name",
    "no_log",
    "notify",
    "poll",
    "port",
    "register",
    "remote_user",
    "rescue",
    "retries",
    "run_once",
    "tags",
    "throttle",
    "timeout",
    "until",
    "vars",
    "when",
];

/// The normalized action of a task: which module it runs and with what.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Module short name, namespace dropped (`ansible.builtin.yum` -> `yum`).
    pub module: String,
    /// Module name as written in the task.
    pub original: String,
    pub args: Vec<(String, Node)>,
}

impl Action {
    pub fn arg(&self, key: &str) -> Option<&Node> {
        self.args.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn arg_is_truthy(&self, key: &str) -> bool {
        self.arg(key).is_some_and(Node::is_truthy)
    }
}

/// Read-only view of a task mapping in the semantic tree.
#[derive(Debug, Clone)]
pub struct Task<'a> {
    pub node: &'a Node,
    pub action: Action,
    pub is_handler: bool,
}

impl<'a> Task<'a> {
    /// `None` when `node` is not a mapping (e.g. a bare string entry).
    pub fn new(node: &'a Node, is_handler: bool) -> Option<Self> {
        node.as_mapping()?;
        Some(Self {
            node,
            action: normalize_action(node),
            is_handler,
        })
    }

    pub fn line(&self) -> usize {
        self.node.line
    }

    pub fn get(&self, key: &str) -> Option<&'a Node> {
        self.node.get(key)
    }

    pub fn name(&self) -> Option<&'a str> {
        self.get("name").and_then(Node::as_str)
    }

    pub fn is_container(&self) -> bool {
        is_nested_task(self.node)
    }

    pub fn tags(&self) -> Vec<&'a str> {
        match self.get("tags") {
            Some(node) => match node.as_sequence() {
                Some(items) => items.iter().filter_map(Node::as_str).collect(),
                None => node.as_str().into_iter().collect(),
            },
            None => Vec::new(),
        }
    }

    /// Whether the author silenced `rule_id` (or the specific `tag`) for
    /// this whole task.
    pub fn is_skipped(&self, rule_id: &str, tag: &str) -> bool {
        self.tags().contains(&SKIP_TAG)
            || self
                .node
                .skipped_rules()
                .iter()
                .any(|s| s == rule_id || s == tag)
    }
}

/// Whether a task nests other tasks under `block`, `always` or `rescue`.
pub fn is_nested_task(node: &Node) -> bool {
    NESTED_TASK_KEYS
        .iter()
        .any(|k| node.get(k).is_some_and(Node::is_truthy))
}

fn normalize_action(task: &Node) -> Action {
    if is_nested_task(task) {
        return Action {
            module: CONTAINER_ACTION.to_string(),
            original: CONTAINER_ACTION.to_string(),
            args: Vec::new(),
        };
    }

    let mut action = match task.get("action").or_else(|| task.get("local_action")) {
        Some(spec) => action_from_spec(spec, task.line),
        None => task
            .as_mapping()
            .unwrap_or_default()
            .iter()
            .find_map(|e| {
                let key = e.key.as_str()?;
                (!is_keyword(key)).then(|| Action {
                    module: short_name(key),
                    original: key.to_string(),
                    args: args_from_value(&e.value),
                })
            })
            .unwrap_or_else(|| Action {
                module: String::new(),
                original: String::new(),
                args: Vec::new(),
            }),
    };

    if let Some(extra) = task.get("args") {
        action.args.extend(args_from_value(extra));
    }
    action
}

fn is_keyword(key: &str) -> bool {
    TASK_KEYWORDS.contains(&key) || key.starts_with("with_") || key.starts_with("__")
}

fn short_name(module: &str) -> String {
    module.rsplit('.').next().unwrap_or(module).to_string()
}

/// `action: yum name=x` or `action: {module: yum, name: x}`.
fn action_from_spec(spec: &Node, line: usize) -> Action {
    if let Some(text) = spec.as_str() {
        let (module, rest) = text.trim().split_once(char::is_whitespace).unwrap_or((text.trim(), ""));
        return Action {
            module: short_name(module),
            original: module.to_string(),
            args: parse_free_form(rest, line),
        };
    }
    let module = spec.get("module").and_then(Node::as_str).unwrap_or_default();
    Action {
        module: short_name(module),
        original: module.to_string(),
        args: args_from_value(spec)
            .into_iter()
            .filter(|(k, _)| k != "module")
            .collect(),
    }
}

fn args_from_value(value: &Node) -> Vec<(String, Node)> {
    match &value.value {
        Value::Mapping(entries) => entries
            .iter()
            .filter_map(|e| Some((e.key.as_str()?.to_string(), e.value.clone())))
            .collect(),
        _ => match value.as_str() {
            Some(text) => parse_free_form(text, value.line),
            None => Vec::new(),
        },
    }
}

/// Split `key=value` pairs out of a free-form module string. Words without
/// `=` are the module's raw parameters.
fn parse_free_form(text: &str, line: usize) -> Vec<(String, Node)> {
    let mut args = Vec::new();
    let mut raw = Vec::new();
    for word in split_words(text) {
        match word.split_once('=') {
            Some((k, v)) if !k.is_empty() && !k.starts_with(['"', '\'']) => {
                args.push((k.to_string(), Node::string(line, unquote(v))));
            }
            _ => raw.push(word),
        }
    }
    if !raw.is_empty() {
        args.push(("_raw_params".to_string(), Node::string(line, raw.join(" "))));
    }
    args
}

/// Split on whitespace outside quotes. Quotes stay in the words; a
/// backslash escapes the next char inside double quotes.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match (quote, c) {
            (None, c) if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            (None, '"' | '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (Some('"'), '\\') => {
                current.push(c);
                current.extend(chars.next());
            }
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(q)
            .and_then(|rest| rest.strip_suffix(q))
        {
            return inner;
        }
    }
    value
}
