//! Variable naming conventions.
//!
//! Names are checked wherever a play, task or vars file defines them: play
//! and role `vars`, role parameters, task `vars`, `set_fact` keys, `register`
//! targets and the top-level keys of vars files. Inside a role, names are
//! expected to start with `<role>_`.

use anyhow::{Context, Result};
use regex::Regex;

use super::utils::{has_jinja, is_fqcn, is_fqcn_or_name, PYTHON_KEYWORDS};
use super::{Rule, RuleMeta, TaskMatch};
use crate::engine::document::Document;
use crate::error::LintError;
use crate::finding;
use crate::parser::task::Task;
use crate::parser::types::Node;
use crate::types::{FileKind, Finding, Severity};

pub const DEFAULT_PATTERN: &str = "^[a-z_][a-z0-9_]*$";

pub const META: RuleMeta = RuleMeta {
    id: "var-naming",
    description: "All variables should be named using only lowercase and underscores.",
    severity: Severity::Error,
    tags: &["idiom"],
    sub_ids: &[
        ("var-naming[non-string]", "Variables names must be strings."),
        ("var-naming[non-ascii]", "Variables names must be ASCII."),
        ("var-naming[no-keyword]", "Variables names must not be Python keywords."),
        (
            "var-naming[no-reserved]",
            "Variables names must not be Ansible reserved names.",
        ),
        ("var-naming[read-only]", "This special variable is read-only."),
        (
            "var-naming[pattern]",
            "Variables names should match the configured naming regex.",
        ),
        (
            "var-naming[no-role-prefix]",
            "Variables names from within roles should use the role name as a prefix.",
        ),
    ],
};

/// Keys injected by loaders to record source positions.
const ANNOTATION_KEYS: &[&str] = &["__file__", "__line__"];

/// Special variables users may legitimately set.
const ALLOWED_SPECIAL_NAMES: &[&str] = &[
    "ansible_become_user",
    "ansible_connection",
    "ansible_facts",
    "ansible_host",
    "ansible_python_interpreter",
    "ansible_remote_tmp",
    "ansible_user",
];

/// Special variables the engine sets itself. Connection variables are left
/// out on purpose; users tune those.
const READ_ONLY_NAMES: &[&str] = &[
    "ansible_check_mode",
    "ansible_collection_name",
    "ansible_config_file",
    "ansible_dependent_role_names",
    "ansible_diff_mode",
    "ansible_forks",
    "ansible_index_var",
    "ansible_inventory_sources",
    "ansible_limit",
    "ansible_local",
    "ansible_loop",
    "ansible_loop_var",
    "ansible_parent_role_names",
    "ansible_parent_role_paths",
    "ansible_play_batch",
    "ansible_play_hosts",
    "ansible_play_hosts_all",
    "ansible_play_name",
    "ansible_play_role_names",
    "ansible_playbook_python",
    "ansible_role_name",
    "ansible_role_names",
    "ansible_run_tags",
    "ansible_search_path",
    "ansible_skip_tags",
    "ansible_verbosity",
    "ansible_version",
    "group_names",
    "groups",
    "hostvars",
    "inventory_dir",
    "inventory_file",
    "inventory_hostname",
    "inventory_hostname_short",
    "omit",
    "play_hosts",
    "playbook_dir",
    "role_name",
    "role_names",
    "role_path",
];

/// Attribute names of plays, roles, blocks and tasks.
const RESERVED_NAMES: &[&str] = &[
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
    "fact_path",
    "failed_when",
    "force_handlers",
    "gather_facts",
    "gather_subset",
    "gather_timeout",
    "handlers",
    "hosts",
    "ignore_errors",
    "ignore_unreachable",
    "include",
    "local_action",
    "loop",
    "loop_control",
    "max_fail_percentage",
    "module_defaults",
    "name",
    "no_log",
    "notify",
    "order",
    "poll",
    "port",
    "post_tasks",
    "pre_tasks",
    "register",
    "remote_user",
    "rescue",
    "retries",
    "roles",
    "run_once",
    "serial",
    "strategy",
    "tags",
    "tasks",
    "throttle",
    "timeout",
    "until",
    "vars",
    "vars_files",
    "vars_prompt",
    "when",
    "with_",
];

/// Keys of a play's role entry that configure the role rather than pass it
/// variables.
const PLAYBOOK_ROLE_KEYWORDS: &[&str] = &[
    "any_errors_fatal",
    "become",
    "become_exe",
    "become_flags",
    "become_method",
    "become_user",
    "check_mode",
    "collections",
    "connection",
    "debugger",
    "delegate_facts",
    "delegate_to",
    "diff",
    "environment",
    "ignore_errors",
    "ignore_unreachable",
    "module_defaults",
    "name",
    "no_log",
    "port",
    "remote_user",
    "role",
    "run_once",
    "tags",
    "throttle",
    "timeout",
    "vars",
    "when",
];

/// Expected variable prefix inside a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prefix {
    pub value: String,
    /// The role was referenced by collection name, which relaxes the
    /// pattern check.
    pub from_fqcn: bool,
}

impl Prefix {
    pub fn role(name: &str) -> Self {
        Self {
            value: name.to_string(),
            from_fqcn: false,
        }
    }

    /// Prefix for a role referenced as `name`, `path/to/name` or
    /// `ns.collection.name`.
    pub fn parse(reference: &str) -> Self {
        let value = if reference.contains('.') {
            String::new()
        } else {
            reference.rsplit('/').next().unwrap_or_default().to_string()
        };
        Self {
            value,
            from_fqcn: is_fqcn(reference),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Sub-tag, e.g. `pattern`.
    pub sub: &'static str,
    pub message: String,
}

impl Violation {
    fn new(sub: &'static str, message: String) -> Self {
        Self { sub, message }
    }
}

pub struct VarNamingRule {
    pattern: Regex,
    pattern_text: String,
}

impl VarNamingRule {
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = Regex::new(pattern)
            .with_context(|| format!("invalid var_naming pattern `{pattern}`"))?;
        Ok(Self {
            pattern: compiled,
            pattern_text: pattern.to_string(),
        })
    }

    /// Anchored at the start only, like a `match` against the pattern.
    fn matches_pattern(&self, ident: &str) -> bool {
        self.pattern.find(ident).is_some_and(|m| m.start() == 0)
    }

    /// Check one variable name. The first failing check wins.
    pub fn validate(&self, ident: &str, prefix: Option<&Prefix>) -> Option<Violation> {
        if ANNOTATION_KEYS.contains(&ident) || ALLOWED_SPECIAL_NAMES.contains(&ident) {
            return None;
        }
        if !ident.is_ascii() {
            return Some(Violation::new(
                "non-ascii",
                format!("Variables names must be ASCII. ({ident})"),
            ));
        }
        if PYTHON_KEYWORDS.contains(&ident) {
            return Some(Violation::new(
                "no-keyword",
                format!("Variables names must not be Python keywords. ({ident})"),
            ));
        }
        if RESERVED_NAMES.contains(&ident) {
            return Some(Violation::new(
                "no-reserved",
                format!("Variables names must not be Ansible reserved names. ({ident})"),
            ));
        }
        if READ_ONLY_NAMES.contains(&ident) {
            return Some(Violation::new(
                "read-only",
                format!("This special variable is read-only. ({ident})"),
            ));
        }
        if ident.contains("{{") {
            return None;
        }
        if !self.matches_pattern(ident) && !prefix.is_some_and(|p| p.from_fqcn) {
            return Some(Violation::new(
                "pattern",
                format!(
                    "Variables names should match {} regex. ({ident})",
                    self.pattern_text
                ),
            ));
        }
        if let Some(prefix) = prefix {
            if !ident
                .trim_start_matches('_')
                .starts_with(&format!("{}_", prefix.value))
                && !has_jinja(&prefix.value)
                && is_fqcn_or_name(&prefix.value)
            {
                return Some(Violation::new(
                    "no-role-prefix",
                    format!(
                        "Variables names from within roles should use {}_ as a prefix.",
                        prefix.value
                    ),
                ));
            }
        }
        None
    }

    /// Like [`validate`](Self::validate), for a mapping key of any type.
    pub fn validate_key(&self, key: &Node, prefix: Option<&Prefix>) -> Option<Violation> {
        match key.as_str() {
            Some(ident) => self.validate(ident, prefix),
            None => Some(Violation::new(
                "non-string",
                "Variables names must be strings.".to_string(),
            )),
        }
    }

    /// Findings for every key of `vars`, reported on the key's line.
    fn check_mapping_keys(
        &self,
        vars: Option<&Node>,
        prefix: Option<&Prefix>,
        with_suffix: bool,
        doc: &Document,
        out: &mut Vec<Finding>,
    ) {
        let entries = vars.and_then(Node::as_mapping).unwrap_or_default();
        for entry in entries {
            if let Some(v) = self.validate_key(&entry.key, prefix) {
                let suffix = if with_suffix {
                    format!(" (vars: {})", key_text(&entry.key))
                } else {
                    String::new()
                };
                out.push(finding!(
                    META,
                    doc,
                    entry.key.line,
                    tag = META.tag(v.sub),
                    "{}{suffix}",
                    v.message
                ));
            }
        }
    }
}

fn key_text(key: &Node) -> String {
    key.as_scalar().map(|s| s.text()).unwrap_or_default()
}

fn role_prefix(doc: &Document) -> Option<Prefix> {
    doc.role.as_deref().map(Prefix::role)
}

impl Rule for VarNamingRule {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn match_task(&self, task: &Task<'_>, doc: &Document) -> TaskMatch {
        let mut out = Vec::new();
        let role_prefix = role_prefix(doc);

        // Only role includes pass their vars into a role's namespace.
        let task_prefix = match task.action.module.as_str() {
            "include_role" | "import_role" => Some(Prefix::parse(
                task.action
                    .arg("name")
                    .and_then(Node::as_str)
                    .unwrap_or_default(),
            )),
            _ => None,
        };
        self.check_mapping_keys(task.get("vars"), task_prefix.as_ref(), true, doc, &mut out);

        if task.action.module == "set_fact" {
            let keys = task
                .action
                .args
                .iter()
                .map(|(k, _)| k.as_str())
                .filter(|k| !k.starts_with("__") && *k != "cacheable" && *k != "_raw_params");
            for key in keys {
                if let Some(v) = self.validate(key, role_prefix.as_ref()) {
                    out.push(finding!(
                        META,
                        doc,
                        task.line(),
                        tag = META.tag(v.sub),
                        "{} (set_fact: {key})",
                        v.message
                    ));
                }
            }
        }

        if let Some(register) = task.get("register").filter(|r| r.is_truthy()) {
            if let Some(v) = self.validate_key(register, role_prefix.as_ref()) {
                out.push(finding!(
                    META,
                    doc,
                    task.line(),
                    tag = META.tag(v.sub),
                    "{} (register: {})",
                    v.message,
                    key_text(register)
                ));
            }
        }

        if out.is_empty() {
            TaskMatch::Pass
        } else {
            TaskMatch::Findings(out)
        }
    }

    fn match_play(&self, play: &Node, doc: &Document) -> Vec<Finding> {
        let mut out = Vec::new();
        self.check_mapping_keys(play.get("vars"), None, false, doc, &mut out);

        let roles = play.get("roles").and_then(Node::as_sequence).unwrap_or_default();
        for role in roles.iter().filter(|r| r.is_mapping()) {
            let reference = role
                .get("role")
                .or_else(|| role.get("name"))
                .and_then(Node::as_str)
                .unwrap_or_default();
            let prefix = Prefix::parse(reference);

            for entry in role.as_mapping().unwrap_or_default() {
                if entry
                    .key
                    .as_str()
                    .is_some_and(|k| PLAYBOOK_ROLE_KEYWORDS.contains(&k))
                {
                    continue;
                }
                if let Some(v) = self.validate_key(&entry.key, Some(&prefix)) {
                    out.push(finding!(
                        META,
                        doc,
                        entry.key.line,
                        tag = META.tag(v.sub),
                        "{} (vars: {})",
                        v.message,
                        key_text(&entry.key)
                    ));
                }
            }
            self.check_mapping_keys(role.get("vars"), Some(&prefix), true, doc, &mut out);
        }
        out
    }

    fn match_yaml(&self, doc: &Document) -> Result<Vec<Finding>, LintError> {
        if doc.kind != FileKind::Vars || !doc.data.is_truthy() {
            return Ok(Vec::new());
        }
        if !doc.data.is_mapping() {
            return Err(LintError::Schema {
                path: doc.path.clone(),
                message: "content of vars file is not a mapping".to_string(),
            });
        }
        let mut out = Vec::new();
        let prefix = role_prefix(doc);
        self.check_mapping_keys(Some(&doc.data), prefix.as_ref(), true, doc, &mut out);
        Ok(out)
    }
}
