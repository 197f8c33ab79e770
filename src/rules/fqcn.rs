use super::{Rule, RuleMeta, TaskMatch};
use crate::engine::document::Document;
use crate::finding;
use crate::parser::task::Task;
use crate::types::Severity;

pub const META: RuleMeta = RuleMeta {
    id: "fqcn",
    description: "Use FQCN for all actions.",
    severity: Severity::Error,
    tags: &["formatting"],
    sub_ids: &[
        (
            "fqcn[action-core]",
            "Use FQCN for builtin actions, e.g. `ansible.builtin.copy`.",
        ),
        (
            "fqcn[canonical]",
            "Use `ansible.builtin.*` instead of `ansible.legacy.*` for builtin actions.",
        ),
        (
            "fqcn[action]",
            "Use FQCN for module actions, `<namespace>.<collection>.<module>`.",
        ),
    ],
};

/// Modules shipped with the core engine, addressable as
/// `ansible.builtin.<name>`.
const BUILTIN_MODULES: &[&str] = &[
    "add_host",
    "apt",
    "apt_key",
    "apt_repository",
    "assemble",
    "assert",
    "async_status",
    "blockinfile",
    "command",
    "copy",
    "cron",
    "debconf",
    "debug",
    "dnf",
    "dpkg_selections",
    "expect",
    "fail",
    "fetch",
    "file",
    "find",
    "gather_facts",
    "get_url",
    "getent",
    "git",
    "group",
    "group_by",
    "hostname",
    "import_playbook",
    "import_role",
    "import_tasks",
    "include",
    "include_role",
    "include_tasks",
    "include_vars",
    "iptables",
    "known_hosts",
    "lineinfile",
    "meta",
    "package",
    "package_facts",
    "pause",
    "ping",
    "pip",
    "raw",
    "reboot",
    "replace",
    "rpm_key",
    "script",
    "service",
    "service_facts",
    "set_fact",
    "set_stats",
    "setup",
    "shell",
    "slurp",
    "stat",
    "subversion",
    "systemd",
    "sysvinit",
    "tempfile",
    "template",
    "unarchive",
    "uri",
    "user",
    "wait_for",
    "wait_for_connection",
    "yum",
    "yum_repository",
];

pub struct FqcnRule;

impl Rule for FqcnRule {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn match_task(&self, task: &Task<'_>, doc: &Document) -> TaskMatch {
        let module = task.action.original.as_str();
        if module.is_empty() || task.is_container() {
            return TaskMatch::Pass;
        }

        let finding = if BUILTIN_MODULES.contains(&module) {
            finding!(
                META,
                doc,
                task.line(),
                tag = META.tag("action-core"),
                "Use FQCN for builtin module actions ({module})."
            )
        } else if let Some(short) = module
            .strip_prefix("ansible.legacy.")
            .filter(|short| BUILTIN_MODULES.contains(short))
        {
            finding!(
                META,
                doc,
                task.line(),
                tag = META.tag("canonical"),
                "You should use canonical module name `ansible.builtin.{short}` instead of `{module}`."
            )
        } else if module.matches('.').count() < 2 {
            finding!(
                META,
                doc,
                task.line(),
                tag = META.tag("action"),
                "Use FQCN for module actions ({module})."
            )
        } else {
            return TaskMatch::Pass;
        };
        TaskMatch::Findings(vec![finding])
    }
}
