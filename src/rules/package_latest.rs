use super::{Rule, RuleMeta, TaskMatch};
use crate::engine::document::Document;
use crate::parser::task::Task;
use crate::parser::types::Node;
use crate::types::Severity;

pub const META: RuleMeta = RuleMeta {
    id: "package-latest",
    description: "Package installs should not use latest.",
    severity: Severity::Warning,
    tags: &["idempotency"],
    sub_ids: &[],
};

const PACKAGE_MANAGERS: &[&str] = &[
    "apk",
    "apt",
    "bower",
    "bundler",
    "dnf",
    "easy_install",
    "gem",
    "homebrew",
    "jenkins_plugin",
    "npm",
    "openbsd_package",
    "openbsd_pkg",
    "package",
    "pacman",
    "pear",
    "pip",
    "pkg5",
    "pkgutil",
    "portage",
    "slackpkg",
    "sorcery",
    "swdepot",
    "win_chocolatey",
    "yarn",
    "yum",
    "zypper",
];

/// Any of these makes `state: latest` a deliberate, bounded upgrade.
const PINNING_ARGS: &[&str] = &["version", "update_only", "only_upgrade", "download_only"];

pub struct PackageLatestRule;

impl Rule for PackageLatestRule {
    fn meta(&self) -> &'static RuleMeta {
        &META
    }

    fn match_task(&self, task: &Task<'_>, _doc: &Document) -> TaskMatch {
        let action = &task.action;
        let violates = PACKAGE_MANAGERS.contains(&action.module.as_str())
            && !PINNING_ARGS.iter().any(|arg| action.arg_is_truthy(arg))
            && action.arg("state").and_then(Node::as_str) == Some("latest");
        if violates {
            TaskMatch::Violation
        } else {
            TaskMatch::Pass
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn check(text: &str) -> TaskMatch {
        let doc = Document::from_text(PathBuf::from("tasks/main.yml"), text.to_string(), None)
            .unwrap();
        let tasks = doc.tasks();
        PackageLatestRule.match_task(&tasks[0], &doc)
    }

    #[test]
    fn test_yum_latest_is_violation() {
        let result = check("- name: install\n  yum:\n    name: httpd\n    state: latest\n");
        assert_eq!(result, TaskMatch::Violation);
    }

    #[test]
    fn test_version_pin_passes() {
        let result = check(
            "- name: install\n  yum:\n    name: httpd\n    state: latest\n    version: \"1.2\"\n",
        );
        assert_eq!(result, TaskMatch::Pass);
    }

    #[test]
    fn test_upgrade_flags_pass() {
        for flag in ["update_only", "only_upgrade", "download_only"] {
            let text = format!("- apt:\n    name: curl\n    state: latest\n    {flag}: true\n");
            assert_eq!(check(&text), TaskMatch::Pass, "{flag} should exempt the task");
        }
    }

    #[test]
    fn test_false_flag_does_not_exempt() {
        let result = check("- apt:\n    name: curl\n    state: latest\n    only_upgrade: false\n");
        assert_eq!(result, TaskMatch::Violation);
    }

    #[test]
    fn test_fqcn_and_free_form() {
        assert_eq!(
            check("- ansible.builtin.dnf: name=vim state=latest\n"),
            TaskMatch::Violation
        );
        assert_eq!(
            check("- community.general.homebrew:\n    name: jq\n    state: latest\n"),
            TaskMatch::Violation
        );
    }

    #[test]
    fn test_present_and_other_modules_pass() {
        assert_eq!(check("- yum: name=httpd state=present\n"), TaskMatch::Pass);
        assert_eq!(check("- git: repo=x dest=y state=latest\n"), TaskMatch::Pass);
        assert_eq!(check("- yum: name=httpd\n"), TaskMatch::Pass);
    }
}
