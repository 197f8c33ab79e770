//! Evaluation of every enabled rule against one document.
//!
//! Findings are filtered twice: task rules skip tasks whose attached
//! suppression list names them, and every finding is then checked against
//! the document's line map of marker comments.

use super::document::Document;
use crate::error::LintError;
use crate::finding;
use crate::rules::{Rule, TaskMatch};
use crate::types::{Finding, Severity};

pub const LOAD_FAILURE: &str = "load-failure";
pub const SCHEMA: &str = "schema";

/// Finding reported for a file the loader could not read as YAML.
pub fn load_failure(doc_path: &std::path::Path, err: &LintError) -> Finding {
    Finding {
        file: doc_path.to_path_buf(),
        line: 1,
        rule: LOAD_FAILURE,
        tag: LOAD_FAILURE.to_string(),
        severity: Severity::Error,
        message: err.to_string(),
    }
}

fn schema_failure(doc: &Document, message: String) -> Finding {
    Finding {
        file: doc.path.clone(),
        line: 1,
        rule: SCHEMA,
        tag: format!("{SCHEMA}[{}]", doc.kind),
        severity: Severity::Error,
        message,
    }
}

pub fn run_rules(doc: &Document, rules: &[Box<dyn Rule>]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for rule in rules {
        findings.extend(run_rule(doc, rule.as_ref()));
    }
    findings.retain(|f| !doc.line_skips.is_suppressed(f.line, &f.tag, f.rule));
    findings
}

fn run_rule(doc: &Document, rule: &dyn Rule) -> Vec<Finding> {
    let meta = rule.meta();
    let mut findings = Vec::new();

    match rule.match_yaml(doc) {
        Ok(found) => {
            let skipped = doc.data.skipped_rules();
            findings.extend(
                found
                    .into_iter()
                    .filter(|f| !skipped.iter().any(|s| *s == f.rule || *s == f.tag)),
            );
        }
        Err(LintError::Schema { message, .. }) => findings.push(schema_failure(doc, message)),
        Err(e) => tracing::error!("{}: {} failed: {e}", doc.path.display(), meta.id),
    }

    for play in doc.plays() {
        findings.extend(rule.match_play(play, doc));
    }

    for task in doc.tasks() {
        match rule.match_task(&task, doc) {
            TaskMatch::Pass => {}
            TaskMatch::Violation => {
                if !task.is_skipped(meta.id, meta.id) {
                    findings.push(finding!(meta, doc, task.line(), "{}", meta.description));
                }
            }
            TaskMatch::Findings(found) => findings.extend(
                found
                    .into_iter()
                    .filter(|f| !task.is_skipped(f.rule, &f.tag)),
            ),
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::rules::all_rules;
    use crate::types::FileKind;
    use std::path::PathBuf;

    fn lint(path: &str, text: &str) -> Vec<Finding> {
        let doc = Document::from_text(PathBuf::from(path), text.to_string(), None).unwrap();
        run_rules(&doc, &all_rules(&Config::default()).unwrap())
    }

    fn tags(findings: &[Finding]) -> Vec<(&str, usize)> {
        findings.iter().map(|f| (f.tag.as_str(), f.line)).collect()
    }

    #[test]
    fn test_task_level_noqa_suppresses_whole_task() {
        let text = "\
- name: install
  ansible.builtin.yum:  # noqa: package-latest
    name: httpd
    state: latest
";
        assert!(lint("tasks/main.yml", text).is_empty());
    }

    #[test]
    fn test_unsuppressed_violation_is_reported_at_task_line() {
        let text = "\
- name: ok
  ansible.builtin.debug:
    msg: hi
- name: install
  ansible.builtin.yum:
    name: httpd
    state: latest
";
        let findings = lint("tasks/main.yml", text);
        assert_eq!(tags(&findings), vec![("package-latest", 4)]);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].message, "Package installs should not use latest.");
    }

    #[test]
    fn test_line_noqa_without_list_suppresses_everything_on_line() {
        let text = "- yum: name=httpd state=latest  # noqa\n";
        assert!(lint("tasks/main.yml", text).is_empty());
    }

    #[test]
    fn test_skip_tag_suppresses_task_rules() {
        let text = "\
- name: install
  yum: name=httpd state=latest
  tags: [skip_ansible_lint]
";
        assert!(lint("tasks/main.yml", text).is_empty());
    }

    #[test]
    fn test_sub_tag_suppression_is_specific() {
        let text = "\
- name: facts
  ansible.builtin.set_fact:  # noqa: var-naming[no-role-prefix]
    Bad: 1
";
        let findings = lint("roles/web/tasks/main.yml", text);
        assert_eq!(tags(&findings), vec![("var-naming[pattern]", 1)]);
    }

    #[test]
    fn test_outdated_tag_in_comment_still_suppresses() {
        let text = "- ansible.builtin.yum: name=httpd state=latest  # noqa: 403\n";
        assert!(lint("tasks/main.yml", text).is_empty());
    }

    #[test]
    fn test_vars_file_noqa_applies_to_whole_document() {
        let text = "good_name: 1\nBadName: 2  # noqa: var-naming\nAlsoBad: 3\n";
        assert!(lint("group_vars/all.yml", text).is_empty());
    }

    #[test]
    fn test_noqa_after_quoted_task_name() {
        let text = "\
- name: \"Install httpd\"  # noqa: package-latest
  ansible.builtin.yum:
    name: httpd
    state: latest
";
        assert!(lint("tasks/main.yml", text).is_empty());
    }

    #[test]
    fn test_noqa_after_quoted_module_arg() {
        let text = "\
- name: install
  ansible.builtin.yum:
    name: 'httpd'
    state: \"latest\"  # noqa: package-latest
";
        assert!(lint("tasks/main.yml", text).is_empty());
    }

    #[test]
    fn test_noqa_after_quoted_vars_value_covers_document() {
        let text = "web_port: \"80\"  # noqa: var-naming\nBad: 1\n";
        assert!(lint("group_vars/all.yml", text).is_empty());
    }

    #[test]
    fn test_schema_error_becomes_finding() {
        let findings = lint("group_vars/all.yml", "- a\n- b\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, SCHEMA);
        assert_eq!(findings[0].tag, format!("schema[{}]", FileKind::Vars));
        assert_eq!(findings[0].severity, Severity::Error);
    }

    #[test]
    fn test_playbook_task_suppression() {
        let text = "\
- hosts: all
  tasks:
    - name: restart
      ansible.builtin.service:
        name: x
        state: restarted
      when: result.changed  # noqa: no-handler
    - name: install
      ansible.builtin.yum:
        name: httpd
        state: latest
";
        assert_eq!(tags(&lint("site.yml", text)), vec![("package-latest", 8)]);
    }

    #[test]
    fn test_load_failure_finding() {
        let err = LintError::Parse("bad".to_string());
        let f = load_failure(std::path::Path::new("x.yml"), &err);
        assert_eq!(f.rule, LOAD_FAILURE);
        assert_eq!(f.line, 1);
        assert!(f.message.contains("bad"));
    }
}
