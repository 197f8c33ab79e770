pub mod fqcn;
pub mod macros;
pub mod no_handler;
pub mod package_latest;
pub mod utils;
pub mod var_naming;

use anyhow::Result;

use crate::config::Config;
use crate::engine::document::Document;
use crate::error::LintError;
use crate::parser::task::Task;
use crate::parser::types::Node;
use crate::types::{Finding, Severity};

/// Static description of a rule.
#[derive(Debug)]
pub struct RuleMeta {
    pub id: &'static str,
    /// One-line summary, also the message of plain violations.
    pub description: &'static str,
    pub severity: Severity,
    pub tags: &'static [&'static str],
    /// Sub-tags this rule reports (`id[sub]`) with their own descriptions.
    pub sub_ids: &'static [(&'static str, &'static str)],
}

impl RuleMeta {
    pub fn tag(&self, sub: &str) -> String {
        format!("{}[{sub}]", self.id)
    }

    pub fn describe(&self, tag: &str) -> Option<&'static str> {
        if tag == self.id {
            return Some(self.description);
        }
        self.sub_ids
            .iter()
            .find(|(sub, _)| *sub == tag)
            .map(|(_, desc)| *desc)
    }
}

/// Result of checking one task.
#[derive(Debug, PartialEq)]
pub enum TaskMatch {
    Pass,
    /// Report the rule's own id and description at the task's line.
    Violation,
    Findings(Vec<Finding>),
}

/// A lint rule. Each capability defaults to reporting nothing.
pub trait Rule: Send + Sync {
    fn meta(&self) -> &'static RuleMeta;

    /// Called for every task, nested ones included.
    fn match_task(&self, _task: &Task<'_>, _doc: &Document) -> TaskMatch {
        TaskMatch::Pass
    }

    /// Called for every play mapping of a playbook.
    fn match_play(&self, _play: &Node, _doc: &Document) -> Vec<Finding> {
        Vec::new()
    }

    /// Called once per document.
    fn match_yaml(&self, _doc: &Document) -> Result<Vec<Finding>, LintError> {
        Ok(Vec::new())
    }
}

/// Metadata of every rule, enabled or not.
pub const CATALOG: &[&RuleMeta] = &[
    &fqcn::META,
    &no_handler::META,
    &package_latest::META,
    &var_naming::META,
];

pub fn find_meta(id: &str) -> Option<&'static RuleMeta> {
    CATALOG.iter().copied().find(|meta| meta.id == id)
}

pub fn all_rules(config: &Config) -> Result<Vec<Box<dyn Rule>>> {
    let mut rules: Vec<Box<dyn Rule>> = Vec::new();

    if config.rules.fqcn.enabled {
        rules.push(Box::new(fqcn::FqcnRule));
    }
    if config.rules.no_handler.enabled {
        rules.push(Box::new(no_handler::NoHandlerRule));
    }
    if config.rules.package_latest.enabled {
        rules.push(Box::new(package_latest::PackageLatestRule));
    }
    if config.rules.var_naming.enabled {
        rules.push(Box::new(var_naming::VarNamingRule::new(
            &config.rules.var_naming.pattern,
        )?));
    }

    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique_and_sub_ids_prefixed() {
        let mut ids: Vec<_> = CATALOG.iter().map(|m| m.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
        for meta in CATALOG {
            for (sub, _) in meta.sub_ids {
                assert!(
                    sub.starts_with(&format!("{}[", meta.id)) && sub.ends_with(']'),
                    "{sub} should be a sub-tag of {}",
                    meta.id
                );
            }
        }
    }

    #[test]
    fn test_all_rules_respects_enabled_flags() {
        let mut config = Config::default();
        assert_eq!(all_rules(&config).unwrap().len(), CATALOG.len());

        config.rules.fqcn.enabled = false;
        config.rules.no_handler.enabled = false;
        let ids: Vec<_> = all_rules(&config)
            .unwrap()
            .iter()
            .map(|r| r.meta().id)
            .collect();
        assert_eq!(ids, vec!["package-latest", "var-naming"]);
    }

    #[test]
    fn test_invalid_naming_pattern_is_an_error() {
        let mut config = Config::default();
        config.rules.var_naming.pattern = "([".to_string();
        assert!(all_rules(&config).is_err());
    }

    #[test]
    fn test_describe_sub_tag() {
        let meta = find_meta("var-naming").unwrap();
        assert_eq!(meta.tag("pattern"), "var-naming[pattern]");
        assert!(meta.describe("var-naming[read-only]").is_some());
        assert_eq!(meta.describe("var-naming"), Some(meta.description));
        assert!(meta.describe("var-naming[bogus]").is_none());
    }
}
