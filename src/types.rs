use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// What a YAML file is, as far as rule evaluation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Tasks,
    Handlers,
    Playbook,
    Vars,
    Meta,
    /// A YAML mapping with no more specific meaning.
    Yaml,
    /// A YAML sequence with no more specific meaning.
    YamlSequence,
    Unsupported,
}

impl FileKind {
    /// Flat-structure kinds get a single suppression list on the document
    /// root instead of per-task lists.
    pub fn is_metadata_like(self) -> bool {
        matches!(
            self,
            FileKind::Vars | FileKind::Meta | FileKind::Yaml | FileKind::YamlSequence
        )
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FileKind::Tasks => "tasks",
            FileKind::Handlers => "handlers",
            FileKind::Playbook => "playbook",
            FileKind::Vars => "vars",
            FileKind::Meta => "meta",
            FileKind::Yaml => "yaml",
            FileKind::YamlSequence => "yaml-sequence",
            FileKind::Unsupported => "unsupported",
        })
    }
}

/// A single reported rule violation.
///
/// `tag` is either the bare rule id (`package-latest`) or a sub-tagged
/// variant of it (`var-naming[pattern]`); `rule` is always the bare id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub file: PathBuf,
    pub line: usize,
    pub rule: &'static str,
    pub tag: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct CheckResult {
    pub findings: Vec<Finding>,
}

impl CheckResult {
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Info)
            .count()
    }

    pub fn has_severity_at_least(&self, threshold: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn make_finding(severity: Severity) -> Finding {
        Finding {
            file: PathBuf::from("tasks/main.yml"),
            line: 1,
            rule: "package-latest",
            tag: "package-latest".to_string(),
            severity,
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Info < Severity::Error);
    }

    #[test]
    fn test_has_severity_at_least_warning_only() {
        let result = CheckResult {
            findings: vec![make_finding(Severity::Warning)],
        };
        assert!(!result.has_severity_at_least(Severity::Error));
        assert!(result.has_severity_at_least(Severity::Warning));
        assert!(result.has_severity_at_least(Severity::Info));
    }

    #[test]
    fn test_has_severity_at_least_empty() {
        let result = CheckResult::default();
        assert!(!result.has_severity_at_least(Severity::Info));
    }

    #[test]
    fn test_count_methods() {
        let result = CheckResult {
            findings: vec![
                make_finding(Severity::Error),
                make_finding(Severity::Warning),
                make_finding(Severity::Warning),
                make_finding(Severity::Info),
            ],
        };
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warning_count(), 2);
        assert_eq!(result.info_count(), 1);
    }

    #[test]
    fn test_file_kind_groups() {
        assert!(FileKind::Vars.is_metadata_like());
        assert!(FileKind::YamlSequence.is_metadata_like());
        assert!(!FileKind::Tasks.is_metadata_like());
        assert!(!FileKind::Unsupported.is_metadata_like());
    }

    #[test]
    fn test_finding_serialization() {
        let json = serde_json::to_value(make_finding(Severity::Error)).unwrap();
        assert_eq!(json["tag"], "package-latest");
        assert_eq!(json["severity"], "error");
        assert_eq!(json["line"], 1);
    }

    #[test]
    fn test_severity_deserialize_invalid() {
        let result: Result<Severity, _> = serde_json::from_str(r#""critical""#);
        assert!(result.is_err());
    }
}
