use std::path::Path;

use crate::types::{CheckResult, Finding, Severity};

/// Workflow commands end at a newline, so data must be percent-escaped.
fn escape_data(text: &str) -> String {
    text.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Property values additionally reserve `:` and `,`.
fn escape_property(text: &str) -> String {
    escape_data(text).replace(':', "%3A").replace(',', "%2C")
}

fn annotation(f: &Finding, project_root: &Path) -> String {
    let level = match f.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "notice",
    };
    format!(
        "::{level} file={file},line={line},title={title}::{message}",
        file = escape_property(&super::relative_path(&f.file, project_root)),
        line = f.line,
        title = escape_property(&f.tag),
        message = escape_data(&f.message),
    )
}

pub fn render(result: &CheckResult, project_root: &Path) {
    for f in &result.findings {
        println!("{}", annotation(f, project_root));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_annotation_format() {
        let f = Finding {
            file: PathBuf::from("tasks/main.yml"),
            line: 4,
            rule: "package-latest",
            tag: "package-latest".to_string(),
            severity: Severity::Warning,
            message: "Package installs should not use latest.".to_string(),
        };
        assert_eq!(
            annotation(&f, Path::new("/project")),
            "::warning file=tasks/main.yml,line=4,title=package-latest::Package installs should not use latest."
        );
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_data("50%\nnext"), "50%25%0Anext");
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
    }
}
