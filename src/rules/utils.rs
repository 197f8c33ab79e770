use regex::Regex;
use std::sync::LazyLock;

static JINJA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{[{%#].*[%#}]\}").unwrap());
static FQCN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+\.\w+\.\w+$").unwrap());
static FQCN_OR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+(\.\w+\.\w+)?$").unwrap());

/// Keywords of the expression language templates are evaluated in.
pub const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Whether `text` contains a template expression, statement or comment.
pub fn has_jinja(text: &str) -> bool {
    JINJA.is_match(text)
}

/// `namespace.collection.name`
pub fn is_fqcn(text: &str) -> bool {
    FQCN.is_match(text)
}

pub fn is_fqcn_or_name(text: &str) -> bool {
    FQCN_OR_NAME.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_jinja() {
        assert!(has_jinja("{{ item }}"));
        assert!(has_jinja("{% if x %}y{% endif %}"));
        assert!(has_jinja("{# note #}"));
        assert!(!has_jinja("plain_name"));
        assert!(!has_jinja("{ not: jinja }"));
    }

    #[test]
    fn test_is_fqcn() {
        assert!(is_fqcn("community.general.foo"));
        assert!(!is_fqcn("foo"));
        assert!(!is_fqcn("a.b"));
        assert!(!is_fqcn("a.b.c.d"));
    }

    #[test]
    fn test_is_fqcn_or_name() {
        assert!(is_fqcn_or_name("myrole"));
        assert!(is_fqcn_or_name("ns.coll.role"));
        assert!(!is_fqcn_or_name(""));
        assert!(!is_fqcn_or_name("roles/web"));
        assert!(!is_fqcn_or_name("a.b"));
    }

    #[test]
    fn test_keyword_lookup() {
        assert!(PYTHON_KEYWORDS.contains(&"class"));
        assert!(!PYTHON_KEYWORDS.contains(&"print"));
    }
}
