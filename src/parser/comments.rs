//! Comment-preserving parse of a YAML document.
//!
//! The semantic loader in [`crate::parser::load`] throws comments away. This
//! module parses the same text a second time into a [`CommentTree`] whose
//! collection nodes carry the comment tokens that fall inside them, with
//! 1-based source lines. A comment belongs to the innermost collection whose
//! line range contains it; a collection's range runs from its first line up
//! to the line before its next sibling starts, so a comment line sitting
//! between two tasks belongs to the task above it.
//!
//! Parsed trees are memoized per exact text: every rule that needs comment
//! data for a file hits the same entry, and text never changes once loaded.

use regex::Regex;
use saphyr_parser::{Event, ScalarStyle, Span};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::{Arc, LazyLock, RwLock};

use super::types::Scalar;
use super::{collect_events, resolve_scalar};
use crate::error::LintError;

static PARSE_CACHE: LazyLock<RwLock<HashMap<String, Arc<CommentTree>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|>][0-9+-]*\s*(#.*)?$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    pub line: usize,
    pub column: usize,
    /// Comment text starting at `#`, without the line break.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentValue {
    Scalar(Scalar),
    Sequence(Vec<CommentNode>),
    Mapping(Vec<CommentEntry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentEntry {
    pub key: CommentNode,
    pub value: CommentNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub line: usize,
    pub value: CommentValue,
    pub comments: Vec<CommentToken>,
}

impl CommentNode {
    fn new(line: usize, value: CommentValue) -> Self {
        Self {
            line,
            value,
            comments: Vec::new(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            CommentValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[CommentNode]> {
        match &self.value {
            CommentValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        !matches!(self.value, CommentValue::Scalar(_))
    }

    pub fn get(&self, key: &str) -> Option<&CommentNode> {
        match &self.value {
            CommentValue::Mapping(entries) => entries
                .iter()
                .rev()
                .find(|e| e.key.as_scalar().and_then(Scalar::as_str) == Some(key))
                .map(|e| &e.value),
            _ => None,
        }
    }

    /// Direct collection children, paired with the line their entry starts on.
    fn children(&self) -> Vec<(usize, &CommentNode)> {
        match &self.value {
            CommentValue::Mapping(entries) => {
                entries.iter().map(|e| (e.key.line, &e.value)).collect()
            }
            CommentValue::Sequence(items) => items.iter().map(|i| (i.line, i)).collect(),
            CommentValue::Scalar(_) => Vec::new(),
        }
    }

    fn child_mut(&mut self, idx: usize) -> Option<&mut CommentNode> {
        match &mut self.value {
            CommentValue::Mapping(entries) => entries.get_mut(idx).map(|e| &mut e.value),
            CommentValue::Sequence(items) => items.get_mut(idx),
            CommentValue::Scalar(_) => None,
        }
    }

    /// Which child (if any) owns a comment on `line`, given that this node
    /// owns lines up to `hi`.
    fn owning_child(&self, line: usize, hi: usize) -> Option<(usize, usize)> {
        let children = self.children();
        children.iter().enumerate().find_map(|(idx, (_, child))| {
            let child_hi = children
                .get(idx + 1)
                .map_or(hi, |(next_start, _)| next_start.saturating_sub(1));
            (child.is_collection() && child.line <= line && line <= child_hi)
                .then_some((idx, child_hi))
        })
    }

    fn place(&mut self, hi: usize, token: CommentToken) {
        match self.owning_child(token.line, hi) {
            Some((idx, child_hi)) => match self.child_mut(idx) {
                Some(child) => child.place(child_hi, token),
                None => self.comments.push(token),
            },
            None => self.comments.push(token),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentTree {
    pub lines: Vec<String>,
    pub documents: Vec<CommentNode>,
}

impl CommentTree {
    /// Parse without consulting the cache.
    pub fn from_text(text: &str) -> Result<Self, LintError> {
        let events = collect_events(text)?;
        let lines: Vec<String> = text.split('\n').map(String::from).collect();

        let mut builder = Builder::new(&events, &lines);
        let mut documents = builder.stream();
        let comments = scan_comments(&lines, &builder.quoted, &builder.block_lines);

        for token in comments {
            let idx = documents
                .iter()
                .rposition(|d| d.line <= token.line)
                .unwrap_or(0);
            let hi = documents
                .get(idx + 1)
                .map_or(usize::MAX, |next| next.line.saturating_sub(1));
            if let Some(doc) = documents.get_mut(idx) {
                doc.place(hi, token);
            }
        }

        Ok(Self { lines, documents })
    }

    /// The single document root, or `None` for empty and multi-document
    /// streams.
    pub fn root(&self) -> Option<&CommentNode> {
        match self.documents.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }
}

/// Parse `text` into a comment tree, reusing an earlier parse of identical
/// text when there is one.
pub fn parse(text: &str) -> Result<Arc<CommentTree>, LintError> {
    if let Some(tree) = PARSE_CACHE
        .read()
        .ok()
        .and_then(|cache| cache.get(text).cloned())
    {
        return Ok(tree);
    }

    let tree = Arc::new(CommentTree::from_text(text)?);
    match PARSE_CACHE.write() {
        Ok(mut cache) => Ok(Arc::clone(
            cache.entry(text.to_string()).or_insert(tree),
        )),
        Err(_) => Ok(tree),
    }
}

struct Builder<'e> {
    events: &'e [(Event<'e>, Span)],
    lines: &'e [String],
    /// The source as chars; saphyr span indices count chars.
    source: Vec<char>,
    pos: usize,
    anchors: HashMap<usize, CommentNode>,
    /// Char ranges of quoted scalars; a `#` inside them is content.
    quoted: Vec<Range<usize>>,
    /// Lines that belong to the body of a block scalar.
    block_lines: HashSet<usize>,
}

impl<'e> Builder<'e> {
    fn new(events: &'e [(Event<'e>, Span)], lines: &'e [String]) -> Self {
        Self {
            events,
            lines,
            source: lines.join("\n").chars().collect(),
            pos: 0,
            anchors: HashMap::new(),
            quoted: Vec::new(),
            block_lines: HashSet::new(),
        }
    }

    fn stream(&mut self) -> Vec<CommentNode> {
        let mut docs = Vec::new();
        let events = self.events;
        while let Some((event, _)) = events.get(self.pos) {
            self.pos += 1;
            match event {
                Event::DocumentStart(_) => docs.extend(self.node()),
                Event::StreamEnd => break,
                _ => {}
            }
        }
        docs
    }

    fn node(&mut self) -> Option<CommentNode> {
        let events = self.events;
        let (event, span) = events.get(self.pos)?;
        self.pos += 1;
        let line = span.start.line();

        let (node, anchor) = match event {
            Event::Scalar(text, style, anchor, _) => {
                self.mask_scalar(style, span);
                (
                    CommentNode::new(line, CommentValue::Scalar(resolve_scalar(text, style))),
                    *anchor,
                )
            }
            Event::SequenceStart(anchor, _) => {
                let mut items = Vec::new();
                while let Some((next, _)) = events.get(self.pos) {
                    if matches!(next, Event::SequenceEnd) {
                        self.pos += 1;
                        break;
                    }
                    items.extend(self.node());
                }
                (CommentNode::new(line, CommentValue::Sequence(items)), *anchor)
            }
            Event::MappingStart(anchor, _) => {
                let mut entries = Vec::new();
                while let Some((next, _)) = events.get(self.pos) {
                    if matches!(next, Event::MappingEnd) {
                        self.pos += 1;
                        break;
                    }
                    let (Some(key), Some(value)) = (self.node(), self.node()) else {
                        break;
                    };
                    entries.push(CommentEntry { key, value });
                }
                (CommentNode::new(line, CommentValue::Mapping(entries)), *anchor)
            }
            Event::Alias(id) => {
                let node = self.anchors.get(id).cloned().unwrap_or_else(|| {
                    CommentNode::new(line, CommentValue::Scalar(Scalar::Null))
                });
                return Some(node);
            }
            _ => return None,
        };

        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        Some(node)
    }

    fn mask_scalar(&mut self, style: &ScalarStyle, span: &Span) {
        match style {
            ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
                if let Some(range) = self.quoted_range(style, span) {
                    self.quoted.push(range);
                }
            }
            ScalarStyle::Literal | ScalarStyle::Folded => {
                let start = span.start.line();
                let header_is_start = self
                    .lines
                    .get(start.saturating_sub(1))
                    .is_some_and(|l| BLOCK_HEADER.is_match(l));
                let first_body = if header_is_start { start + 1 } else { start };
                let header_indent = if header_is_start {
                    self.lines
                        .get(start.saturating_sub(1))
                        .map_or(0, |l| indent_of(l))
                } else {
                    0
                };
                self.mask_block_body(first_body, header_indent, !header_is_start);
            }
            _ => {}
        }
    }

    /// Char range of a quoted scalar, delimiters included. The span end
    /// reported for quoted scalars can run past the closing quote into a
    /// trailing comment, so the closing delimiter is found in the source.
    fn quoted_range(&self, style: &ScalarStyle, span: &Span) -> Option<Range<usize>> {
        let quote = match style {
            ScalarStyle::DoubleQuoted => '"',
            ScalarStyle::SingleQuoted => '\'',
            _ => return None,
        };
        let start = span.start.index();
        let open = if self.source.get(start) == Some(&quote) {
            start
        } else {
            (start.saturating_sub(5)..start)
                .rev()
                .find(|&i| self.source.get(i) == Some(&quote))?
        };

        let mut i = open + 1;
        while let Some(&c) = self.source.get(i) {
            match c {
                '\\' if quote == '"' => i += 2,
                '\'' if quote == '\'' && self.source.get(i + 1) == Some(&'\'') => i += 2,
                c if c == quote => return Some(open..i + 1),
                _ => i += 1,
            }
        }
        Some(open..self.source.len())
    }

    /// Mark the body lines of a block scalar. The body ends at the first
    /// non-blank line indented less than the first body line.
    fn mask_block_body(&mut self, first_body: usize, header_indent: usize, any_indent: bool) {
        let mut body_indent = None;
        for line_no in first_body..=self.lines.len() {
            let line = &self.lines[line_no - 1];
            if line.trim().is_empty() {
                continue;
            }
            let indent = indent_of(line);
            let required = match body_indent {
                Some(required) => required,
                None if any_indent || indent > header_indent => {
                    body_indent = Some(indent);
                    indent
                }
                None => break,
            };
            if indent < required {
                break;
            }
            self.block_lines.insert(line_no);
        }
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Find every comment in the source. A `#` opens a comment at the start of a
/// line or after whitespace, unless it sits inside a quoted scalar or a block
/// scalar body.
fn scan_comments(
    lines: &[String],
    quoted: &[Range<usize>],
    block_lines: &HashSet<usize>,
) -> Vec<CommentToken> {
    let mut sorted = quoted.to_vec();
    sorted.sort_by_key(|r| r.start);
    let in_quoted = |idx: usize| {
        let p = sorted.partition_point(|r| r.end <= idx);
        sorted.get(p).is_some_and(|r| r.start <= idx)
    };

    let mut tokens = Vec::new();
    let mut offset = 0;
    for (i, line) in lines.iter().enumerate() {
        let line_no = i + 1;
        let chars: Vec<char> = line.chars().collect();
        if !block_lines.contains(&line_no) {
            for (col, &c) in chars.iter().enumerate() {
                let opens = c == '#' && (col == 0 || chars[col - 1].is_whitespace());
                if opens && !in_quoted(offset + col) {
                    let text: String = chars[col..].iter().collect();
                    tokens.push(CommentToken {
                        line: line_no,
                        column: col + 1,
                        text: text.trim_end().to_string(),
                    });
                    break;
                }
            }
        }
        offset += chars.len() + 1;
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_comments(node: &CommentNode, out: &mut Vec<(usize, String)>) {
        out.extend(node.comments.iter().map(|c| (c.line, c.text.clone())));
        match &node.value {
            CommentValue::Mapping(entries) => {
                entries.iter().for_each(|e| all_comments(&e.value, out))
            }
            CommentValue::Sequence(items) => items.iter().for_each(|i| all_comments(i, out)),
            CommentValue::Scalar(_) => {}
        }
    }

    #[test]
    fn test_trailing_comment_attaches_to_task() {
        let text = "- name: one  # noqa: fqcn\n  ping:\n- name: two\n  ping:\n";
        let tree = CommentTree::from_text(text).unwrap();
        let tasks = tree.root().unwrap().as_sequence().unwrap();
        assert_eq!(tasks[0].comments.len(), 1);
        assert_eq!(tasks[0].comments[0].line, 1);
        assert_eq!(tasks[0].comments[0].text, "# noqa: fqcn");
        assert!(tasks[1].comments.is_empty());
    }

    #[test]
    fn test_comment_between_tasks_belongs_to_previous_task() {
        let text = "- name: one\n  ping:\n# noqa: fqcn\n- name: two\n  ping:\n";
        let tree = CommentTree::from_text(text).unwrap();
        let tasks = tree.root().unwrap().as_sequence().unwrap();
        assert_eq!(tasks[0].comments.len(), 1);
        assert_eq!(tasks[0].comments[0].line, 3);
        assert!(tasks[1].comments.is_empty());
    }

    #[test]
    fn test_nested_comment_goes_to_innermost_collection() {
        let text = "- name: outer\n  block:\n    - name: inner\n      ping:  # noqa fqcn\n";
        let tree = CommentTree::from_text(text).unwrap();
        let outer = &tree.root().unwrap().as_sequence().unwrap()[0];
        assert!(outer.comments.is_empty());
        let inner = &outer.get("block").unwrap().as_sequence().unwrap()[0];
        assert_eq!(inner.comments.len(), 1);
        assert_eq!(inner.comments[0].line, 4);
    }

    #[test]
    fn test_hash_inside_quotes_is_not_a_comment() {
        let text = "msg: \"a # b\"\nother: 'c # d'  # real\n";
        let tree = CommentTree::from_text(text).unwrap();
        let mut found = Vec::new();
        all_comments(tree.root().unwrap(), &mut found);
        assert_eq!(found, vec![(2, "# real".to_string())]);
    }

    #[test]
    fn test_comment_after_quoted_value_is_kept() {
        let text = "- name: \"Install httpd\"  # noqa: package-latest\n  yum:\n    state: \"latest\"  # noqa: fqcn\n";
        let tree = CommentTree::from_text(text).unwrap();
        let mut found = Vec::new();
        all_comments(tree.root().unwrap(), &mut found);
        assert_eq!(
            found,
            vec![
                (1, "# noqa: package-latest".to_string()),
                (3, "# noqa: fqcn".to_string()),
            ]
        );
    }

    #[test]
    fn test_escaped_quotes_stay_inside_scalar() {
        let text = "a: \"x \\\" # no\"  # yes\nb: 'it''s # no'  # also\n";
        let tree = CommentTree::from_text(text).unwrap();
        let mut found = Vec::new();
        all_comments(tree.root().unwrap(), &mut found);
        assert_eq!(
            found,
            vec![(1, "# yes".to_string()), (2, "# also".to_string())]
        );
    }

    #[test]
    fn test_hash_without_space_is_not_a_comment() {
        let tree = CommentTree::from_text("url: http://x/#anchor\n").unwrap();
        let mut found = Vec::new();
        all_comments(tree.root().unwrap(), &mut found);
        assert!(found.is_empty());
    }

    #[test]
    fn test_block_scalar_body_is_not_scanned() {
        let text = "- name: sh\n  shell: |\n    echo hi # noqa: fqcn\n  # noqa: no-handler\n  register: out\n";
        let tree = CommentTree::from_text(text).unwrap();
        let mut found = Vec::new();
        all_comments(tree.root().unwrap(), &mut found);
        assert_eq!(found, vec![(4, "# noqa: no-handler".to_string())]);
    }

    #[test]
    fn test_header_comment_goes_to_root() {
        let text = "# noqa: var-naming\nfoo: 1\n";
        let tree = CommentTree::from_text(text).unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.comments.len(), 1);
        assert_eq!(root.comments[0].line, 1);
    }

    #[test]
    fn test_duplicate_keys_are_preserved() {
        let tree = CommentTree::from_text("a: 1\na: 2\n").unwrap();
        match &tree.root().unwrap().value {
            CommentValue::Mapping(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected mapping, got {other:?}"),
        }
    }

    #[test]
    fn test_multi_document_has_no_single_root() {
        let tree = CommentTree::from_text("---\na: 1  # noqa x\n---\nb: 2\n").unwrap();
        assert_eq!(tree.documents.len(), 2);
        assert!(tree.root().is_none());
        assert_eq!(tree.documents[0].comments.len(), 1);
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        assert!(matches!(
            CommentTree::from_text("a: b: c\n"),
            Err(LintError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_is_cached_per_text() {
        let text = "- name: cached-tree-test\n  ping:\n";
        let first = parse(text).unwrap();
        let second = parse(text).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
