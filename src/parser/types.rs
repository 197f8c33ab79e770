/// A resolved YAML scalar.
///
/// Plain scalars are resolved the way playbook loaders read them (YAML 1.1
/// booleans included); quoted and block scalars are always strings. Numbers
/// keep their source spelling.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(String),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => n.parse::<f64>().map_or(true, |v| v != 0.0),
            Scalar::String(s) => !s.is_empty(),
        }
    }

    /// Source-like text of the scalar, used when comparing names across trees.
    pub fn text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) | Scalar::String(n) => n.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(Vec<Entry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Node,
    pub value: Node,
}

/// A node of the semantic (comment-free) tree.
///
/// `skipped_rules` is filled at most once, by the suppression attacher;
/// `None` means no suppression list was resolved for this node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub line: usize,
    pub value: Value,
    pub skipped_rules: Option<Vec<String>>,
}

/// One step from a node to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSeg {
    /// Index into a sequence.
    Item(usize),
    /// Index of a mapping entry; the step leads to the entry's value.
    Entry(usize),
}

pub type NodePath = Vec<PathSeg>;

impl Node {
    pub fn new(line: usize, value: Value) -> Self {
        Self {
            line,
            value,
            skipped_rules: None,
        }
    }

    pub fn null(line: usize) -> Self {
        Self::new(line, Value::Scalar(Scalar::Null))
    }

    pub fn string(line: usize, s: impl Into<String>) -> Self {
        Self::new(line, Value::Scalar(Scalar::String(s.into())))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match &self.value {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[Entry]> {
        match &self.value {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.value, Value::Mapping(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Scalar(Scalar::Null))
    }

    pub fn is_truthy(&self) -> bool {
        match &self.value {
            Value::Scalar(s) => s.is_truthy(),
            Value::Sequence(items) => !items.is_empty(),
            Value::Mapping(entries) => !entries.is_empty(),
        }
    }

    /// Index of the entry for `key`. Duplicate keys resolve to the last one,
    /// like a mapping loader would.
    pub fn entry_index(&self, key: &str) -> Option<usize> {
        self.as_mapping()?
            .iter()
            .rposition(|e| e.key.as_str() == Some(key))
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        let idx = self.entry_index(key)?;
        self.as_mapping().map(|entries| &entries[idx].value)
    }

    pub fn child_mut(&mut self, seg: PathSeg) -> Option<&mut Node> {
        match (&mut self.value, seg) {
            (Value::Sequence(items), PathSeg::Item(i)) => items.get_mut(i),
            (Value::Mapping(entries), PathSeg::Entry(i)) => entries.get_mut(i).map(|e| &mut e.value),
            _ => None,
        }
    }

    pub fn at_path_mut(&mut self, path: &[PathSeg]) -> Option<&mut Node> {
        path.iter()
            .try_fold(self, |node, &seg| node.child_mut(seg))
    }

    pub fn skipped_rules(&self) -> &[String] {
        self.skipped_rules.as_deref().unwrap_or_default()
    }
}
