pub mod comments;
pub mod task;
pub mod types;

use saphyr_parser::{Event, Parser, ScalarStyle, Span};
use std::collections::HashMap;

use crate::error::LintError;
use types::{Entry, Node, Scalar, Value};

pub(crate) type Events<'a> = Vec<(Event<'a>, Span)>;

pub(crate) fn collect_events(text: &str) -> Result<Events<'_>, LintError> {
    let mut events = Vec::new();
    for result in Parser::new_from_str(text) {
        let (event, span) = result.map_err(|e| LintError::Parse(e.to_string()))?;
        events.push((event, span));
    }
    Ok(events)
}

/// Resolve a scalar the way a YAML 1.1 loader does for plain scalars.
pub(crate) fn resolve_scalar(text: &str, style: &ScalarStyle) -> Scalar {
    if !matches!(style, ScalarStyle::Plain) {
        return Scalar::String(text.to_string());
    }
    match text {
        "" | "~" | "null" | "Null" | "NULL" => Scalar::Null,
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            Scalar::Bool(true)
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            Scalar::Bool(false)
        }
        _ if looks_numeric(text) => Scalar::Number(text.to_string()),
        _ => Scalar::String(text.to_string()),
    }
}

fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    if body.is_empty() {
        return false;
    }
    if let Some(hex) = body.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    body.parse::<f64>().is_ok() && body.chars().any(|c| c.is_ascii_digit())
}

/// Load `text` into the semantic tree used by rules.
///
/// An empty stream yields a null root; a multi-document stream yields a
/// sequence whose items are the document roots.
pub fn load(text: &str) -> Result<Node, LintError> {
    let events = collect_events(text)?;
    let mut docs = Loader::new(&events).stream();
    Ok(match docs.len() {
        0 => Node::null(1),
        1 => docs.remove(0),
        _ => Node::new(docs[0].line, Value::Sequence(docs)),
    })
}

struct Loader<'e> {
    events: &'e [(Event<'e>, Span)],
    pos: usize,
    anchors: HashMap<usize, Node>,
}

impl<'e> Loader<'e> {
    fn new(events: &'e [(Event<'e>, Span)]) -> Self {
        Self {
            events,
            pos: 0,
            anchors: HashMap::new(),
        }
    }

    fn stream(&mut self) -> Vec<Node> {
        let mut docs = Vec::new();
        let events = self.events;
        while let Some((event, _)) = events.get(self.pos) {
            self.pos += 1;
            match event {
                Event::DocumentStart(_) => {
                    if let Some(root) = self.node() {
                        docs.push(root);
                    }
                }
                Event::StreamEnd => break,
                _ => {}
            }
        }
        docs
    }

    fn node(&mut self) -> Option<Node> {
        let events = self.events;
        let (event, span) = events.get(self.pos)?;
        self.pos += 1;
        let line = span.start.line();

        let (node, anchor) = match event {
            Event::Scalar(text, style, anchor, _) => (
                Node::new(line, Value::Scalar(resolve_scalar(text, style))),
                *anchor,
            ),
            Event::SequenceStart(anchor, _) => {
                let mut items = Vec::new();
                while let Some((next, _)) = events.get(self.pos) {
                    if matches!(next, Event::SequenceEnd) {
                        self.pos += 1;
                        break;
                    }
                    items.extend(self.node());
                }
                (Node::new(line, Value::Sequence(items)), *anchor)
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
                    entries.push(Entry { key, value });
                }
                (Node::new(line, Value::Mapping(entries)), *anchor)
            }
            Event::Alias(id) => {
                let node = self
                    .anchors
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| Node::null(line));
                return Some(node);
            }
            // DocumentEnd and friends carry no content.
            _ => return None,
        };

        if anchor > 0 {
            self.anchors.insert(anchor, node.clone());
        }
        Some(node)
    }
}
