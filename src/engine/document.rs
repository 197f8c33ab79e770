use std::path::{Component, Path, PathBuf};

use super::attach::append_skipped_rules;
use super::correlate::{flatten_tasks, FlatTask};
use super::suppress::{extract_line_skips, SuppressionMap};
use crate::error::LintError;
use crate::parser::task::{Task, PLAYBOOK_TASK_KEYWORDS};
use crate::parser::types::Node;
use crate::parser::{comments, load};
use crate::types::FileKind;

const VARS_DIRS: &[&str] = &["vars", "defaults", "group_vars", "host_vars"];
const PLAY_MARKERS: &[&str] = &[
    "hosts",
    "import_playbook",
    "ansible.builtin.import_playbook",
];

/// One YAML file ready for rule evaluation: its semantic tree with
/// suppression lists attached, and the line map of marker comments.
#[derive(Debug)]
pub struct Document {
    /// Path as reported in findings.
    pub path: PathBuf,
    pub kind: FileKind,
    pub text: String,
    /// Name of the role that owns this file, if any.
    pub role: Option<String>,
    pub data: Node,
    pub line_skips: SuppressionMap,
}

impl Document {
    pub fn read(path: &Path, root: &Path) -> Result<Self, LintError> {
        let text = std::fs::read_to_string(path)?;
        let display = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let mut doc = Self::from_text(display, text, None)?;
        // The scan root may sit inside a role, which hides `roles/<name>`
        // from the display path.
        let full = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        doc.role = role_of(&full);
        Ok(doc)
    }

    /// Build a document from already loaded text. `kind` overrides detection.
    pub fn from_text(
        path: PathBuf,
        text: String,
        kind: Option<FileKind>,
    ) -> Result<Self, LintError> {
        let mut data = load(&text)?;
        let kind = kind.unwrap_or_else(|| FileKind::detect(&path, &data));
        let tree = comments::parse(&text)?;
        let line_skips = extract_line_skips(&tree, &path);
        append_skipped_rules(&mut data, &tree, kind, &path);

        Ok(Self {
            role: role_of(&path),
            path,
            kind,
            text,
            data,
            line_skips,
        })
    }

    /// Every task of the document, nested ones before their container.
    pub fn tasks(&self) -> Vec<Task<'_>> {
        match self.kind {
            FileKind::Tasks | FileKind::Handlers => {
                let handler = self.kind == FileKind::Handlers;
                flat(self.data.as_sequence().unwrap_or_default())
                    .into_iter()
                    .filter_map(|node| Task::new(node, handler))
                    .collect()
            }
            FileKind::Playbook => self
                .plays()
                .into_iter()
                .flat_map(|play| {
                    PLAYBOOK_TASK_KEYWORDS.iter().flat_map(move |key| {
                        let items = play
                            .get(key)
                            .and_then(Node::as_sequence)
                            .unwrap_or_default();
                        flat(items)
                            .into_iter()
                            .filter_map(move |node| Task::new(node, *key == "handlers"))
                    })
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Play mappings of a playbook.
    pub fn plays(&self) -> Vec<&Node> {
        if self.kind != FileKind::Playbook {
            return Vec::new();
        }
        self.data
            .as_sequence()
            .unwrap_or_default()
            .iter()
            .filter(|play| play.is_mapping())
            .collect()
    }
}

fn flat(items: &[Node]) -> Vec<&Node> {
    let blocks = items
        .iter()
        .map(|node| FlatTask {
            path: Vec::new(),
            node,
        })
        .collect();
    flatten_tasks(blocks).into_iter().map(|t| t.node).collect()
}

fn dir_names(path: &Path) -> Vec<&str> {
    path.parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .collect()
}

/// The directory name that follows `roles/` in `path`.
pub fn role_of(path: &Path) -> Option<String> {
    let dirs = dir_names(path);
    dirs.iter()
        .rposition(|d| *d == "roles")
        .and_then(|idx| dirs.get(idx + 1))
        .map(|name| name.to_string())
}

impl FileKind {
    /// Classify a file by where it lives, then by what it contains.
    pub fn detect(path: &Path, data: &Node) -> FileKind {
        let stem = path.file_stem().and_then(|s| s.to_str());
        for dir in dir_names(path).into_iter().rev() {
            match dir {
                "tasks" => return FileKind::Tasks,
                "handlers" => return FileKind::Handlers,
                "meta" if stem == Some("main") => return FileKind::Meta,
                d if VARS_DIRS.contains(&d) => return FileKind::Vars,
                _ => {}
            }
        }

        if let Some(items) = data.as_sequence() {
            let is_play = |item: &Node| PLAY_MARKERS.iter().any(|k| item.get(k).is_some());
            if items.iter().any(is_play) {
                FileKind::Playbook
            } else {
                FileKind::YamlSequence
            }
        } else if data.is_mapping() {
            FileKind::Yaml
        } else {
            FileKind::Unsupported
        }
    }
}
