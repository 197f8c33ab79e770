use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LintError {
    /// The raw text is not valid YAML.
    #[error("YAML parse error: {0}")]
    Parse(String),

    /// The semantic tree and the comment-preserving tree disagree about which
    /// task sits at a given position.
    #[error(
        "error in matching skip comment to a task at position {position}: \
         semantic name {semantic:?} != comment name {comment:?}"
    )]
    Correlation {
        position: usize,
        semantic: Option<String>,
        comment: Option<String>,
    },

    #[error("{}: {message}", path.display())]
    Schema { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
