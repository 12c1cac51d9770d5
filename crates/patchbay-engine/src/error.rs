use patchbay_syntax::SplitError;

/// Every failure the engine can report.
///
/// Parse-side variants carry the statement index (0-based, in file order)
/// once it is known; codec-side variants carry a slash-separated path to the
/// offending element or JSON value.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("statement {statement} (line {line}): {message}")]
    MalformedLine {
        statement: usize,
        line: usize,
        message: String,
    },

    #[error("statement {statement}: unrecognized statement `{keyword}`")]
    UnrecognizedStatement { statement: usize, keyword: String },

    #[error(
        "{}dangling edge {from} -> {to} in canvas {canvas} ({len} nodes)",
        location(.statement)
    )]
    DanglingEdge {
        statement: Option<usize>,
        canvas: usize,
        from: usize,
        to: usize,
        len: usize,
    },

    #[error("{path}: unknown tag <{tag}>")]
    UnknownTag { path: String, tag: String },

    #[error("{path}: unknown type `{kind}`")]
    UnknownType { path: String, kind: String },

    #[error("{}{message}", location(.statement))]
    Argument {
        statement: Option<usize>,
        message: String,
    },

    #[error("malformed name {name:?}: {reason}")]
    MalformedName { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{path}: {message}")]
    Xml { path: String, message: String },

    #[error("snapshot error: {message}")]
    Snapshot { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PatchError>;

fn location(statement: &Option<usize>) -> String {
    match statement {
        Some(index) => format!("statement {index}: "),
        None => String::new(),
    }
}

impl PatchError {
    pub fn argument(message: impl Into<String>) -> Self {
        PatchError::Argument {
            statement: None,
            message: message.into(),
        }
    }

    /// Fill in the statement index on errors raised below the parser.
    pub fn at_statement(self, index: usize) -> Self {
        match self {
            PatchError::Argument {
                statement: None,
                message,
            } => PatchError::Argument {
                statement: Some(index),
                message,
            },
            PatchError::DanglingEdge {
                statement: None,
                canvas,
                from,
                to,
                len,
            } => PatchError::DanglingEdge {
                statement: Some(index),
                canvas,
                from,
                to,
                len,
            },
            other => other,
        }
    }
}

impl From<SplitError> for PatchError {
    fn from(error: SplitError) -> Self {
        match error {
            SplitError::MalformedLine {
                statement,
                line,
                message,
            } => PatchError::MalformedLine {
                statement,
                line,
                message,
            },
        }
    }
}
