use thiserror::Error;

use crate::ast::Node;

pub type TagweaveResult<T> = std::result::Result<T, TagweaveError>;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A close tag for a block name that is not currently open.
    #[error("Unexpected close tag: {tag}")]
    UnexpectedClose { tag: String },
    #[error("Parser error: {0}")]
    Message(String),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("Parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    #[source]
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Builds an error positioned at byte `offset` of `input`.
    pub(crate) fn at(input: &str, offset: usize, kind: ParseErrorKind) -> Self {
        let before = input.get(..offset).unwrap_or(input);
        let line = before.matches('\n').count().saturating_add(1);
        let line_start = before.rfind('\n').map_or(0, |i| i.saturating_add(1));
        let column = before
            .get(line_start..)
            .map_or(0, |rest| rest.chars().count())
            .saturating_add(1);
        Self { line, column, kind }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagweaveError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Only raised when the engine runs in strict mode.
    #[error("Variable not found: {path}")]
    MissingVariable { path: String },
    /// A built-in helper could not make sense of its argument string.
    #[error("Invalid arguments for helper '{helper}': {reason} (in {})", tag_of(.node))]
    InvalidArguments {
        helper: String,
        reason: String,
        node: Box<Node>,
    },
    /// Raised by [`Engine::render_partial`](crate::Engine::render_partial)
    /// for names that were never registered.
    #[error("Partial not found: {name}")]
    MissingPartial { name: String },
    /// Free-form failure reported by a user helper.
    #[error("Rendering error: {message}")]
    Render { message: String },
}

impl TagweaveError {
    pub fn render<M: Into<String>>(message: M) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_arguments<H, R>(helper: H, reason: R, node: &Node) -> Self
    where
        H: Into<String>,
        R: Into<String>,
    {
        Self::InvalidArguments {
            helper: helper.into(),
            reason: reason.into(),
            node: Box::new(node.clone()),
        }
    }
}

fn tag_of(node: &Node) -> &str {
    match node {
        Node::Text { text } => text,
        Node::Variable { tag, .. }
        | Node::Raw { tag, .. }
        | Node::Partial { tag, .. }
        | Node::Helper { tag, .. }
        | Node::Close { tag, .. }
        | Node::Comment { tag, .. } => tag,
    }
}
