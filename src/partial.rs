use std::sync::OnceLock;

use crate::{ast::Node, config::Syntax, error::ParseError, parser::parse};

/// What a partial can be registered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartialSource {
    /// Template text, parsed the first time the partial is rendered.
    Text(String),
    /// An already parsed template.
    Ast(Vec<Node>),
}

impl From<&str> for PartialSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PartialSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Node>> for PartialSource {
    fn from(ast: Vec<Node>) -> Self {
        Self::Ast(ast)
    }
}

/// A registered partial. The parsed form is cached on first use and never
/// modified afterwards.
#[derive(Debug)]
pub(crate) struct Partial {
    text: Option<String>,
    ast: OnceLock<Result<Vec<Node>, ParseError>>,
}

impl Partial {
    pub(crate) fn new(source: PartialSource) -> Self {
        match source {
            PartialSource::Text(text) => Self {
                text: Some(text),
                ast: OnceLock::new(),
            },
            PartialSource::Ast(ast) => Self {
                text: None,
                ast: OnceLock::from(Ok(ast)),
            },
        }
    }

    pub(crate) fn ast(&self, name: &str, syntax: &Syntax) -> Result<&[Node], ParseError> {
        self.ast
            .get_or_init(|| {
                tracing::debug!(partial = name, "parsing partial");
                parse(self.text.as_deref().unwrap_or_default(), syntax)
            })
            .as_deref()
            .map_err(Clone::clone)
    }
}
