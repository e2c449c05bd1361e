use serde_json::Value;

use crate::ast::Node;
use crate::engine::Engine;
use crate::error::TagweaveResult;

/// A template parsed by [`Engine::compile`], bound to the engine whose
/// helpers and partials it renders with.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tagweave::Engine;
///
/// let engine = Engine::new();
/// let template = engine.compile("{{#each items}}{{this}};{{/each}}").unwrap();
///
/// assert_eq!(template.render(&json!({"items": [1, 2]})).unwrap(), "1;2;");
/// assert_eq!(template.render(&json!({"items": []})).unwrap(), "");
/// ```
#[derive(Debug, Clone)]
pub struct Template<'e> {
    engine: &'e Engine,
    ast: Vec<Node>,
}

impl<'e> Template<'e> {
    pub(crate) const fn new(engine: &'e Engine, ast: Vec<Node>) -> Self {
        Self { engine, ast }
    }

    /// Renders against a private copy of `data`, so assignments made by the
    /// template never reach the caller.
    ///
    /// # Errors
    /// Any error [`Engine::execute`] can return.
    pub fn render(&self, data: &Value) -> TagweaveResult<String> {
        let mut data = data.clone();
        self.engine.execute(&self.ast, &mut data)
    }

    pub fn ast(&self) -> &[Node] {
        &self.ast
    }

    pub fn into_ast(self) -> Vec<Node> {
        self.ast
    }
}
