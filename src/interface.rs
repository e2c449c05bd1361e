use serde_json::Value;

use crate::{
    ast::Node,
    engine::Engine,
    error::TagweaveResult,
    value::{get_value, split_quoted},
};

/// A block helper, invoked for `{{#name ...}}` tags.
///
/// `body` holds the nodes between the opening tag and its matching close tag
/// and is empty when the helper is used as a bare tag. Helpers render their
/// body by calling [`Engine::execute`] with whatever context they see fit.
///
/// Any `Fn(&Engine, &mut Value, &Node, &[Node]) -> TagweaveResult<String>`
/// is a helper.
pub trait Helper: Send + Sync {
    /// # Errors
    /// Implementations return an error to abort the whole render.
    fn call(
        &self,
        engine: &Engine,
        data: &mut Value,
        node: &Node,
        body: &[Node],
    ) -> TagweaveResult<String>;
}

impl<F> Helper for F
where
    F: Fn(&Engine, &mut Value, &Node, &[Node]) -> TagweaveResult<String> + Send + Sync,
{
    fn call(
        &self,
        engine: &Engine,
        data: &mut Value,
        node: &Node,
        body: &[Node],
    ) -> TagweaveResult<String> {
        self(engine, data, node, body)
    }
}

/// Adapts a plain function over resolved arguments into a [`Helper`].
///
/// The argument string is split on whitespace and commas outside of quotes
/// and every piece is resolved against the context. When the rendered body
/// is not empty it is passed as the final argument.
pub(crate) struct FnHelper<F> {
    func: F,
}

impl<F> FnHelper<F> {
    pub(crate) const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Helper for FnHelper<F>
where
    F: Fn(&[Value]) -> String + Send + Sync,
{
    fn call(
        &self,
        engine: &Engine,
        data: &mut Value,
        node: &Node,
        body: &[Node],
    ) -> TagweaveResult<String> {
        let mut args: Vec<Value> = split_quoted(node.addition().unwrap_or_default(), |c| {
            c.is_whitespace() || c == ','
        })
        .into_iter()
        .map(|arg| get_value(arg, data).map_or(Value::Null, std::borrow::Cow::into_owned))
        .collect();

        let content = engine.execute(body, data)?;
        if !content.is_empty() {
            args.push(Value::String(content));
        }
        Ok((self.func)(&args))
    }
}
