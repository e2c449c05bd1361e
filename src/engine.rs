use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::ast::Node;
use crate::config::Syntax;
use crate::diagnostic::{Diagnostic, DiagnosticHandler};
use crate::error::{ParseError, TagweaveError, TagweaveResult};
use crate::helpers::{self, Assign};
use crate::interface::{FnHelper, Helper};
use crate::parser;
use crate::partial::{Partial, PartialSource};
use crate::template::Template;
use crate::value::{escape_html, get_value, stringify};

/// Placeholder inside a partial that receives the content enclosed by the
/// partial tag at the call site.
pub(crate) const BLOCK: &str = "$block";

/// `Engine` owns the syntax, the helper registry and the partial registry,
/// and renders parsed templates against JSON data.
///
/// A new engine already knows the built-in helpers `if`, `each` (also
/// available as `for`), `with`, `set` and `default`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tagweave::Engine;
///
/// let mut engine = Engine::new();
/// engine.register_partial("greeting", "Hello, {{ name }}!");
///
/// let output = engine
///     .render("{{#if name}}{{> greeting}}{{/greeting}}{{else}}Who?{{/if}}", &json!({"name": "World"}))
///     .unwrap();
/// assert_eq!(output, "Hello, World!");
/// ```
pub struct Engine {
    syntax: Syntax,
    helpers: HashMap<String, Box<dyn Helper>>,
    partials: HashMap<String, Partial>,
    on_diagnostic: Option<Box<DiagnosticHandler>>,
}

impl Engine {
    /// Creates an engine using the default `{{ }}` syntax.
    pub fn new() -> Self {
        Self::with_syntax(Syntax::default())
    }

    pub fn with_syntax(syntax: Syntax) -> Self {
        let mut engine = Self {
            syntax,
            helpers: HashMap::new(),
            partials: HashMap::new(),
            on_diagnostic: None,
        };
        engine.register_helper("if", helpers::if_helper);
        engine.register_helper("each", helpers::each_helper);
        engine.register_helper("for", helpers::each_helper);
        engine.register_helper("with", helpers::with_helper);
        engine.register_helper("set", helpers::set_helper);
        engine.register_helper("default", helpers::default_helper);
        engine
    }

    pub const fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Parses `template` with this engine's syntax.
    ///
    /// # Errors
    /// See [`parse`](crate::parse).
    pub fn parse(&self, template: &str) -> Result<Vec<Node>, ParseError> {
        parser::parse(template, &self.syntax)
    }

    /// Renders a parsed template against `data`.
    ///
    /// `data` is mutable because bare `{{#set}}` and `{{#default}}` tags write
    /// into it. Helpers call this to render their bodies.
    ///
    /// # Errors
    /// Returns the first error raised by a helper, a missing variable in
    /// strict mode, or a partial that fails to parse.
    pub fn execute(&self, ast: &[Node], data: &mut Value) -> TagweaveResult<String> {
        let mut output = String::new();
        let mut i = 0;

        while let Some(node) = ast.get(i) {
            i = i.saturating_add(1);
            match node {
                Node::Text { text } => output.push_str(text),
                Node::Variable { key, .. } => output.push_str(&escape_html(&self.lookup(key, data)?)),
                Node::Raw { key, .. } => output.push_str(&self.lookup(key, data)?),
                Node::Helper {
                    key, depth, span, ..
                } => {
                    let (body, next) = block_body(ast, i, key, *depth);
                    i = next;
                    match self.helpers.get(key) {
                        Some(helper) => {
                            tracing::trace!(helper = %key, "calling helper");
                            output.push_str(&helper.call(self, data, node, body)?);
                        }
                        None => self.emit(&Diagnostic::HelperNotFound {
                            name: key.clone(),
                            span: *span,
                        }),
                    }
                }
                Node::Partial { key, depth, .. } => {
                    let (body, next) = block_body(ast, i, key, *depth);
                    i = next;
                    output.push_str(&self.include(node, key, body, data)?);
                }
                Node::Close { .. } | Node::Comment { .. } => {}
            }
        }

        Ok(output)
    }

    /// Parses `template` once for repeated rendering.
    ///
    /// # Errors
    /// Returns [`TagweaveError::Parse`] when the template is malformed.
    pub fn compile(&self, template: &str) -> TagweaveResult<Template<'_>> {
        Ok(Template::new(self, self.parse(template)?))
    }

    /// Parses and renders `template` in one go. `data` itself is never
    /// modified.
    ///
    /// # Errors
    /// Parse errors and any error [`Engine::execute`] can return.
    pub fn render(&self, template: &str, data: &Value) -> TagweaveResult<String> {
        self.compile(template)?.render(data)
    }

    /// Renders a registered partial on its own. A `{{$block}}` placeholder
    /// renders as nothing.
    ///
    /// # Errors
    /// Returns [`TagweaveError::MissingPartial`] for unknown names.
    pub fn render_partial(&self, name: &str, data: &Value) -> TagweaveResult<String> {
        let partial = self
            .partials
            .get(name)
            .ok_or_else(|| TagweaveError::MissingPartial {
                name: name.to_string(),
            })?;
        let ast = partial.ast(name, &self.syntax)?;
        self.execute_with_block(ast, &[], &mut data.clone())
    }

    /// Registers a partial, replacing any partial of the same name.
    ///
    /// Text sources are parsed the first time the partial is used.
    pub fn register_partial<N, S>(&mut self, name: N, source: S)
    where
        N: Into<String>,
        S: Into<PartialSource>,
    {
        let name = name.into();
        tracing::debug!(partial = %name, "registering partial");
        self.partials.insert(name, Partial::new(source.into()));
    }

    pub fn register_partials<I, N, S>(&mut self, partials: I)
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<PartialSource>,
    {
        for (name, source) in partials {
            self.register_partial(name, source);
        }
    }

    /// Registers a block helper, replacing any helper of the same name,
    /// built-ins included.
    ///
    /// ```
    /// use serde_json::{json, Value};
    /// use tagweave::{Engine, Node, TagweaveResult};
    ///
    /// let mut engine = Engine::new();
    /// engine.register_helper(
    ///     "shout",
    ///     |engine: &Engine, data: &mut Value, _node: &Node, body: &[Node]| -> TagweaveResult<String> {
    ///         Ok(engine.execute(body, data)?.to_uppercase())
    ///     },
    /// );
    /// let output = engine.render("{{#shout}}hi {{name}}{{/shout}}", &json!({"name": "al"}));
    /// assert_eq!(output.unwrap(), "HI AL");
    /// ```
    pub fn register_helper<N, H>(&mut self, name: N, helper: H)
    where
        N: Into<String>,
        H: Helper + 'static,
    {
        self.helpers.insert(name.into(), Box::new(helper));
    }

    /// Registers a helper from a function over resolved arguments.
    ///
    /// The tag arguments are split on whitespace and commas outside quotes
    /// and resolved against the context, missing paths becoming `null`. The
    /// rendered block content, when not empty, is passed last.
    ///
    /// ```
    /// use serde_json::json;
    /// use tagweave::{stringify, Engine};
    ///
    /// let mut engine = Engine::new();
    /// engine.register_fn("join", |args| {
    ///     args.iter().map(stringify).collect::<Vec<_>>().join("-")
    /// });
    /// let output = engine.render("{{#join a, 'b'}}c{{/join}}", &json!({"a": 1}));
    /// assert_eq!(output.unwrap(), "1-b-c");
    /// ```
    pub fn register_fn<N, F>(&mut self, name: N, func: F)
    where
        N: Into<String>,
        F: Fn(&[Value]) -> String + Send + Sync + 'static,
    {
        self.register_helper(name, FnHelper::new(func));
    }

    /// Installs the callback receiving every [`Diagnostic`]. Diagnostics are
    /// logged through `tracing` whether or not a handler is installed.
    pub fn set_diagnostic_handler<F>(&mut self, handler: F)
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.on_diagnostic = Some(Box::new(handler));
    }

    fn lookup(&self, key: &str, data: &Value) -> TagweaveResult<String> {
        match get_value(key, data) {
            Some(value) => Ok(stringify(&value)),
            None if self.syntax.strict => Err(TagweaveError::MissingVariable {
                path: key.to_string(),
            }),
            None => Ok(String::new()),
        }
    }

    /// Renders the partial `name` for a `{{> name ...}}` tag whose enclosed
    /// content is `body`.
    fn include(
        &self,
        node: &Node,
        name: &str,
        body: &[Node],
        data: &Value,
    ) -> TagweaveResult<String> {
        // Both the partial and the fallback content see the bindings, and
        // neither can write back into the caller's context.
        let mut scoped = data.clone();
        if let Some(args) = node.addition() {
            let bindings = helpers::parse_assignments(args, data)
                .map_err(|reason| TagweaveError::invalid_arguments(name, reason, node))?;
            helpers::assign(&mut scoped, bindings, Assign::Set);
        }

        let Some(partial) = self.partials.get(name) else {
            if let Some(span) = node.span() {
                self.emit(&Diagnostic::PartialNotFound {
                    name: name.to_string(),
                    span,
                });
            }
            return self.execute(body, &mut scoped);
        };
        let ast = partial.ast(name, &self.syntax)?;
        self.execute_with_block(ast, body, &mut scoped)
    }

    /// Executes `ast` with `block` in place of its `{{$block}}` placeholder.
    /// The splice happens on a copy.
    fn execute_with_block(
        &self,
        ast: &[Node],
        block: &[Node],
        data: &mut Value,
    ) -> TagweaveResult<String> {
        let Some(at) = helpers::reserved_word(ast, BLOCK) else {
            return self.execute(ast, data);
        };
        let before = ast.get(..at).unwrap_or_default();
        let after = ast.get(at.saturating_add(1)..).unwrap_or_default();
        let spliced = [before, block, after].concat();
        self.execute(&spliced, data)
    }

    fn emit(&self, diagnostic: &Diagnostic) {
        tracing::warn!(%diagnostic, "template diagnostic");
        if let Some(handler) = &self.on_diagnostic {
            handler(diagnostic);
        }
    }
}

/// Returns the nodes between the block opened just before `from` and its
/// matching close, plus the index to resume at. Without a close the block is
/// a bare tag with an empty body.
fn block_body<'a>(ast: &'a [Node], from: usize, key: &str, depth: usize) -> (&'a [Node], usize) {
    let rest = ast.get(from..).unwrap_or_default();
    match rest.iter().position(|node| node.closes(key, depth)) {
        Some(offset) => (
            rest.get(..offset).unwrap_or_default(),
            from.saturating_add(offset).saturating_add(1),
        ),
        None => (&[], from),
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut helpers: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        helpers.sort_unstable();
        let mut partials: Vec<&str> = self.partials.keys().map(String::as_str).collect();
        partials.sort_unstable();
        f.debug_struct("Engine")
            .field("syntax", &self.syntax)
            .field("helpers", &helpers)
            .field("partials", &partials)
            .field("on_diagnostic", &self.on_diagnostic.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::ast::Span;
    use serde_json::json;

    #[test]
    #[ntest::timeout(100)]
    fn test_block_body_matches_depth() {
        let engine = Engine::new();
        let ast = engine.parse("{{#w}}{{#w}}A{{/w}}B{{/w}}C").unwrap();
        let (body, next) = block_body(&ast, 1, "w", 0);
        assert_eq!(body.len(), 4);
        assert_eq!(next, 6);
        assert_eq!(ast.get(next), Some(&Node::text("C")));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_block_body_without_close_is_empty() {
        let engine = Engine::new();
        let ast = engine.parse("{{#w}}after").unwrap();
        assert_eq!(block_body(&ast, 1, "w", 0), (&[][..], 1));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_variables_are_escaped_raw_are_not() {
        let engine = Engine::new();
        let data = json!({"x": "<b>"});
        assert_eq!(engine.render("{{x}}|{{{x}}}", &data).unwrap(), "&lt;b&gt;|<b>");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_strict_mode_reports_missing_path() {
        let engine = Engine::with_syntax(Syntax::default().strict(true));
        assert_eq!(
            engine.render("{{user.name}}", &json!({})),
            Err(TagweaveError::MissingVariable {
                path: "user.name".into()
            })
        );
        assert_eq!(engine.render("{{user.name}}", &json!({"user": {"name": "Al"}})), Ok("Al".into()));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_missing_helper_skips_block_and_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut engine = Engine::new();
        let sink = Arc::clone(&seen);
        engine.set_diagnostic_handler(move |d| sink.lock().unwrap().push(d.clone()));

        assert_eq!(engine.render("a{{#nope}}hidden{{/nope}}b", &json!({})).unwrap(), "ab");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Diagnostic::HelperNotFound {
                name: "nope".into(),
                span: Span::new(1, 10)
            }]
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_partial_block_splice_leaves_definition_untouched() {
        let mut engine = Engine::new();
        engine.register_partial("card", "[{{$block}}]");
        let template = engine.compile("{{> card}}{{title}}{{/card}}").unwrap();

        assert_eq!(template.render(&json!({"title": "one"})).unwrap(), "[one]");
        assert_eq!(template.render(&json!({"title": "two"})).unwrap(), "[two]");
        assert_eq!(engine.render_partial("card", &json!({})).unwrap(), "[]");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_partial_bindings_do_not_leak() {
        let mut engine = Engine::new();
        engine.register_partial("p", "{{a}}{{b}}");
        let output = engine
            .render("{{> p a = 1, b = name}}{{/p}}|{{a}}", &json!({"name": "x"}))
            .unwrap();
        assert_eq!(output, "1x|");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_render_partial_unknown_name() {
        let engine = Engine::new();
        assert_eq!(
            engine.render_partial("ghost", &json!({})),
            Err(TagweaveError::MissingPartial {
                name: "ghost".into()
            })
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_registering_replaces_builtins() {
        let mut engine = Engine::new();
        engine.register_fn("if", |_| "custom".to_string());
        assert_eq!(engine.render("{{#if x}}y{{/if}}", &json!({})).unwrap(), "custom");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_debug_lists_registrations() {
        let mut engine = Engine::new();
        engine.register_partial("p", "x");
        let debug = format!("{engine:?}");
        assert!(debug.contains("\"each\""));
        assert!(debug.contains("partials: [\"p\"]"));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
