use std::borrow::Cow;

/// Delimiters and rendering switches for an [`Engine`](crate::Engine).
///
/// Every tag is built from the outer delimiter pair plus a kind specific
/// prefix and suffix, so with the defaults a helper opens with `{{#` and ends
/// with `}}`, and a raw value is wrapped in `{{{` and `}}}`.
///
/// ```
/// use tagweave::{Engine, Syntax};
///
/// let syntax = Syntax::default().with_delimiters("<%", "%>");
/// let engine = Engine::with_syntax(syntax);
/// let out = engine
///     .render("Hi <%name%>", &serde_json::json!({"name": "Al"}))
///     .unwrap();
/// assert_eq!(out, "Hi Al");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Syntax {
    pub escape: char,
    pub delimiters: (Cow<'static, str>, Cow<'static, str>),
    pub raw: (Cow<'static, str>, Cow<'static, str>),
    pub helper: (Cow<'static, str>, Cow<'static, str>),
    pub partial: (Cow<'static, str>, Cow<'static, str>),
    pub close: (Cow<'static, str>, Cow<'static, str>),
    pub comment: (Cow<'static, str>, Cow<'static, str>),
    pub block_comment: (Cow<'static, str>, Cow<'static, str>),
    /// Fail the render when a variable cannot be resolved instead of
    /// rendering it as an empty string.
    pub strict: bool,
}

impl Default for Syntax {
    fn default() -> Self {
        Self {
            escape: '\\',
            delimiters: (Cow::Borrowed("{{"), Cow::Borrowed("}}")),
            raw: (Cow::Borrowed("{"), Cow::Borrowed("}")),
            helper: (Cow::Borrowed("#"), Cow::Borrowed("")),
            partial: (Cow::Borrowed(">"), Cow::Borrowed("")),
            close: (Cow::Borrowed("/"), Cow::Borrowed("")),
            comment: (Cow::Borrowed("!"), Cow::Borrowed("")),
            block_comment: (Cow::Borrowed("!--"), Cow::Borrowed("--")),
            strict: false,
        }
    }
}

pub(crate) type Pair = (Cow<'static, str>, Cow<'static, str>);

fn pair<S: Into<Cow<'static, str>>, E: Into<Cow<'static, str>>>(start: S, end: E) -> Pair {
    (start.into(), end.into())
}

impl Syntax {
    pub fn with_delimiters<S, E>(mut self, start: S, end: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.delimiters = pair(start, end);
        self
    }

    pub fn with_raw<S, E>(mut self, prefix: S, suffix: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.raw = pair(prefix, suffix);
        self
    }

    pub fn with_helper<S, E>(mut self, prefix: S, suffix: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.helper = pair(prefix, suffix);
        self
    }

    pub fn with_partial<S, E>(mut self, prefix: S, suffix: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.partial = pair(prefix, suffix);
        self
    }

    pub fn with_close<S, E>(mut self, prefix: S, suffix: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.close = pair(prefix, suffix);
        self
    }

    pub fn with_comment<S, E>(mut self, prefix: S, suffix: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.comment = pair(prefix, suffix);
        self
    }

    pub fn with_block_comment<S, E>(mut self, prefix: S, suffix: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Into<Cow<'static, str>>,
    {
        self.block_comment = pair(prefix, suffix);
        self
    }

    pub const fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The full opening and closing text of a tag kind, e.g. `("{{#", "}}")`.
    pub(crate) fn wrap(&self, (prefix, suffix): &Pair) -> (String, String) {
        let (start, end) = &self.delimiters;
        (format!("{start}{prefix}"), format!("{suffix}{end}"))
    }
}
