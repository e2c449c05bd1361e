/// Byte range of a tag within the template it was parsed from.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single element of a parsed template.
///
/// The AST is flat: blocks are not nested structurally, instead an opening
/// [`Node::Helper`] or [`Node::Partial`] is paired with the later
/// [`Node::Close`] carrying the same `key` and `depth`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Literal text copied verbatim into the output.
    Text { text: String },
    /// An HTML escaped interpolation, `{{ name }}`.
    Variable {
        key: String,
        tag: String,
        span: Span,
        /// Anything trailing the key inside the tag.
        addition: Option<String>,
    },
    /// An unescaped interpolation, `{{{ name }}}`.
    Raw { key: String, tag: String, span: Span },
    /// A partial inclusion, `{{> name a = 1}}`.
    Partial {
        key: String,
        tag: String,
        span: Span,
        depth: usize,
        addition: Option<String>,
    },
    /// A helper invocation, `{{#name args}}`.
    Helper {
        key: String,
        tag: String,
        span: Span,
        depth: usize,
        addition: Option<String>,
    },
    /// Terminates the helper or partial block with the same key and depth.
    Close {
        key: String,
        tag: String,
        span: Span,
        depth: usize,
    },
    /// `{{! ... }}` or `{{!-- ... --}}`, never rendered.
    Comment { key: String, tag: String, span: Span },
}

impl Node {
    pub fn text<T: Into<String>>(text: T) -> Self {
        Self::Text { text: text.into() }
    }

    /// The key of a tag node, `None` for text.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Variable { key, .. }
            | Self::Raw { key, .. }
            | Self::Partial { key, .. }
            | Self::Helper { key, .. }
            | Self::Close { key, .. }
            | Self::Comment { key, .. } => Some(key),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Text { .. } => None,
            Self::Variable { span, .. }
            | Self::Raw { span, .. }
            | Self::Partial { span, .. }
            | Self::Helper { span, .. }
            | Self::Close { span, .. }
            | Self::Comment { span, .. } => Some(*span),
        }
    }

    /// The raw argument text following the key, if any.
    pub fn addition(&self) -> Option<&str> {
        match self {
            Self::Variable { addition, .. }
            | Self::Partial { addition, .. }
            | Self::Helper { addition, .. } => addition.as_deref(),
            Self::Text { .. } | Self::Raw { .. } | Self::Close { .. } | Self::Comment { .. } => {
                None
            }
        }
    }

    /// Whether this node opens a block that a [`Node::Close`] may terminate.
    pub const fn is_block_open(&self) -> bool {
        matches!(self, Self::Helper { .. } | Self::Partial { .. })
    }

    pub const fn is_close(&self) -> bool {
        matches!(self, Self::Close { .. })
    }

    /// A bare variable such as `{{else}}` or `{{$block}}`.
    pub fn is_reserved(&self, word: &str) -> bool {
        matches!(self, Self::Variable { key, addition: None, .. } if key == word)
    }

    /// Whether this is the close tag for a block opened with `key` at `depth`.
    pub fn closes(&self, key: &str, depth: usize) -> bool {
        matches!(self, Self::Close { key: k, depth: d, .. } if k == key && *d == depth)
    }
}
