use std::{borrow::Cow, collections::HashMap};

use crate::{
    ast::{Node, Span},
    config::{Pair, Syntax},
    error::{ParseError, ParseErrorKind},
};

type ParseResult<T> = Result<T, ParseError>;

/// The tag kinds a delimited slice can be classified as.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TagKind {
    BlockComment,
    Raw,
    Helper,
    Partial,
    Close,
    Comment,
    Variable,
}

impl TagKind {
    /// Classification order. The first kind that accepts a tag wins, and
    /// [`TagKind::Variable`] accepts everything.
    pub(crate) const PRIORITY: [Self; 7] = [
        Self::BlockComment,
        Self::Raw,
        Self::Helper,
        Self::Partial,
        Self::Close,
        Self::Comment,
        Self::Variable,
    ];
}

struct Parser<'a> {
    input: &'a str,
    syntax: &'a Syntax,
    pos: usize,
    /// Open block count per key, local to a single parse.
    depths: HashMap<String, usize>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, syntax: &'a Syntax) -> Self {
        Parser {
            input,
            syntax,
            pos: 0,
            depths: HashMap::new(),
        }
    }

    /// Finds `needle` at or after `from`, skipping occurrences directly
    /// preceded by the escape character.
    fn find_unescaped(&self, needle: &str, mut from: usize) -> Option<usize> {
        if needle.is_empty() {
            return None;
        }
        loop {
            let found = self.input.get(from..)?.find(needle)?.saturating_add(from);
            let escaped = self
                .input
                .get(..found)
                .and_then(|before| before.chars().next_back())
                == Some(self.syntax.escape);
            if !escaped {
                return Some(found);
            }
            from = found.saturating_add(needle.len());
        }
    }

    fn push_text(&self, nodes: &mut Vec<Node>, start: usize, end: usize) {
        // TODO: strip the escape character in front of escaped delimiters
        // once templates relying on it being kept are migrated.
        if let Some(text) = self.input.get(start..end).filter(|t| !t.is_empty()) {
            nodes.push(Node::text(text));
        }
    }

    fn parse_nodes(&mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        let syntax = self.syntax;
        let (open, close) = (&syntax.delimiters.0, &syntax.delimiters.1);

        while self.pos < self.input.len() {
            let Some(start) = self.find_unescaped(open, self.pos) else {
                break;
            };
            let Some(end) = self.find_unescaped(close, start.saturating_add(open.len())) else {
                break;
            };

            self.push_text(&mut nodes, self.pos, start);

            let node = self.classify(start, end)?;
            self.pos = node.span().map_or(end, |span| span.end);
            nodes.push(node);
        }

        self.push_text(&mut nodes, self.pos, self.input.len());
        Ok(nodes)
    }

    /// Runs the tag kinds in priority order over the tag starting at `start`
    /// whose first end delimiter sits at `end`.
    fn classify(&mut self, start: usize, end: usize) -> ParseResult<Node> {
        for kind in TagKind::PRIORITY {
            if let Some(node) = self.try_kind(kind, start, end)? {
                return Ok(node);
            }
        }
        // Unreachable in practice since variables accept any tag.
        let end = end.saturating_add(self.syntax.delimiters.1.len());
        Ok(Node::text(self.input.get(start..end).unwrap_or_default()))
    }

    fn try_kind(&mut self, kind: TagKind, start: usize, end: usize) -> ParseResult<Option<Node>> {
        let syntax = self.syntax;
        let node = match kind {
            TagKind::BlockComment => self.block_comment(start),
            TagKind::Raw => self.wrapped(start, end, &syntax.raw).map(|(tag, content, span)| {
                Node::Raw {
                    key: content.trim().to_string(),
                    tag,
                    span,
                }
            }),
            TagKind::Helper => match self.wrapped(start, end, &syntax.helper) {
                Some((tag, content, span)) => {
                    let (key, addition) = split_key(&content, is_block_key_char, false);
                    let depth = self.open_block(&key);
                    Some(Node::Helper {
                        key,
                        tag,
                        span,
                        depth,
                        addition,
                    })
                }
                None => None,
            },
            TagKind::Partial => match self.wrapped(start, end, &syntax.partial) {
                Some((tag, content, span)) => {
                    let (key, addition) = split_key(&content, is_block_key_char, false);
                    let depth = self.open_block(&key);
                    Some(Node::Partial {
                        key,
                        tag,
                        span,
                        depth,
                        addition,
                    })
                }
                None => None,
            },
            TagKind::Close => match self.wrapped(start, end, &syntax.close) {
                Some((tag, content, span)) => {
                    let key = content.trim().to_string();
                    let depth = self.close_block(&key, &tag, start)?;
                    Some(Node::Close {
                        key,
                        tag,
                        span,
                        depth,
                    })
                }
                None => None,
            },
            TagKind::Comment => self
                .wrapped(start, end, &syntax.comment)
                .map(|(tag, content, span)| Node::Comment {
                    key: content.trim().to_string(),
                    tag,
                    span,
                }),
            TagKind::Variable => {
                let plain: Pair = (Cow::Borrowed(""), Cow::Borrowed(""));
                self.wrapped(start, end, &plain).map(|(tag, content, span)| {
                    let (key, addition) = split_key(&content, is_variable_key_char, true);
                    Node::Variable {
                        key,
                        tag,
                        span,
                        addition,
                    }
                })
            }
        };
        Ok(node)
    }

    /// Cuts out a tag of the given prefix/suffix kind. Returns the full tag
    /// text, the content between the kind's delimiters, and its span.
    fn wrapped(
        &self,
        start: usize,
        end: usize,
        kind: &Pair,
    ) -> Option<(String, String, Span)> {
        let (opener, closer) = self.syntax.wrap(kind);
        let tag_end = end
            .saturating_add(kind.1.len())
            .saturating_add(self.syntax.delimiters.1.len());
        let tag = self.input.get(start..tag_end)?;
        if tag.len() < opener.len().saturating_add(closer.len()) {
            return None;
        }
        let content = tag.strip_prefix(opener.as_str())?.strip_suffix(closer.as_str())?;
        Some((
            tag.to_string(),
            content.to_string(),
            Span::new(start, tag_end),
        ))
    }

    /// `{{!-- ... --}}`; the terminator is searched on its own since the body
    /// may contain the plain end delimiter. Declines when unterminated.
    fn block_comment(&self, start: usize) -> Option<Node> {
        let (opener, closer) = self.syntax.wrap(&self.syntax.block_comment);
        let rest = self.input.get(start..)?;
        if !rest.starts_with(opener.as_str()) {
            return None;
        }
        let body_start = start.saturating_add(opener.len());
        let body_len = self.input.get(body_start..)?.find(closer.as_str())?;
        let body_end = body_start.saturating_add(body_len);
        let tag_end = body_end.saturating_add(closer.len());
        Some(Node::Comment {
            key: self.input.get(body_start..body_end)?.trim().to_string(),
            tag: self.input.get(start..tag_end)?.to_string(),
            span: Span::new(start, tag_end),
        })
    }

    fn open_block(&mut self, key: &str) -> usize {
        let count = self.depths.entry(key.to_string()).or_insert(0);
        let depth = *count;
        *count = count.saturating_add(1);
        depth
    }

    fn close_block(&mut self, key: &str, tag: &str, at: usize) -> ParseResult<usize> {
        match self.depths.get_mut(key) {
            Some(count) if *count > 0 => {
                *count = count.saturating_sub(1);
                Ok(*count)
            }
            Some(_) | None => Err(ParseError::at(
                self.input,
                at,
                ParseErrorKind::UnexpectedClose {
                    tag: tag.to_string(),
                },
            )),
        }
    }
}

fn is_block_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '/')
}

fn is_variable_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '[' | ']')
}

/// Splits tag content into its leading key and the trimmed remainder.
///
/// A key must start with a word character; variables may additionally carry
/// a leading `$` for reserved words such as `$block`.
fn split_key(content: &str, is_key_char: fn(char) -> bool, allow_dollar: bool) -> (String, Option<String>) {
    let content = content.trim_start();
    let mut chars = content.char_indices().peekable();
    let mut key_end = 0;

    if allow_dollar && chars.peek().is_some_and(|(_, c)| *c == '$') {
        chars.next();
        key_end = 1;
    }
    let starts_with_word = chars
        .peek()
        .is_some_and(|(_, c)| c.is_alphanumeric() || *c == '_');
    if starts_with_word {
        key_end = content.len();
        for (i, c) in chars {
            if !is_key_char(c) {
                key_end = i;
                break;
            }
        }
    } else {
        key_end = 0;
    }

    let (key, rest) = content.split_at(key_end);
    let rest = rest.trim();
    let addition = (!rest.is_empty()).then(|| rest.to_string());
    (key.to_string(), addition)
}

/// Parses `input` into a flat list of nodes.
///
/// # Errors
/// Returns [`ParseErrorKind::UnexpectedClose`] when a close tag names a block
/// that is not open at that point.
pub fn parse(input: &str, syntax: &Syntax) -> Result<Vec<Node>, ParseError> {
    Parser::new(input, syntax).parse_nodes()
}
