//! Resolution of paths and literals against a data context, and the string
//! forms values take when interpolated.

use std::borrow::Cow;

use serde_json::{Number, Value};

/// Resolves a tag argument against `data`.
///
/// Quoted text (`'...'` or `"..."`) is a string literal, anything that parses
/// as a finite number is a number and `true`/`false` are booleans. Everything
/// else is treated as a path and looked up with [`resolve`].
pub fn get_value<'a>(path: &str, data: &'a Value) -> Option<Cow<'a, Value>> {
    let path = path.trim();
    if let Some(literal) = unquote(path) {
        return Some(Cow::Owned(Value::String(literal.to_string())));
    }
    if let Some(number) = parse_number(path) {
        return Some(Cow::Owned(Value::Number(number)));
    }
    match path {
        "true" => Some(Cow::Owned(Value::Bool(true))),
        "false" => Some(Cow::Owned(Value::Bool(false))),
        _ => resolve(path, data).map(Cow::Borrowed),
    }
}

/// Walks `data` along the segments of `path`.
///
/// Segments are runs of word characters, so `user.tags[1]`, `user.tags.1`
/// and `user tags 1` all address the same value. Objects are indexed by key
/// and arrays by position; any other intermediate value ends the walk.
pub fn resolve<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    let mut segments = path_segments(path).peekable();
    segments.peek()?;
    segments.try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => None,
    })
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(|c: char| !is_word_char(c))
        .filter(|segment| !segment.is_empty())
}

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Strips matching single or double quotes.
pub(crate) fn unquote(s: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        s.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .filter(|inner| !inner.contains(quote))
    })
}

fn parse_number(s: &str) -> Option<Number> {
    if s.is_empty() {
        return None;
    }
    if let Ok(int) = s.parse::<i64>() {
        return Some(Number::from(int));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

/// Truthiness used by conditionals: `null`, `false`, zero, empty strings and
/// empty arrays are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// The text a value renders as. `null` renders as nothing, strings render
/// without quotes and containers render as JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Escapes the HTML special characters. `&` is handled in the same pass as
/// the others so entities produced here are never escaped twice.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Splits `input` on separator characters that are not inside quotes.
/// Quotes are kept on the returned pieces and empty pieces are dropped.
pub(crate) fn split_quoted(input: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if is_separator(c) => {
                if let Some(piece) = input.get(start..i).filter(|p| !p.is_empty()) {
                    pieces.push(piece);
                }
                start = i.saturating_add(c.len_utf8());
            }
            None => {}
        }
    }
    if let Some(piece) = input.get(start..).filter(|p| !p.is_empty()) {
        pieces.push(piece);
    }
    pieces
}
