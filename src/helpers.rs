//! The built-in block helpers: `if`, `each`/`for`, `with`, `set` and
//! `default`.

use serde_json::{Map, Value};

use crate::{
    ast::Node,
    engine::Engine,
    error::{TagweaveError, TagweaveResult},
    expr,
    value::{get_value, is_truthy, is_word_char, split_quoted},
};

/// Marks where `else` branches start inside `if`, `each` and `with`.
pub(crate) const ELSE: &str = "else";

pub(crate) const DEFAULT_ITEM: &str = "this";
pub(crate) const DEFAULT_KEY: &str = "key";
pub(crate) const DEFAULT_INDEX: &str = "index";

/// Finds a bare `{{word}}` that belongs to the block owning `ast` rather than
/// to a block nested inside it.
///
/// Only the run of nodes before the first nested block tag and the run after
/// the last one are searched, left run first.
pub(crate) fn reserved_word(ast: &[Node], word: &str) -> Option<usize> {
    let is_block_tag = |node: &Node| node.is_block_open() || node.is_close();

    let left_end = ast.iter().position(is_block_tag).unwrap_or(ast.len());
    let right_start = ast
        .iter()
        .rposition(is_block_tag)
        .map_or(0, |i| i.saturating_add(1));

    let in_left = ast
        .get(..left_end)
        .and_then(|left| left.iter().position(|n| n.is_reserved(word)));
    in_left.or_else(|| {
        ast.get(right_start..)?
            .iter()
            .position(|n| n.is_reserved(word))
            .map(|i| i.saturating_add(right_start))
    })
}

/// Splits a helper body around its `else` marker.
fn split_else(body: &[Node]) -> (&[Node], Option<&[Node]>) {
    match reserved_word(body, ELSE) {
        Some(i) => (
            body.get(..i).unwrap_or_default(),
            body.get(i.saturating_add(1)..),
        ),
        None => (body, None),
    }
}

/// Runs `apply` on the context's top-level map. A context that is not an
/// object is replaced by a new object holding only what `apply` binds.
pub(crate) fn in_scope<F>(data: &mut Value, apply: F)
where
    F: FnOnce(&mut Map<String, Value>),
{
    match data {
        Value::Object(map) => apply(map),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_) => {
            let mut map = Map::new();
            apply(&mut map);
            *data = Value::Object(map);
        }
    }
}

pub(crate) fn if_helper(
    engine: &Engine,
    data: &mut Value,
    node: &Node,
    body: &[Node],
) -> TagweaveResult<String> {
    let condition = node
        .addition()
        .ok_or_else(|| TagweaveError::invalid_arguments("if", "missing condition", node))?;
    let holds = expr::evaluate(condition, data)
        .map_err(|reason| TagweaveError::invalid_arguments("if", reason, node))?;

    match (split_else(body), holds) {
        ((then, _), true) => engine.execute(then, data),
        ((_, Some(otherwise)), false) => engine.execute(otherwise, data),
        ((_, None), false) => Ok(String::new()),
    }
}

/// Names bound on every iteration of `each`.
#[derive(Debug, PartialEq, Eq)]
struct Loop<'a> {
    list: &'a str,
    item: &'a str,
    key: &'a str,
    index: &'a str,
}

/// Splits `s` around the first standalone occurrence of `word`.
fn split_on_word<'a>(s: &'a str, word: &str) -> Option<(&'a str, &'a str)> {
    s.match_indices(word).find_map(|(i, _)| {
        let before = s.get(..i)?;
        let after = s.get(i.saturating_add(word.len())..)?;
        let spaced = before.ends_with(char::is_whitespace) && after.starts_with(char::is_whitespace);
        spaced.then(|| (before.trim(), after.trim()))
    })
}

/// Parses `list as item[, key[, index]]`, `item[, key[, index]] in list` or
/// a bare `list`.
fn parse_loop(args: &str) -> Result<Loop<'_>, String> {
    let (list, names) = if let Some((list, names)) = split_on_word(args, "as") {
        (list, Some(names))
    } else if let Some((names, list)) = split_on_word(args, "in") {
        (list, Some(names))
    } else {
        (args.trim(), None)
    };

    if list.is_empty() || list.contains(char::is_whitespace) {
        return Err(format!("expected a list to iterate, found '{args}'"));
    }

    let names: Vec<&str> = names.map_or_else(Vec::new, |names| {
        names.split(',').map(str::trim).collect()
    });
    if names.len() > 3 {
        return Err("at most item, key and index can be named".to_string());
    }
    if let Some(bad) = names
        .iter()
        .find(|name| name.is_empty() || !name.chars().all(is_word_char))
    {
        return Err(format!("'{bad}' is not a valid name"));
    }

    let mut names = names.into_iter();
    Ok(Loop {
        list,
        item: names.next().unwrap_or(DEFAULT_ITEM),
        key: names.next().unwrap_or(DEFAULT_KEY),
        index: names.next().unwrap_or(DEFAULT_INDEX),
    })
}

/// The `(key, value)` pairs of an array or object. Anything else iterates as
/// an empty collection.
fn entries(collection: &Value) -> Vec<(String, Value)> {
    match collection {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Vec::new(),
    }
}

pub(crate) fn each_helper(
    engine: &Engine,
    data: &mut Value,
    node: &Node,
    body: &[Node],
) -> TagweaveResult<String> {
    let name = node.key().unwrap_or("each");
    let args = node
        .addition()
        .ok_or_else(|| TagweaveError::invalid_arguments(name, "missing list", node))?;
    let names = parse_loop(args).map_err(|reason| TagweaveError::invalid_arguments(name, reason, node))?;

    let pairs = get_value(names.list, data).map_or_else(Vec::new, |list| entries(&list));
    let (each_body, otherwise) = split_else(body);

    if pairs.is_empty() {
        return match otherwise {
            Some(otherwise) => engine.execute(otherwise, data),
            None => Ok(String::new()),
        };
    }

    // One copy for the whole loop; the bindings are overwritten on every pass.
    let mut scoped = data.clone();
    let mut output = String::new();
    for (index, (key, item)) in pairs.into_iter().enumerate() {
        in_scope(&mut scoped, |scope| {
            scope.insert(names.item.to_string(), item);
            scope.insert(names.key.to_string(), Value::String(key));
            scope.insert(names.index.to_string(), Value::from(index));
        });
        output.push_str(&engine.execute(each_body, &mut scoped)?);
    }
    Ok(output)
}

pub(crate) fn with_helper(
    engine: &Engine,
    data: &mut Value,
    node: &Node,
    body: &[Node],
) -> TagweaveResult<String> {
    let path = node
        .addition()
        .ok_or_else(|| TagweaveError::invalid_arguments("with", "missing context", node))?;
    let target = get_value(path, data)
        .map(std::borrow::Cow::into_owned)
        .filter(is_truthy);
    let (with_body, otherwise) = split_else(body);

    if let (None, Some(otherwise)) = (&target, otherwise) {
        return engine.execute(otherwise, data);
    }

    let mut scoped = data.clone();
    match target {
        Some(Value::Object(fields)) => in_scope(&mut scoped, |scope| scope.extend(fields)),
        Some(
            other @ (Value::Null
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Array(_)),
        ) => in_scope(&mut scoped, |scope| {
            scope.insert(DEFAULT_ITEM.to_string(), other);
        }),
        None => {}
    }
    engine.execute(with_body, &mut scoped)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Assign {
    /// Always overwrite.
    Set,
    /// Only assign names that are not present yet.
    Default,
}

/// Parses `a = 1, b = 'x', c = other.path` into resolved pairs.
///
/// A value that is neither a literal nor a resolvable path is kept as the
/// literal text, so `{{#set name = World}}` binds the string `World`.
pub(crate) fn parse_assignments(args: &str, data: &Value) -> Result<Vec<(String, Value)>, String> {
    split_quoted(args, |c| c == ',')
        .into_iter()
        .map(|assignment| {
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| format!("expected 'name = value', found '{}'", assignment.trim()))?;
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || !key.chars().all(is_word_char) {
                return Err(format!("'{key}' is not a valid name"));
            }
            let value = get_value(value, data)
                .map_or_else(|| Value::String(value.to_string()), std::borrow::Cow::into_owned);
            Ok((key.to_string(), value))
        })
        .collect()
}

pub(crate) fn assign(data: &mut Value, pairs: Vec<(String, Value)>, mode: Assign) {
    in_scope(data, |scope| {
        for (key, value) in pairs {
            match mode {
                Assign::Set => {
                    scope.insert(key, value);
                }
                Assign::Default => {
                    scope.entry(key).or_insert(value);
                }
            }
        }
    });
}

fn assignment_helper(
    mode: Assign,
    engine: &Engine,
    data: &mut Value,
    node: &Node,
    body: &[Node],
) -> TagweaveResult<String> {
    let name = node.key().unwrap_or_default();
    let args = node
        .addition()
        .ok_or_else(|| TagweaveError::invalid_arguments(name, "missing assignments", node))?;
    let pairs =
        parse_assignments(args, data).map_err(|reason| TagweaveError::invalid_arguments(name, reason, node))?;

    if body.is_empty() {
        assign(data, pairs, mode);
        return Ok(String::new());
    }

    let mut scoped = data.clone();
    assign(&mut scoped, pairs, mode);
    engine.execute(body, &mut scoped)
}

pub(crate) fn set_helper(
    engine: &Engine,
    data: &mut Value,
    node: &Node,
    body: &[Node],
) -> TagweaveResult<String> {
    assignment_helper(Assign::Set, engine, data, node, body)
}

pub(crate) fn default_helper(
    engine: &Engine,
    data: &mut Value,
    node: &Node,
    body: &[Node],
) -> TagweaveResult<String> {
    assignment_helper(Assign::Default, engine, data, node, body)
}
