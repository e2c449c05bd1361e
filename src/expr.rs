//! The condition language accepted by the `if` helper.
//!
//! A condition is a list of clauses joined by `and`, `or` and `xor`. A clause
//! is a single value (`name`), a negated value (`not name`) or a comparison
//! between two values (`age >= 18`, `name == 'World'`). Tokens are separated
//! by whitespace, comparison operators also stand alone without surrounding
//! spaces (`age>=18`), and quoted literals may contain spaces.
//!
//! Connectives have no precedence: `a or b and c` is `(a or b) and c`.

use std::cmp::Ordering;

use serde_json::Value;

use crate::value::{get_value, is_truthy, split_quoted};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Connective {
    And,
    Or,
    Xor,
}

impl Connective {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "xor" => Some(Self::Xor),
            _ => None,
        }
    }

    const fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Self::And => left && right,
            Self::Or => left || right,
            Self::Xor => left ^ right,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Self::Eq),
            "!=" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    fn holds(self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Eq => loosely_equal(left, right),
            Self::Ne => !loosely_equal(left, right),
            Self::Lt => compare(left, right) == Some(Ordering::Less),
            Self::Le => matches!(compare(left, right), Some(Ordering::Less | Ordering::Equal)),
            Self::Gt => compare(left, right) == Some(Ordering::Greater),
            Self::Ge => matches!(
                compare(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
        }
    }
}

/// Numbers compare by value regardless of their integer or float
/// representation, everything else by structural equality.
fn loosely_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// Only numbers with numbers and strings with strings are ordered.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn lookup(token: &str, data: &Value) -> Value {
    get_value(token, data).map_or(Value::Null, std::borrow::Cow::into_owned)
}

/// Cuts comparison operators out of a whitespace-separated token, leaving
/// quoted text alone. A lone `=` is cut out too so that `a=b` is rejected
/// instead of being looked up as a path.
fn split_operators(token: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = token.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if matches!(c, '=' | '!' | '<' | '>') => {
                let doubled = chars.peek().is_some_and(|&(_, next)| next == '=');
                if c == '!' && !doubled {
                    continue;
                }
                if doubled {
                    chars.next();
                }
                let end = i.saturating_add(if doubled { 2 } else { 1 });
                if let Some(piece) = token.get(start..i).filter(|p| !p.is_empty()) {
                    pieces.push(piece);
                }
                if let Some(op) = token.get(i..end) {
                    pieces.push(op);
                }
                start = end;
            }
            None => {}
        }
    }
    if let Some(piece) = token.get(start..).filter(|p| !p.is_empty()) {
        pieces.push(piece);
    }
    pieces
}

/// Evaluates one clause, returning an explanation when it is malformed.
fn clause(tokens: &[&str], data: &Value) -> Result<bool, String> {
    let mut negate = false;
    let mut rest = tokens;
    while let Some((&"not", tail)) = rest.split_first() {
        negate = !negate;
        rest = tail;
    }

    let result = match rest {
        [value] => is_truthy(&lookup(value, data)),
        [left, op, right] => {
            let op = Comparison::parse(op)
                .ok_or_else(|| format!("unknown comparison operator '{op}'"))?;
            op.holds(&lookup(left, data), &lookup(right, data))
        }
        [] => return Err("expected a value".to_string()),
        _ => return Err(format!("cannot evaluate '{}'", rest.join(" "))),
    };
    Ok(result != negate)
}

/// Evaluates a full condition string against `data`.
///
/// # Errors
/// Returns a description of the problem when a clause is empty or does not
/// match any clause form.
pub(crate) fn evaluate(condition: &str, data: &Value) -> Result<bool, String> {
    let tokens: Vec<&str> = split_quoted(condition, char::is_whitespace)
        .into_iter()
        .flat_map(split_operators)
        .collect();

    let mut result: Option<bool> = None;
    let mut pending: Option<Connective> = None;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        let Some(connective) = Connective::parse(token) else {
            continue;
        };
        let value = clause(tokens.get(start..i).unwrap_or_default(), data)?;
        result = Some(fold(result, pending, value));
        pending = Some(connective);
        start = i.saturating_add(1);
    }
    let value = clause(tokens.get(start..).unwrap_or_default(), data)?;
    Ok(fold(result, pending, value))
}

fn fold(acc: Option<bool>, connective: Option<Connective>, value: bool) -> bool {
    match (acc, connective) {
        (Some(acc), Some(connective)) => connective.apply(acc, value),
        (Some(_), None) | (None, _) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(condition: &str, data: &Value) -> bool {
        evaluate(condition, data).unwrap()
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_single_value() {
        let data = json!({"name": "Al", "empty": ""});
        assert!(eval("name", &data));
        assert!(!eval("empty", &data));
        assert!(!eval("missing", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_not() {
        let data = json!({"name": ""});
        assert!(eval("not name", &data));
        assert!(!eval("not not name", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_comparisons() {
        let data = json!({"name": "World", "age": 20, "limit": 20.0});
        assert!(eval("name == 'World'", &data));
        assert!(eval("name != \"Stranger\"", &data));
        assert!(eval("age > 18", &data));
        assert!(eval("age >= limit", &data));
        assert!(eval("age == limit", &data));
        assert!(!eval("age < 18", &data));
        assert!(eval("age <= 20", &data));
        assert!(eval("not age < 18", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_quoted_literal_with_spaces() {
        let data = json!({"greeting": "hello there"});
        assert!(eval("greeting == 'hello there'", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_mismatched_types_are_unordered() {
        let data = json!({"age": 20});
        assert!(!eval("age > 'a'", &data));
        assert!(!eval("age <= 'a'", &data));
        assert!(eval("age != '20'", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_connectives() {
        let data = json!({"a": true, "b": false});
        assert!(!eval("a and b", &data));
        assert!(eval("a or b", &data));
        assert!(eval("a xor b", &data));
        assert!(!eval("a xor a", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_strict_left_to_right_fold() {
        // (true or false) and false, not true or (false and false)
        let data = json!({"t": true, "f": false});
        assert!(!eval("t or f and f", &data));
        // (false and false) or true
        assert!(eval("f and f or t", &data));
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_operators_without_spaces() {
        let data = json!({"name": "World", "age": 20});
        assert!(eval("age>=18", &data));
        assert!(eval("name=='World'", &data));
        assert!(eval("name!='a == b'", &data));
        assert!(!eval("age<18", &data));
        assert!(eval("age >18 and name== 'World'", &data));
        assert!(evaluate("age=18", &data).is_err());
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_split_operators() {
        assert_eq!(split_operators("a<=b"), vec!["a", "<=", "b"]);
        assert_eq!(split_operators("'x>y'"), vec!["'x>y'"]);
        assert_eq!(split_operators("=="), vec!["=="]);
        assert_eq!(split_operators("!flag"), vec!["!flag"]);
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_malformed_conditions() {
        let data = json!({});
        assert!(evaluate("", &data).is_err());
        assert!(evaluate("a and", &data).is_err());
        assert!(evaluate("a ~ b", &data).is_err());
        assert!(evaluate("a b c d", &data).is_err());
    }
}
