//! Runtime values of dynamic expressions
//!
//! Template authors write expressions in the style of the scripts the
//! templates were designed for, so values follow those loose rules:
//! truthiness, string concatenation on `+`, numeric coercion, and `==`
//! versus `===`. Input documents are borrowed, never copied.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use serde_json::Value as Json;

use crate::ast::Expr;
use crate::errors::EvalError;

use super::control::ControlOutcome;

/// Integral numbers below this convert to JSON integers
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A value produced by a compiled expression
#[derive(Debug, Clone)]
pub enum Value<'a> {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Cow<'a, str>),
    /// Array or object borrowed from an input document
    Data(&'a Json),
    /// Arrow function, only ever called as a control predicate
    Function(Function<'a>),
    /// Break/Exit sentinel carrying the value the setter receives
    Signal(ControlOutcome, Box<Value<'a>>),
}

/// An arrow function closed over the parameters visible where it was built
#[derive(Clone)]
pub struct Function<'a> {
    pub(crate) param: &'a str,
    pub(crate) body: &'a Expr,
    pub(crate) captured: Rc<Vec<(&'a str, Value<'a>)>>,
}

impl fmt::Debug for Function<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({} => ..)", self.param)
    }
}

impl<'a> Value<'a> {
    /// Borrow an input document; scalars become plain values
    pub fn from_json(json: &'a Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Str(Cow::Borrowed(s)),
            Json::Array(_) | Json::Object(_) => Value::Data(json),
        }
    }

    /// Convert back into a JSON document (functions become `null`)
    pub fn to_json(&self) -> Json {
        match self {
            Value::Undefined | Value::Null | Value::Function(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
                Json::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.to_string()),
            Value::Data(json) => (*json).clone(),
            Value::Signal(_, inner) => inner.to_json(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Data(_) | Value::Signal(..) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Data(_) | Value::Function(_) | Value::Signal(..) => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_)
        )
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => string_to_number(s),
            Value::Data(Json::Array(_)) => string_to_number(&self.to_string()),
            Value::Data(_) | Value::Function(_) | Value::Signal(..) => f64::NAN,
        }
    }

    /// Property read, `object.key` / `object[key]`
    pub fn get(&self, key: &str) -> Result<Value<'a>, EvalError> {
        Ok(match self {
            Value::Undefined | Value::Null => {
                return Err(EvalError::CannotReadProperty {
                    property: key.to_string(),
                    target: self.type_name(),
                });
            }
            Value::Data(Json::Object(map)) => {
                map.get(key).map(Value::from_json).unwrap_or(Value::Undefined)
            }
            Value::Data(Json::Array(items)) => {
                if key == "length" {
                    Value::Number(items.len() as f64)
                } else {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|i| items.get(i))
                        .map(Value::from_json)
                        .unwrap_or(Value::Undefined)
                }
            }
            Value::Str(s) => {
                if key == "length" {
                    Value::Number(s.chars().count() as f64)
                } else {
                    key.parse::<usize>()
                        .ok()
                        .and_then(|i| s.chars().nth(i))
                        .map(|c| Value::Str(Cow::Owned(c.to_string())))
                        .unwrap_or(Value::Undefined)
                }
            }
            Value::Signal(_, inner) if key == "value" => (**inner).clone(),
            _ => Value::Undefined,
        })
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value<'_>) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Data(a), Value::Data(b)) => std::ptr::eq(*a, *b),
            (Value::Function(a), Value::Function(b)) => std::ptr::eq(a.body, b.body),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value<'_>) -> bool {
        if self.is_nullish() || other.is_nullish() {
            return self.is_nullish() && other.is_nullish();
        }
        match (self, other) {
            (Value::Bool(_), _)
            | (_, Value::Bool(_))
            | (Value::Number(_), Value::Str(_))
            | (Value::Str(_), Value::Number(_)) => self.to_number() == other.to_number(),
            (Value::Data(_), Value::Number(_) | Value::Str(_)) => {
                Value::Str(Cow::Owned(self.to_string())).loose_equals(other)
            }
            (Value::Number(_) | Value::Str(_), Value::Data(_)) => {
                self.loose_equals(&Value::Str(Cow::Owned(other.to_string())))
            }
            _ => self.strict_equals(other),
        }
    }

    /// Relational comparison; `None` when either side is NaN
    pub fn compare(&self, other: &Value<'_>) -> Option<Ordering> {
        let stringy = |v: &Value<'_>| matches!(v, Value::Str(_) | Value::Data(_));
        if stringy(self) && stringy(other) {
            return Some(self.to_string().cmp(&other.to_string()));
        }
        self.to_number().partial_cmp(&other.to_number())
    }

    /// `+`: concatenation as soon as either side is not a primitive number-like
    pub fn add(&self, other: &Value<'_>) -> Value<'a> {
        if self.is_primitive() && other.is_primitive() {
            Value::Number(self.to_number() + other.to_number())
        } else {
            Value::Str(Cow::Owned(format!("{self}{other}")))
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

fn format_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // `1e+21`, `1.5e-7`
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                write!(f, "{mantissa}e+{exponent}")
            }
            _ => f.write_str(&text),
        }
    } else {
        write!(f, "{n}")
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => format_number(*n, f),
            Value::Str(s) => f.write_str(s),
            Value::Data(Json::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    match item {
                        Json::Null => {}
                        other => write!(f, "{}", Value::from_json(other))?,
                    }
                }
                Ok(())
            }
            Value::Data(Json::Object(_)) => f.write_str("[object Object]"),
            Value::Data(scalar) => write!(f, "{}", Value::from_json(scalar)),
            Value::Function(func) => write!(f, "{} => ...", func.param),
            Value::Signal(_, inner) => write!(f, "{inner}"),
        }
    }
}

impl PartialEq for Value<'_> {
    /// Structural equality, for tests and host-side comparisons
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Signal(ka, a), Value::Signal(kb, b)) => ka == kb && a == b,
            _ => self.strict_equals(other),
        }
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Str(Cow::Borrowed(s))
    }
}

impl From<String> for Value<'_> {
    fn from(s: String) -> Self {
        Value::Str(Cow::Owned(s))
    }
}
