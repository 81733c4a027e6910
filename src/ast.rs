//! The dynamically-typed [`Value`] shared by the parser, the evaluator and the
//! multiple-values register.
//!
//! `Value` doubles as the AST: source forms are values, and lists headed by a known
//! operator are turned into [`Value::PrecompiledOp`] at parse time. Nil (the empty list)
//! is the language's encoding of "no values", so `Value` is the register's
//! [`EmptySentinel`].
//!
//! Crate-internal helpers `val`, `sym` and `nil` keep hand-built ASTs readable in tests.

use crate::builtinops::{BuiltinFn, BuiltinOp, ValuesFn};
use crate::evaluator::Environment;
use crate::values::EmptySentinel;
use std::sync::Arc;

/// Type alias for number values in interpreter
pub(crate) type NumberType = i64;

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/<>=!?_$";

/// Valid: non-empty, no leading digit, no "-digit" prefix, alphanumeric + SYMBOL_SPECIAL_CHARS
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false,
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if first_char == '-'
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Number(NumberType),
    Symbol(String),
    String(String),
    Bool(bool),
    /// Proper lists; the empty list is nil
    List(Vec<Value>),
    /// Operator application resolved at parse time
    PrecompiledOp {
        op: &'static BuiltinOp,
        op_id: String,
        args: Vec<Value>,
    },
    /// Host function reached through a symbol, compared by id
    BuiltinFunction { id: String, func: Arc<BuiltinFn> },
    /// Host function that writes the values register, compared by id
    ValuesBuiltin { id: String, func: ValuesFn },
    /// Lambda closure
    Function {
        params: Vec<String>,
        body: Box<Value>,
        env: Environment,
    },
    /// Result of forms evaluated for effect, such as `define`.
    /// Never equal to anything, itself included.
    Unspecified,
}

impl EmptySentinel for Value {
    fn empty_sentinel() -> Self {
        Value::List(vec![])
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::String(s) => write!(f, "String(\"{s}\")"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::List(list) => {
                write!(f, "List(")?;
                write_separated(f, list, ", ", |f, v| write!(f, "{v:?}"))?;
                write!(f, ")")
            }
            Value::PrecompiledOp { op_id, args, .. } => {
                write!(f, "PrecompiledOp({op_id}, args=[")?;
                write_separated(f, args, ", ", |f, v| write!(f, "{v:?}"))?;
                write!(f, "])")
            }
            Value::BuiltinFunction { id, .. } => write!(f, "BuiltinFunction({id})"),
            Value::ValuesBuiltin { id, .. } => write!(f, "ValuesBuiltin({id})"),
            Value::Function { params, body, .. } => {
                write!(f, "Function(params={params:?}, body={body:?})")
            }
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

fn write_separated(
    f: &mut std::fmt::Formatter<'_>,
    items: &[Value],
    separator: &str,
    mut write_item: impl FnMut(&mut std::fmt::Formatter<'_>, &Value) -> std::fmt::Result,
) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write_item(f, item)?;
    }
    Ok(())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::String(s) => {
                write!(f, "\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => write!(f, "\\\"")?,
                        '\\' => write!(f, "\\\\")?,
                        '\n' => write!(f, "\\n")?,
                        '\t' => write!(f, "\\t")?,
                        '\r' => write!(f, "\\r")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "\"")
            }
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::List(elements) => {
                write!(f, "(")?;
                write_separated(f, elements, " ", |f, v| write!(f, "{v}"))?;
                write!(f, ")")
            }
            Value::PrecompiledOp { .. } => write!(f, "{}", self.to_uncompiled_form()),
            Value::BuiltinFunction { id, .. } | Value::ValuesBuiltin { id, .. } => {
                write!(f, "#<builtin-function:{id}>")
            }
            Value::Function { .. } => write!(f, "#<function>"),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (
                Value::PrecompiledOp {
                    op_id: id1,
                    args: args1,
                    ..
                },
                Value::PrecompiledOp {
                    op_id: id2,
                    args: args2,
                    ..
                },
            ) => id1 == id2 && args1 == args2,
            (Value::BuiltinFunction { id: id1, .. }, Value::BuiltinFunction { id: id2, .. })
            | (Value::ValuesBuiltin { id: id1, .. }, Value::ValuesBuiltin { id: id2, .. }) => {
                id1 == id2
            }
            (
                Value::Function {
                    params: p1,
                    body: b1,
                    env: e1,
                },
                Value::Function {
                    params: p2,
                    body: b2,
                    env: e2,
                },
            ) => p1 == p2 && b1 == b2 && e1 == e2,
            _ => false,
        }
    }
}

impl Value {
    /// Turn precompiled operations back into plain lists, recursively
    pub(crate) fn to_uncompiled_form(&self) -> Value {
        match self {
            Value::PrecompiledOp { op, args, .. } => {
                let mut elements = vec![Value::Symbol(op.scheme_id.to_owned())];
                elements.extend(args.iter().map(Value::to_uncompiled_form));
                Value::List(elements)
            }
            Value::List(elements) => {
                Value::List(elements.iter().map(Value::to_uncompiled_form).collect())
            }
            other => other.clone(),
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    /// Short name of the value's type, for error messages
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Symbol(_) => "symbol",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::PrecompiledOp { .. } => "expression",
            Value::BuiltinFunction { .. }
            | Value::ValuesBuiltin { .. }
            | Value::Function { .. } => "procedure",
            Value::Unspecified => "unspecified",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($($int_type:ty),*) => {
        $(
            impl From<$int_type> for Value {
                fn from(n: $int_type) -> Self {
                    Value::Number(NumberType::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, NumberType, u8, u16, u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(slice: &[T]) -> Self {
        Value::List(slice.iter().cloned().map(Into::into).collect())
    }
}

/// Helper for building symbols in mixed lists
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper for building values from Rust literals
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// The empty list
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Value {
    Value::List(vec![])
}
