//! Built-in operations registry.
//!
//! Every operator the parser can precompile lives in one table. Each entry records how
//! the evaluator must run it and whether it takes part in the multiple-values protocol.
//!
//! ## Kinds of operations
//!
//! - **Functions** take evaluated arguments and return exactly one value (`+`, `car`, ...).
//! - **Values functions** take evaluated arguments and write the values register
//!   (`values`, `values-list`, `floor/`, `truncate/`). Their return value is the primary
//!   value of what they produced.
//! - **Special forms** control evaluation of their arguments themselves (`if`, `lambda`,
//!   `multiple-value-call`, ...).
//!
//! ## Multiple values
//!
//! [`MultipleValues::Propagates`] marks operations that leave the register holding their
//! complete result whenever they return. The evaluator relies on it when a form is
//! evaluated for all of its values: anything not marked this way gets its single result
//! written to the register on its behalf.
//!
//! ## Strictness
//!
//! - No type coercion and no truthiness: `(not 1)` is a type error
//! - Integer overflow is reported, never wrapped
//! - Arity is checked at parse time for precompiled operators and at call time otherwise

use crate::Error;
use crate::ast::{NumberType, Value};
use crate::evaluator::multiple_values::{
    eval_multiple_value_bind, eval_multiple_value_call, eval_multiple_value_list,
    eval_multiple_value_prog1, eval_nth_value,
};
use crate::evaluator::{
    Environment, eval_and, eval_begin, eval_define, eval_if, eval_lambda, eval_or, eval_quote,
};
use crate::values::ValuesRegister;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Erased signature of single-valued builtins, also used for host-registered functions.
pub type BuiltinFn = dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync;

/// Builtins that write the values register and return its primary value.
pub type ValuesFn = fn(Vec<Value>, &mut ValuesRegister<Value>) -> Result<Value, Error>;

/// Special forms receive their arguments unevaluated, together with the evaluation
/// context and the current depth.
pub type SpecialFormFn =
    fn(&[Value], &mut Environment, &mut ValuesRegister<Value>, usize) -> Result<Value, Error>;

/// Argument count accepted by an operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive bounds
    Range(usize, usize),
}

impl Arity {
    pub fn validate(&self, arg_count: usize) -> Result<(), Error> {
        match *self {
            Arity::Exact(n) if arg_count != n => Err(Error::arity_error(n, arg_count)),
            Arity::AtLeast(n) if arg_count < n => Err(Error::arity_error(n, arg_count)),
            Arity::Range(min, _) if arg_count < min => Err(Error::arity_error(min, arg_count)),
            Arity::Range(_, max) if arg_count > max => Err(Error::arity_error(max, arg_count)),
            _ => Ok(()),
        }
    }
}

/// How an operation interacts with the values register
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MultipleValues {
    /// Yields one value and leaves the register alone
    PrimaryOnly,
    /// Always leaves its full result in the register
    Propagates,
}

#[derive(Clone)]
pub enum OpKind {
    Function(Arc<BuiltinFn>),
    ValuesFunction(ValuesFn),
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::ValuesFunction(_) => write!(f, "ValuesFunction(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    pub scheme_id: &'static str,
    pub op_kind: OpKind,
    pub arity: Arity,
    pub multiple_values: MultipleValues,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        self.scheme_id == other.scheme_id
    }
}

impl BuiltinOp {
    pub(crate) fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }

    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }

    pub(crate) fn propagates_values(&self) -> bool {
        self.multiple_values == MultipleValues::Propagates
    }
}

//
// Argument helpers
//

fn expect_number(value: &Value) -> Result<NumberType, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::TypeError(format!(
            "expected number, got {}",
            other.type_name()
        ))),
    }
}

fn expect_numbers(args: &[Value]) -> Result<Vec<NumberType>, Error> {
    args.iter().map(expect_number).collect()
}

fn expect_list<'a>(value: &'a Value, op: &str) -> Result<&'a [Value], Error> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(Error::TypeError(format!(
            "{op} requires a list, got {}",
            other.type_name()
        ))),
    }
}

fn overflow(op: &str) -> Error {
    Error::EvalError(format!("Integer overflow in {op}"))
}

//
// Single-valued builtins
//

macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            if args.len() < 2 {
                return Err(Error::arity_error(2, args.len()));
            }
            let nums = expect_numbers(args)?;
            Ok(Value::Bool(nums.windows(2).all(|pair| pair[0] $op pair[1])))
        }
    };
}

numeric_comparison!(builtin_eq, ==);
numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_ge, >=);

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let mut sum: NumberType = 0;
    for n in expect_numbers(args)? {
        sum = sum.checked_add(n).ok_or_else(|| overflow("addition"))?;
    }
    Ok(Value::Number(sum))
}

fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    match expect_numbers(args)?.as_slice() {
        [] => Err(Error::arity_error(1, 0)),
        [only] => only
            .checked_neg()
            .map(Value::Number)
            .ok_or_else(|| overflow("negation")),
        [first, rest @ ..] => {
            let mut result = *first;
            for n in rest {
                result = result
                    .checked_sub(*n)
                    .ok_or_else(|| overflow("subtraction"))?;
            }
            Ok(Value::Number(result))
        }
    }
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    let nums = expect_numbers(args)?;
    let Some((first, rest)) = nums.split_first() else {
        return Err(Error::arity_error(1, 0));
    };
    let mut product = *first;
    for n in rest {
        product = product
            .checked_mul(*n)
            .ok_or_else(|| overflow("multiplication"))?;
    }
    Ok(Value::Number(product))
}

fn builtin_max(args: &[Value]) -> Result<Value, Error> {
    expect_numbers(args)?
        .into_iter()
        .max()
        .map(Value::Number)
        .ok_or_else(|| Error::arity_error(1, 0))
}

fn builtin_min(args: &[Value]) -> Result<Value, Error> {
    expect_numbers(args)?
        .into_iter()
        .min()
        .map(Value::Number)
        .ok_or_else(|| Error::arity_error(1, 0))
}

fn builtin_not(args: &[Value]) -> Result<Value, Error> {
    match args {
        [Value::Bool(b)] => Ok(Value::Bool(!b)),
        [_] => Err(Error::TypeError("not requires a boolean argument".to_owned())),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_equal(args: &[Value]) -> Result<Value, Error> {
    match args {
        [first, second] => match (first, second) {
            (Value::Bool(_), Value::Bool(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Symbol(_), Value::Symbol(_))
            | (Value::List(_), Value::List(_)) => Ok(Value::Bool(first == second)),
            _ => Err(Error::TypeError(
                "equal? requires arguments of the same comparable type".to_owned(),
            )),
        },
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    match args {
        [list] => expect_list(list, "car")?
            .first()
            .cloned()
            .ok_or_else(|| Error::EvalError("car of empty list".into())),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    match args {
        [list] => match expect_list(list, "cdr")? {
            [] => Err(Error::EvalError("cdr of empty list".into())),
            [_, rest @ ..] => Ok(Value::List(rest.to_vec())),
        },
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    match args {
        [first, rest] => {
            let tail = expect_list(rest, "cons")?;
            let mut new_list = Vec::with_capacity(tail.len() + 1);
            new_list.push(first.clone());
            new_list.extend_from_slice(tail);
            Ok(Value::List(new_list))
        }
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.to_vec()))
}

fn builtin_null(args: &[Value]) -> Result<Value, Error> {
    match args {
        [value] => Ok(Value::Bool(value.is_nil())),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_length(args: &[Value]) -> Result<Value, Error> {
    match args {
        [list] => {
            let len = expect_list(list, "length")?.len();
            NumberType::try_from(len)
                .map(Value::Number)
                .map_err(|_| overflow("length"))
        }
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_string_append(args: &[Value]) -> Result<Value, Error> {
    let mut result = String::new();
    for arg in args {
        match arg {
            Value::String(s) => result.push_str(s),
            other => {
                return Err(Error::TypeError(format!(
                    "string-append requires strings, got {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(Value::String(result))
}

fn builtin_error(args: &[Value]) -> Result<Value, Error> {
    let parts: Vec<String> = args
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            _ => format!("{value}"),
        })
        .collect();

    let message = if parts.is_empty() {
        "Error".to_owned()
    } else {
        parts.join(" ")
    };

    Err(Error::EvalError(message))
}

//
// Values producers
//

fn builtin_values(args: Vec<Value>, values: &mut ValuesRegister<Value>) -> Result<Value, Error> {
    Ok(values.produce_many(args))
}

fn builtin_values_list(
    args: Vec<Value>,
    values: &mut ValuesRegister<Value>,
) -> Result<Value, Error> {
    match <[Value; 1]>::try_from(args) {
        Ok([Value::List(items)]) => Ok(values.produce_many(items)),
        Ok([other]) => Err(Error::TypeError(format!(
            "values-list requires a list, got {}",
            other.type_name()
        ))),
        Err(args) => Err(Error::arity_error(1, args.len())),
    }
}

/// Checked division producing `(quotient remainder)`, with the quotient rounded by
/// `round_quotient(truncated_quotient, remainder, divisor)`.
fn divide(
    args: &[Value],
    op: &str,
    round_quotient: fn(NumberType, NumberType, NumberType) -> (NumberType, NumberType),
) -> Result<[Value; 2], Error> {
    let [dividend, divisor] = args else {
        return Err(Error::arity_error(2, args.len()));
    };
    let (dividend, divisor) = (expect_number(dividend)?, expect_number(divisor)?);
    if divisor == 0 {
        return Err(Error::EvalError(format!("Division by zero in {op}")));
    }
    let quotient = dividend.checked_div(divisor).ok_or_else(|| overflow(op))?;
    let remainder = dividend.checked_rem(divisor).ok_or_else(|| overflow(op))?;
    let (quotient, remainder) = round_quotient(quotient, remainder, divisor);
    Ok([Value::Number(quotient), Value::Number(remainder)])
}

fn builtin_floor_div(args: Vec<Value>, values: &mut ValuesRegister<Value>) -> Result<Value, Error> {
    let results = divide(&args, "floor/", |q, r, d| {
        // Inexact with signs differing: truncation rounded toward zero, step down once.
        // A nonzero remainder implies |d| > 1, so q - 1 stays in range.
        if r != 0 && ((r < 0) != (d < 0)) {
            (q - 1, r + d)
        } else {
            (q, r)
        }
    })?;
    Ok(values.produce_many(results.to_vec()))
}

fn builtin_truncate_div(
    args: Vec<Value>,
    values: &mut ValuesRegister<Value>,
) -> Result<Value, Error> {
    let results = divide(&args, "truncate/", |q, r, _| (q, r))?;
    Ok(values.produce_many(results.to_vec()))
}

//
// Registry
//

static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    fn function(
        scheme_id: &'static str,
        f: fn(&[Value]) -> Result<Value, Error>,
        arity: Arity,
    ) -> BuiltinOp {
        BuiltinOp {
            scheme_id,
            op_kind: OpKind::Function(Arc::new(f)),
            arity,
            multiple_values: MultipleValues::PrimaryOnly,
        }
    }

    fn values_function(scheme_id: &'static str, f: ValuesFn, arity: Arity) -> BuiltinOp {
        BuiltinOp {
            scheme_id,
            op_kind: OpKind::ValuesFunction(f),
            arity,
            multiple_values: MultipleValues::Propagates,
        }
    }

    fn special_form(
        scheme_id: &'static str,
        f: SpecialFormFn,
        arity: Arity,
        multiple_values: MultipleValues,
    ) -> BuiltinOp {
        BuiltinOp {
            scheme_id,
            op_kind: OpKind::SpecialForm(f),
            arity,
            multiple_values,
        }
    }

    use MultipleValues::{PrimaryOnly, Propagates};

    vec![
        // Arithmetic
        function("+", builtin_add, Arity::AtLeast(0)),
        function("-", builtin_sub, Arity::AtLeast(1)),
        function("*", builtin_mul, Arity::AtLeast(1)),
        function("max", builtin_max, Arity::AtLeast(1)),
        function("min", builtin_min, Arity::AtLeast(1)),
        // Comparison
        function("=", builtin_eq, Arity::AtLeast(2)),
        function("<", builtin_lt, Arity::AtLeast(2)),
        function(">", builtin_gt, Arity::AtLeast(2)),
        function("<=", builtin_le, Arity::AtLeast(2)),
        function(">=", builtin_ge, Arity::AtLeast(2)),
        function("equal?", builtin_equal, Arity::Exact(2)),
        // Logic
        function("not", builtin_not, Arity::Exact(1)),
        special_form("and", eval_and, Arity::AtLeast(1), PrimaryOnly),
        special_form("or", eval_or, Arity::AtLeast(1), PrimaryOnly),
        // Lists and strings
        function("car", builtin_car, Arity::Exact(1)),
        function("cdr", builtin_cdr, Arity::Exact(1)),
        function("cons", builtin_cons, Arity::Exact(2)),
        function("list", builtin_list, Arity::AtLeast(0)),
        function("null?", builtin_null, Arity::Exact(1)),
        function("length", builtin_length, Arity::Exact(1)),
        function("string-append", builtin_string_append, Arity::AtLeast(0)),
        function("error", builtin_error, Arity::AtLeast(0)),
        // Language constructs
        special_form("quote", eval_quote, Arity::Exact(1), PrimaryOnly),
        special_form("define", eval_define, Arity::Exact(2), PrimaryOnly),
        special_form("lambda", eval_lambda, Arity::Exact(2), PrimaryOnly),
        special_form("if", eval_if, Arity::Exact(3), Propagates),
        special_form("begin", eval_begin, Arity::AtLeast(1), Propagates),
        // Multiple values
        values_function("values", builtin_values, Arity::AtLeast(0)),
        values_function("values-list", builtin_values_list, Arity::Exact(1)),
        values_function("floor/", builtin_floor_div, Arity::Exact(2)),
        values_function("truncate/", builtin_truncate_div, Arity::Exact(2)),
        special_form(
            "multiple-value-call",
            eval_multiple_value_call,
            Arity::AtLeast(1),
            Propagates,
        ),
        special_form(
            "multiple-value-list",
            eval_multiple_value_list,
            Arity::Exact(1),
            PrimaryOnly,
        ),
        special_form(
            "multiple-value-prog1",
            eval_multiple_value_prog1,
            Arity::AtLeast(1),
            Propagates,
        ),
        special_form(
            "multiple-value-bind",
            eval_multiple_value_bind,
            Arity::Exact(3),
            Propagates,
        ),
        special_form("nth-value", eval_nth_value, Arity::Exact(2), PrimaryOnly),
    ]
});

static BUILTIN_SCHEME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.scheme_id, op)).collect()
});

pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

pub(crate) fn find_scheme_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_SCHEME.get(id).copied()
}

/// Get the quote builtin operation - guaranteed to exist
#[cfg(feature = "scheme")]
pub(crate) fn get_quote_op() -> &'static BuiltinOp {
    find_scheme_op("quote").expect("quote builtin operation must be available")
}
