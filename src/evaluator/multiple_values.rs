//! Special forms that consume the values register.
//!
//! Each form evaluates exactly one designated subform for all of its values and reads
//! the register before anything else can overwrite it. Subforms evaluated in between
//! are bracketed with snapshot/restore where the result has to survive them.

use crate::Error;
use crate::ast::Value;
use crate::evaluator::{
    Environment, apply_function, collect_parameter_names, eval_args,
    eval_values_with_depth_tracking, eval_with_depth_tracking,
};
use crate::values::{EmptySentinel, ValuesRegister};

/// `(multiple-value-call f arg ... last)`
///
/// Leading arguments contribute their primary values; the last one contributes every
/// value it produced.
pub(crate) fn eval_multiple_value_call(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    let Some((func_expr, arg_exprs)) = args.split_first() else {
        return Err(Error::arity_error(1, 0));
    };
    let func = eval_with_depth_tracking(func_expr, env, values, depth + 1)?;

    // With no argument forms there is nothing to spread; the register is not consulted.
    let Some((last_expr, leading_exprs)) = arg_exprs.split_last() else {
        return apply_function(&func, Vec::new(), values, depth);
    };

    let leading_args = eval_args(leading_exprs, env, values, depth)?;
    eval_values_with_depth_tracking(last_expr, env, values, depth + 1)?;

    values.multiple_value_call(leading_args, |spread_args, values| {
        apply_function(&func, spread_args, values, depth)
    })
}

/// `(multiple-value-list form)`
pub(crate) fn eval_multiple_value_list(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [form] => {
            eval_values_with_depth_tracking(form, env, values, depth + 1)?;
            Ok(Value::List(values.snapshot()))
        }
        _ => Err(Error::arity_error(1, args.len())),
    }
}

/// `(multiple-value-prog1 first form ...)`
///
/// Yields the values of `first`; the remaining forms run for effect.
pub(crate) fn eval_multiple_value_prog1(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    let Some((first, rest)) = args.split_first() else {
        return Err(Error::arity_error(1, 0));
    };

    let primary = eval_values_with_depth_tracking(first, env, values, depth + 1)?;
    let saved = values.snapshot();
    for expr in rest {
        eval_with_depth_tracking(expr, env, values, depth + 1)?;
    }
    values.restore(saved);

    Ok(primary)
}

/// `(multiple-value-bind (var ...) form body)`
///
/// Variables without a corresponding value are bound to nil; surplus values are dropped.
pub(crate) fn eval_multiple_value_bind(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::List(var_list), form, body] => {
            let names = collect_parameter_names(var_list)?;
            eval_values_with_depth_tracking(form, env, values, depth + 1)?;

            let mut produced = values.snapshot().into_iter();
            let mut scope = Environment::with_parent(env.clone());
            for name in names {
                scope.define(name, produced.next().unwrap_or_else(Value::empty_sentinel));
            }

            eval_values_with_depth_tracking(body, &mut scope, values, depth + 1)
        }
        [_, _, _] => Err(Error::TypeError(
            "multiple-value-bind variables must be a list".to_owned(),
        )),
        _ => Err(Error::arity_error(3, args.len())),
    }
}

/// `(nth-value n form)`, nil when `form` produced fewer than `n + 1` values
pub(crate) fn eval_nth_value(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    let [index_expr, form] = args else {
        return Err(Error::arity_error(2, args.len()));
    };

    let index = match eval_with_depth_tracking(index_expr, env, values, depth + 1)? {
        Value::Number(n) => usize::try_from(n).map_err(|_| {
            Error::TypeError(format!("nth-value index must be non-negative, got {n}"))
        })?,
        other => {
            return Err(Error::TypeError(format!(
                "nth-value index must be a number, got {}",
                other.type_name()
            )));
        }
    };

    eval_values_with_depth_tracking(form, env, values, depth + 1)?;
    Ok(values
        .as_slice()
        .get(index)
        .cloned()
        .unwrap_or_else(Value::empty_sentinel))
}
