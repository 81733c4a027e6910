use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::Value;
use crate::builtinops::{BuiltinFn, BuiltinOp, OpKind, find_scheme_op, get_builtin_ops};
use crate::values::ValuesRegister;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) mod multiple_values;

/// Environment for variable bindings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    parent: Option<Box<Environment>>,
}

impl Environment {
    pub(crate) fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: None,
        }
    }

    pub(crate) fn with_parent(parent: Environment) -> Self {
        Environment {
            bindings: HashMap::new(),
            parent: Some(Box::new(parent)),
        }
    }

    pub(crate) fn define(&mut self, name: String, value: Value) {
        self.bindings.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.get(name)))
    }

    /// Register a host function callable from evaluated expressions.
    ///
    /// The function receives its evaluated arguments and returns a single value; when
    /// it is called in a context that wants all values, its result becomes the sole
    /// content of the values register.
    ///
    /// # Example
    /// ```
    /// use multival::evaluator::{create_global_env, eval};
    /// use multival::values::ValuesRegister;
    /// use multival::ast::Value;
    /// use multival::Error;
    ///
    /// fn count_args(args: &[Value]) -> Result<Value, Error> {
    ///     Ok(Value::Number(args.len() as i64))
    /// }
    ///
    /// let mut env = create_global_env();
    /// env.register_builtin_function("count-args", count_args);
    ///
    /// let call = Value::List(vec![
    ///     Value::Symbol("count-args".into()),
    ///     Value::Number(1),
    ///     Value::Number(2),
    /// ]);
    /// let mut values = ValuesRegister::new();
    /// assert_eq!(eval(&call, &mut env, &mut values).unwrap(), Value::Number(2));
    /// ```
    pub fn register_builtin_function(
        &mut self,
        name: &str,
        func: fn(&[Value]) -> Result<Value, Error>,
    ) {
        let wrapped: Arc<BuiltinFn> = Arc::new(func);
        self.bindings.insert(
            name.to_owned(),
            Value::BuiltinFunction {
                id: name.to_owned(),
                func: wrapped,
            },
        );
    }

    /// Get all bindings in this environment and its parents, sorted by name
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        if let Some(parent) = &self.parent {
            bindings.extend(parent.get_all_bindings());
        }
        for (name, value) in &self.bindings {
            bindings.insert(name.clone(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

/// An evaluator instance: one global environment plus the values register its
/// evaluations share.
///
/// Separate interpreters never observe each other's multiple values.
#[derive(Debug, Clone)]
pub struct Interpreter {
    env: Environment,
    values: ValuesRegister<Value>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            env: create_global_env(),
            values: ValuesRegister::new(),
        }
    }

    /// Evaluate a parsed expression for all of its values.
    ///
    /// Returns the primary value; [`Interpreter::values`] holds the full sequence
    /// afterwards.
    pub fn eval(&mut self, expr: &Value) -> Result<Value, Error> {
        eval_values(expr, &mut self.env, &mut self.values)
    }

    /// Parse (with `;` comments allowed) and evaluate one expression.
    #[cfg(feature = "scheme")]
    pub fn eval_str(&mut self, input: &str) -> Result<Value, Error> {
        let config = crate::scheme::ParseConfig {
            handle_comments: true,
        };
        let expr = crate::scheme::parse_scheme_with_config(input, config)?;
        self.eval(&expr)
    }

    pub fn values(&self) -> &ValuesRegister<Value> {
        &self.values
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }
}

/// Evaluate an expression for its primary value.
///
/// Literals, variable references and single-valued operators leave the register
/// alone. Procedure applications are producers and always record their result, so
/// after this returns the register holds whatever the last producer inside `expr`
/// left there. Use [`eval_values`] when the caller intends to read it.
pub fn eval(
    expr: &Value,
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, env, values, 0)
}

/// Evaluate an expression for all of its values.
///
/// On success `values` holds exactly the value sequence of `expr` and the primary
/// value is returned. Forms that yield a single ordinary value are recorded as a
/// one-element sequence, so the register never carries a stale result out of here.
pub fn eval_values(
    expr: &Value,
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
) -> Result<Value, Error> {
    eval_values_with_depth_tracking(expr, env, values, 0)
}

pub(crate) fn eval_with_depth_tracking(
    expr: &Value,
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::EvalError(format!(
            "Evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
        )));
    }
    match expr {
        // Empty lists are NOT self-evaluating
        Value::Number(_)
        | Value::String(_)
        | Value::Bool(_)
        | Value::BuiltinFunction { .. }
        | Value::ValuesBuiltin { .. }
        | Value::Function { .. }
        | Value::Unspecified => Ok(expr.clone()),

        Value::Symbol(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnboundVariable(name.clone())),

        // Arity was validated at parse time
        Value::PrecompiledOp { op, args, .. } => match &op.op_kind {
            OpKind::Function(f) => {
                let evaluated_args = eval_args(args, env, values, depth)?;
                f(&evaluated_args)
            }
            OpKind::ValuesFunction(f) => {
                let evaluated_args = eval_args(args, env, values, depth)?;
                f(evaluated_args, values)
            }
            OpKind::SpecialForm(special_form) => special_form(args, env, values, depth),
        },

        Value::List(elements) => {
            eval_list(elements, env, values, depth).map_err(|err| add_context(err, expr))
        }
    }
}

pub(crate) fn eval_values_with_depth_tracking(
    expr: &Value,
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    // Applications and propagating operators write the register themselves
    let writes_register = match expr {
        Value::PrecompiledOp { op, .. } => op.propagates_values(),
        Value::List(elements) => match special_form_head(elements) {
            Some((op, _)) => op.propagates_values(),
            None => !elements.is_empty(),
        },
        _ => false,
    };

    let primary = eval_with_depth_tracking(expr, env, values, depth)?;
    if writes_register {
        Ok(primary)
    } else {
        Ok(values.produce_one(primary))
    }
}

fn add_context(error: Error, expr: &Value) -> Error {
    let context = format!("while evaluating: {expr}");
    match error {
        Error::EvalError(msg) => Error::EvalError(format!("{msg}\n  Context: {context}")),
        Error::TypeError(msg) => Error::TypeError(format!("{msg}\n  Context: {context}")),
        other => other,
    }
}

/// Evaluate argument expressions left to right, each for its primary value
pub(crate) fn eval_args(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, env, values, depth + 1))
        .collect()
}

/// Special form named by the head of an unparsed list, split from its operands
fn special_form_head(elements: &[Value]) -> Option<(&'static BuiltinOp, &[Value])> {
    match elements {
        [Value::Symbol(name), arg_exprs @ ..] => find_scheme_op(name)
            .filter(|op| op.is_special_form())
            .map(|op| (op, arg_exprs)),
        _ => None,
    }
}

/// Dynamic function application (operators known at parse time are PrecompiledOps).
///
/// Lists built by hand never went through the parser, so a head naming a special form
/// is dispatched here with the same arity check the parser would have made.
fn eval_list(
    elements: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    if let Some((op, arg_exprs)) = special_form_head(elements)
        && let OpKind::SpecialForm(special_form) = &op.op_kind
    {
        if let Err(Error::ArityError { expected, got, .. }) = op.validate_arity(arg_exprs.len()) {
            return Err(Error::arity_error_with_expr(
                expected,
                got,
                Value::List(elements.to_vec()).to_string(),
            ));
        }
        return special_form(arg_exprs, env, values, depth);
    }

    match elements {
        [] => Err(Error::EvalError("Cannot evaluate empty list".to_owned())),
        [func_expr, arg_exprs @ ..] => {
            let func = eval_with_depth_tracking(func_expr, env, values, depth + 1)?;
            let args = eval_args(arg_exprs, env, values, depth + 1)?;
            apply_function(&func, args, values, depth)
        }
    }
}

/// Apply a procedure to evaluated arguments.
///
/// Always leaves the callee's complete result in the register: lambda bodies are
/// evaluated for all their values, and single-valued builtins record their one result.
pub(crate) fn apply_function(
    func: &Value,
    args: Vec<Value>,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    match func {
        Value::BuiltinFunction { func, .. } => {
            let result = func(&args)?;
            Ok(values.produce_one(result))
        }
        Value::ValuesBuiltin { func, .. } => func(args, values),
        Value::Function {
            params,
            body,
            env: closure_env,
        } => {
            if params.len() != args.len() {
                return Err(Error::arity_error(params.len(), args.len()));
            }

            let mut new_env = Environment::with_parent(closure_env.clone());
            for (param, arg) in params.iter().zip(args) {
                new_env.define(param.clone(), arg);
            }

            eval_values_with_depth_tracking(body, &mut new_env, values, depth + 1).map_err(|err| {
                match err {
                    Error::EvalError(msg) => {
                        Error::EvalError(format!("{msg}\n  In lambda: {body}"))
                    }
                    Error::TypeError(msg) => {
                        Error::TypeError(format!("{msg}\n  In lambda: {body}"))
                    }
                    other => other,
                }
            })
        }
        _ => Err(Error::TypeError(format!(
            "Cannot apply non-function: {func}"
        ))),
    }
}

pub(crate) fn eval_quote(
    args: &[Value],
    _env: &mut Environment,
    _values: &mut ValuesRegister<Value>,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

pub(crate) fn eval_define(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval_with_depth_tracking(expr, env, values, depth + 1)?;
            env.define(name.clone(), value);
            Ok(Value::Unspecified)
        }
        [_, _] => Err(Error::TypeError("define requires a symbol".to_owned())),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// The chosen branch is in tail position and passes its values through
pub(crate) fn eval_if(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    match args {
        [condition_expr, then_expr, else_expr] => {
            let branch = match eval_with_depth_tracking(condition_expr, env, values, depth + 1)? {
                Value::Bool(true) => then_expr,
                Value::Bool(false) => else_expr,
                _ => {
                    return Err(Error::TypeError(
                        "if condition must be a boolean".to_owned(),
                    ));
                }
            };
            eval_values_with_depth_tracking(branch, env, values, depth + 1)
        }
        _ => Err(Error::arity_error(3, args.len())),
    }
}

/// Evaluate forms in order; the last one passes its values through
pub(crate) fn eval_begin(
    args: &[Value],
    env: &mut Environment,
    values: &mut ValuesRegister<Value>,
    depth: usize,
) -> Result<Value, Error> {
    let Some((last, init)) = args.split_last() else {
        return Err(Error::arity_error(1, 0));
    };
    for expr in init {
        eval_with_depth_tracking(expr, env, values, depth + 1)?;
    }
    eval_values_with_depth_tracking(last, env, values, depth + 1)
}

pub(crate) fn eval_lambda(
    args: &[Value],
    env: &mut Environment,
    _values: &mut ValuesRegister<Value>,
    _depth: usize,
) -> Result<Value, Error> {
    match args {
        [Value::List(param_list), body] => {
            let params = collect_parameter_names(param_list)?;
            Ok(Value::Function {
                params,
                body: Box::new(body.clone()),
                env: env.clone(),
            })
        }
        [_, _] => Err(Error::TypeError(
            "Lambda parameters must be a list".to_owned(),
        )),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Symbols of a binding list, rejecting duplicates
pub(crate) fn collect_parameter_names(param_list: &[Value]) -> Result<Vec<String>, Error> {
    let mut params: Vec<String> = Vec::with_capacity(param_list.len());
    for param in param_list {
        match param {
            Value::Symbol(name) if params.contains(name) => {
                return Err(Error::EvalError(format!(
                    "Duplicate parameter name: {name}"
                )));
            }
            Value::Symbol(name) => params.push(name.clone()),
            _ => {
                return Err(Error::TypeError(
                    "Lambda parameters must be symbols".to_owned(),
                ));
            }
        }
    }
    Ok(params)
}

/// Literals that can never evaluate to a boolean
fn is_obviously_non_boolean(value: &Value) -> bool {
    matches!(
        value,
        Value::Number(_) | Value::String(_) | Value::Unspecified
    )
}

macro_rules! boolean_logic_op {
    ($name:ident, $op_name:expr, $short_circuit:literal, $default:literal) => {
        pub(crate) fn $name(
            args: &[Value],
            env: &mut Environment,
            values: &mut ValuesRegister<Value>,
            depth: usize,
        ) -> Result<Value, Error> {
            if args.is_empty() {
                return Err(Error::arity_error(1, 0));
            }

            let type_error = || {
                Error::TypeError(
                    concat!("'", $op_name, "' requires boolean arguments (no truthiness)")
                        .to_owned(),
                )
            };

            // Reject literal non-booleans before short-circuiting can hide them
            if args.iter().any(is_obviously_non_boolean) {
                return Err(type_error());
            }

            for arg in args {
                match eval_with_depth_tracking(arg, env, values, depth + 1)? {
                    Value::Bool($short_circuit) => return Ok(Value::Bool($short_circuit)),
                    Value::Bool(_) => continue,
                    _ => return Err(type_error()),
                }
            }

            Ok(Value::Bool($default))
        }
    };
}

boolean_logic_op!(eval_and, "and", false, true);
boolean_logic_op!(eval_or, "or", true, false);

/// Create a global environment binding every builtin procedure by name.
///
/// Special forms are syntax and are only reachable in operator position.
pub fn create_global_env() -> Environment {
    let mut env = Environment::new();

    for builtin_op in get_builtin_ops() {
        let id = builtin_op.scheme_id.to_owned();
        let binding = match &builtin_op.op_kind {
            OpKind::Function(func) => Value::BuiltinFunction {
                id: id.clone(),
                func: Arc::clone(func),
            },
            OpKind::ValuesFunction(func) => Value::ValuesBuiltin {
                id: id.clone(),
                func: *func,
            },
            OpKind::SpecialForm(_) => continue,
        };
        env.define(id, binding);
    }

    env
}
