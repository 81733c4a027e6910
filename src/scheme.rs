//! S-expression reader.
//!
//! Lists headed by a registered operator are precompiled into [`Value::PrecompiledOp`]
//! and their arity is checked before evaluation starts. Quoted data is kept as plain
//! lists.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, opt, recognize, value},
    error::ErrorKind,
    multi::{many0, many1, separated_list0},
    sequence::{pair, preceded, terminated},
};

use crate::ast::{NumberType, SYMBOL_SPECIAL_CHARS, Value, is_valid_symbol};
use crate::builtinops::{find_scheme_op, get_quote_op};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Reader options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParseConfig {
    /// Treat `;` up to the end of the line as whitespace
    pub handle_comments: bool,
}

/// Helper function to create a quote PrecompiledOp
fn create_quote_precompiled_op(content: Value) -> Value {
    let builtin_op = get_quote_op();
    Value::PrecompiledOp {
        op: builtin_op,
        op_id: builtin_op.scheme_id.into(),
        args: vec![content],
    }
}

/// Control whether builtin operations should be precompiled during parsing
#[derive(Debug, Clone, Copy, PartialEq)]
enum ShouldPrecompileOps {
    Yes,
    No,
}

/// Convert nom parsing errors into structured parse errors
fn nom_error_to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            match e.code {
                ErrorKind::TooLarge => ParseError::with_context(
                    ParseErrorKind::TooDeeplyNested,
                    format!("Expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                    input,
                    position,
                ),
                ErrorKind::Digit | ErrorKind::HexDigit => ParseError::with_context(
                    ParseErrorKind::ImplementationLimit,
                    "Integer literal out of range",
                    input,
                    position,
                ),
                ErrorKind::Float => ParseError::with_context(
                    ParseErrorKind::Unsupported,
                    "Floating point numbers are not supported",
                    input,
                    position,
                ),
                _ if position >= input.len() => ParseError::with_context(
                    ParseErrorKind::Incomplete,
                    "Unexpected end of input",
                    input,
                    position,
                ),
                _ => {
                    let remaining_chars: String = e.input.chars().take(10).collect();
                    ParseError::with_context_and_found(
                        ParseErrorKind::InvalidSyntax,
                        format!("Invalid syntax near '{remaining_chars}'"),
                        input,
                        position,
                        e.input.chars().next().map(String::from),
                    )
                }
            }
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "Incomplete input")
        }
    }
}

/// `;` through the end of the line
fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), take_while(|c: char| c != '\n'))).parse(input)
}

/// Zero or more whitespace characters (and comments, when enabled)
fn skip_whitespace(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    if config.handle_comments {
        value((), many0(alt((multispace1, line_comment)))).parse(input)
    } else {
        value((), multispace0).parse(input)
    }
}

/// Separator between list elements: at least one whitespace character or comment
fn skip_separator(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    if config.handle_comments {
        value((), many1(alt((multispace1, line_comment)))).parse(input)
    } else {
        value((), multispace1).parse(input)
    }
}

/// Parse a number (integer only, supports decimal and hexadecimal)
fn parse_number(input: &str) -> IResult<&str, Value> {
    alt((parse_hexadecimal, parse_decimal)).parse(input)
}

/// Parse a decimal number
fn parse_decimal(input: &str) -> IResult<&str, Value> {
    let (input, number_str) = recognize(pair(
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit()),
    ))
    .parse(input)?;

    let mut fraction = input.chars();
    if fraction.next() == Some('.') && fraction.next().is_some_and(|c| c.is_ascii_digit()) {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Float,
        )));
    }

    match number_str.parse::<NumberType>() {
        Ok(n) => Ok((input, Value::Number(n))),
        // Only overflow gets here; the digits were already matched
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Digit,
        ))),
    }
}

/// Parse a hexadecimal number (#x or #X prefix)
fn parse_hexadecimal(input: &str) -> IResult<&str, Value> {
    let (input, _) = char('#').parse(input)?;
    let (input, _) = alt((char('x'), char('X'))).parse(input)?;
    let (input, hex_digits) = take_while1(|c: char| c.is_ascii_hexdigit()).parse(input)?;

    match NumberType::from_str_radix(hex_digits, 16) {
        Ok(n) => Ok((input, Value::Number(n))),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::HexDigit,
        ))),
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Value> {
    alt((
        value(Value::Bool(true), tag("#t")),
        value(Value::Bool(false), tag("#f")),
    ))
    .parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let mut symbol_chars =
        take_while1(|c: char| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c));

    let (remaining, candidate) = symbol_chars.parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, Value::Symbol(candidate.into())))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Parse a string literal. Once the opening quote is seen the string is committed:
/// a bad escape or a missing closing quote is a failure, not a backtrack.
fn parse_string(input: &str) -> IResult<&str, Value> {
    let (mut remaining, _) = char('"').parse(input)?;
    let mut chars = String::new();

    loop {
        let mut char_iter = remaining.chars();
        match char_iter.next() {
            Some('"') => return Ok((char_iter.as_str(), Value::String(chars))),
            Some('\\') => {
                match char_iter.next() {
                    Some('n') => chars.push('\n'),
                    Some('t') => chars.push('\t'),
                    Some('r') => chars.push('\r'),
                    Some('\\') => chars.push('\\'),
                    Some('"') => chars.push('"'),
                    Some(_) => {
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            remaining,
                            ErrorKind::Escaped,
                        )));
                    }
                    // Backslash at end of input
                    None => {
                        return Err(nom::Err::Failure(nom::error::Error::new(
                            char_iter.as_str(),
                            ErrorKind::Char,
                        )));
                    }
                }
                remaining = char_iter.as_str();
            }
            Some(ch) => {
                chars.push(ch);
                remaining = char_iter.as_str();
            }
            None => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    remaining,
                    ErrorKind::Char,
                )));
            }
        }
    }
}

/// Parse a list, precompiling it when it is headed by a known operator
fn parse_list(
    input: &str,
    should_precompile: ShouldPrecompileOps,
    config: ParseConfig,
    depth: usize,
) -> IResult<&str, Value> {
    let (input, _) = char('(').parse(input)?;
    let (input, _) = skip_whitespace(input, config)?;

    // Early quote detection to avoid backtracking; `(quote)` falls through to the
    // arity check below
    let (input, is_quote) =
        opt(terminated(tag("quote"), |i| skip_separator(i, config))).parse(input)?;

    if is_quote.is_some() {
        let (input, content) = parse_sexpr(input, ShouldPrecompileOps::No, config, depth + 1)?;
        let (input, _) = skip_whitespace(input, config)?;
        let (input, _) = cut(char(')')).parse(input)?;

        if should_precompile == ShouldPrecompileOps::Yes {
            return Ok((input, create_quote_precompiled_op(content)));
        }
        return Ok((
            input,
            Value::List(vec![Value::Symbol("quote".into()), content]),
        ));
    }

    let (input, elements) = separated_list0(
        |i| skip_separator(i, config),
        |i| parse_sexpr(i, should_precompile, config, depth + 1),
    )
    .parse(input)?;

    let (input, _) = skip_whitespace(input, config)?;
    let (input, _) = cut(char(')')).parse(input)?;

    if should_precompile == ShouldPrecompileOps::Yes
        && let [Value::Symbol(op_name), args @ ..] = elements.as_slice()
        && let Some(builtin_op) = find_scheme_op(op_name.as_str())
    {
        return Ok((
            input,
            Value::PrecompiledOp {
                op: builtin_op,
                op_id: builtin_op.scheme_id.into(),
                args: args.to_vec(),
            },
        ));
    }

    Ok((input, Value::List(elements)))
}

/// Parse an S-expression with configurable precompilation behavior
fn parse_sexpr(
    input: &str,
    should_precompile: ShouldPrecompileOps,
    config: ParseConfig,
    depth: usize,
) -> IResult<&str, Value> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    preceded(
        |i| skip_whitespace(i, config),
        alt((
            |i| parse_quote(i, should_precompile, config, depth),
            |i| parse_list(i, should_precompile, config, depth),
            parse_number,
            parse_bool,
            parse_string,
            parse_symbol,
        )),
    )
    .parse(input)
}

/// Parse quoted expression ('expr -> (quote expr))
fn parse_quote(
    input: &str,
    should_precompile: ShouldPrecompileOps,
    config: ParseConfig,
    depth: usize,
) -> IResult<&str, Value> {
    let (input, _) = char('\'').parse(input)?;
    let (input, expr) = parse_sexpr(input, ShouldPrecompileOps::No, config, depth + 1)?;

    if should_precompile == ShouldPrecompileOps::Yes {
        return Ok((input, create_quote_precompiled_op(expr)));
    }
    Ok((
        input,
        Value::List(vec![Value::Symbol("quote".into()), expr]),
    ))
}

/// Parse a complete S-expression from input, without comment support.
pub fn parse_scheme(input: &str) -> Result<Value, Error> {
    parse_scheme_with_config(input, ParseConfig::default())
}

/// Parse a complete S-expression from input.
///
/// Exactly one expression is accepted; anything but whitespace (or comments) after it
/// is reported as [`ParseErrorKind::TrailingContent`].
pub fn parse_scheme_with_config(input: &str, config: ParseConfig) -> Result<Value, Error> {
    match terminated(
        |i| parse_sexpr(i, ShouldPrecompileOps::Yes, config, 0),
        |i| skip_whitespace(i, config),
    )
    .parse(input)
    {
        Ok(("", value)) => {
            validate_arity_in_ast(&value)?;
            Ok(value)
        }
        Ok((remaining, _)) => {
            let position = input.len() - remaining.len();
            Err(Error::ParseError(ParseError::with_context_and_found(
                ParseErrorKind::TrailingContent,
                "Unexpected input after expression",
                input,
                position,
                Some(remaining.chars().take(20).collect()),
            )))
        }
        Err(e) => Err(Error::ParseError(nom_error_to_parse_error(input, e))),
    }
}

/// Recursively validate arity in parsed AST - simpler than threading through parser
fn validate_arity_in_ast(value: &Value) -> Result<(), Error> {
    match value {
        Value::PrecompiledOp { op, args, .. } => {
            if let Err(Error::ArityError { expected, got, .. }) = op.validate_arity(args.len()) {
                return Err(Error::arity_error_with_expr(
                    expected,
                    got,
                    format!("{}", value.to_uncompiled_form()),
                ));
            }
            for arg in args {
                validate_arity_in_ast(arg)?;
            }
        }
        Value::List(elements) => {
            for element in elements {
                validate_arity_in_ast(element)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};

    /// Test result variants for comprehensive parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        Success(Value), // Parsing should succeed with this value
        SuccessPrecompiledOp(&'static str, Vec<Value>), // Should succeed with PrecompiledOp(scheme_id, args)
        SemanticallyEquivalent(Value), // Should succeed and be semantically equivalent (for quote shorthand)
        SpecificError(&'static str),   // Parsing should fail with error containing this string
        AnyError,                         // Parsing should fail (any error)
    }
    use ParseTestResult::*;

    fn success<T: Into<Value>>(value: T) -> ParseTestResult {
        Success(value.into())
    }

    fn precompiled_op(scheme_id: &'static str, args: Vec<Value>) -> ParseTestResult {
        SuccessPrecompiledOp(scheme_id, args)
    }

    fn semantically_equivalent<T: Into<Value>>(value: T) -> ParseTestResult {
        SemanticallyEquivalent(value.into())
    }

    fn assert_round_trip(test_id: &str, input: &str, actual: &Value) {
        let displayed = format!("{actual}");
        let reparsed = parse_scheme(&displayed).unwrap_or_else(|e| {
            panic!("{test_id}: round-trip parse failed for '{displayed}': {e:?}")
        });
        assert_eq!(
            displayed,
            format!("{reparsed}"),
            "{test_id}: round-trip display mismatch for '{input}'"
        );
    }

    /// Run parse tests under the given config; successful parses are also printed and
    /// reparsed to check that display output is valid input
    fn run_parse_tests_with_config(test_cases: Vec<(&str, ParseTestResult)>, config: ParseConfig) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Parse test #{} '{input}'", i + 1);
            let result = parse_scheme_with_config(input, config);

            match (result, expected) {
                (Ok(actual), Success(expected_val)) => {
                    assert_eq!(actual, *expected_val, "{test_id}: value mismatch");
                    assert_round_trip(&test_id, input, &actual);
                }
                (Ok(actual), SuccessPrecompiledOp(expected_scheme_id, expected_args)) => {
                    let Value::PrecompiledOp { op_id, args, .. } = &actual else {
                        panic!("{test_id}: expected PrecompiledOp, got {actual:?}");
                    };
                    assert_eq!(op_id, expected_scheme_id, "{test_id}: scheme_id mismatch");
                    assert_eq!(args, expected_args, "{test_id}: args mismatch");
                    assert_round_trip(&test_id, input, &actual);
                }
                (Ok(actual), SemanticallyEquivalent(expected_val)) => {
                    assert_eq!(
                        actual.to_uncompiled_form(),
                        *expected_val,
                        "{test_id}: semantic equivalence mismatch"
                    );
                    assert_round_trip(&test_id, input, &actual);
                }

                (Err(_), AnyError) => {}
                (Err(err), SpecificError(expected_text)) => {
                    let error_msg = format!("{err:?}");
                    assert!(
                        error_msg.contains(expected_text),
                        "{test_id}: error should contain '{expected_text}', got {error_msg}"
                    );
                }

                (Ok(actual), AnyError | SpecificError(_)) => {
                    panic!("{test_id}: expected error, got {actual:?}");
                }
                (Err(err), _) => {
                    panic!("{test_id}: expected success, got error {err:?}");
                }
            }
        }
    }

    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        run_parse_tests_with_config(test_cases, ParseConfig::default());
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_parser_comprehensive() {
        let test_cases = vec![
            // ===== NUMBER PARSING =====
            ("42", success(42)),
            ("-5", success(-5)),
            ("0", success(0)),
            ("-0", success(0)),
            ("#x1A", success(26)),
            ("#X1a", success(26)),
            ("#xff", success(255)),
            ("9223372036854775807", success(i64::MAX)),
            ("-9223372036854775808", success(i64::MIN)),
            ("3.14", SpecificError("Unsupported")),
            ("(+ 1 -0.5)", SpecificError("Unsupported")),
            ("#xG", AnyError),
            ("#x", AnyError),
            ("#y123", AnyError),
            ("123abc", AnyError),
            ("99999999999999999999", SpecificError("out of range")),
            ("-99999999999999999999", SpecificError("out of range")),
            ("#x10000000000000000", SpecificError("out of range")),
            // ===== SYMBOL PARSING =====
            ("foo", success(sym("foo"))),
            ("+", success(sym("+"))),
            (">=", success(sym(">="))),
            ("-", success(sym("-"))),
            ("-abc", success(sym("-abc"))),
            ("floor/", success(sym("floor/"))),
            ("values-list", success(sym("values-list"))),
            ("multiple-value-call", success(sym("multiple-value-call"))),
            ("null?", success(sym("null?"))),
            ("test_name$", success(sym("test_name$"))),
            ("123var", AnyError),
            ("-42name", AnyError),
            ("test space", AnyError),
            ("test@home", AnyError),
            ("test#tag", AnyError),
            // ===== BOOLEAN PARSING =====
            ("#t", success(true)),
            ("#f", success(false)),
            ("#T", AnyError),
            ("#true", AnyError),
            // ===== STRING PARSING =====
            ("\"hello world\"", success("hello world")),
            (r#""hello\nworld""#, success("hello\nworld")),
            (r#""tab\there""#, success("tab\there")),
            (r#""quote\"test""#, success("quote\"test")),
            (r#""backslash\\test""#, success("backslash\\test")),
            ("\"\"", success("")),
            ("\"a;b\"", success("a;b")),
            (r#""other\xchar""#, SpecificError("InvalidSyntax")),
            (r#""unterminated"#, SpecificError("Incomplete")),
            (r#""unterminated\"#, SpecificError("Incomplete")),
            // ===== LISTS =====
            ("()", success(nil())),
            ("(   )", success(nil())),
            ("(42)", success([42])),
            (
                "(1 hello \"world\" #t)",
                success([val(1), sym("hello"), val("world"), val(true)]),
            ),
            ("( 1   2\t\n3 )", success([1, 2, 3])),
            ("((1 2) (3 4))", success([[1, 2], [3, 4]])),
            ("(foo 1 2)", success([sym("foo"), val(1), val(2)])),
            // A head that merely starts with "quote" is an ordinary symbol
            ("(quoted 1)", success([sym("quoted"), val(1)])),
            (
                "((+ 1 2) (foo bar))",
                success([
                    val(Value::PrecompiledOp {
                        op: find_scheme_op("+").unwrap(),
                        op_id: "+".into(),
                        args: vec![val(1), val(2)],
                    }),
                    val([sym("foo"), sym("bar")]),
                ]),
            ),
            // ===== PRECOMPILED OPERATORS =====
            ("(+ 1 2)", precompiled_op("+", vec![val(1), val(2)])),
            (
                "(if #t 1 2)",
                precompiled_op("if", vec![val(true), val(1), val(2)]),
            ),
            ("(values)", precompiled_op("values", vec![])),
            (
                "(values 1 2 3)",
                precompiled_op("values", vec![val(1), val(2), val(3)]),
            ),
            (
                "(floor/ 17 5)",
                precompiled_op("floor/", vec![val(17), val(5)]),
            ),
            (
                "(multiple-value-call + 1)",
                precompiled_op("multiple-value-call", vec![sym("+"), val(1)]),
            ),
            (
                "(multiple-value-list 5)",
                precompiled_op("multiple-value-list", vec![val(5)]),
            ),
            (
                "(multiple-value-bind (q r) x q)",
                precompiled_op(
                    "multiple-value-bind",
                    vec![val([sym("q"), sym("r")]), sym("x"), sym("q")],
                ),
            ),
            (
                "(nth-value 0 x)",
                precompiled_op("nth-value", vec![val(0), sym("x")]),
            ),
            (
                "(car (list 1 2 3))",
                precompiled_op(
                    "car",
                    vec![val(Value::PrecompiledOp {
                        op: find_scheme_op("list").unwrap(),
                        op_id: "list".into(),
                        args: vec![val(1), val(2), val(3)],
                    })],
                ),
            ),
            // ===== QUOTE PARSING =====
            (
                "'foo",
                semantically_equivalent(val([sym("quote"), sym("foo")])),
            ),
            (
                "'(values 1 2)",
                semantically_equivalent(val([
                    sym("quote"),
                    val(vec![sym("values"), val(1), val(2)]),
                ])),
            ),
            ("'()", semantically_equivalent(val([sym("quote"), nil()]))),
            ("(quote foo)", precompiled_op("quote", vec![sym("foo")])),
            ("(quote)", SpecificError("ArityError")),
            // ===== PARSE-TIME ARITY ERRORS =====
            ("(if #t 1)", SpecificError("ArityError")),
            ("(if #t 42 0 extra)", SpecificError("ArityError")),
            ("(and)", SpecificError("ArityError")),
            ("(not #t #f)", SpecificError("ArityError")),
            ("(car)", SpecificError("ArityError")),
            ("(multiple-value-call)", SpecificError("ArityError")),
            ("(multiple-value-list)", SpecificError("ArityError")),
            ("(multiple-value-list 1 2)", SpecificError("ArityError")),
            ("(multiple-value-prog1)", SpecificError("ArityError")),
            ("(multiple-value-bind (a) 1)", SpecificError("ArityError")),
            ("(nth-value 0)", SpecificError("ArityError")),
            ("(floor/ 1)", SpecificError("ArityError")),
            ("(values-list)", SpecificError("ArityError")),
            ("(list (not) 42)", SpecificError("ArityError")),
            // ===== SYNTAX ERRORS =====
            ("(+ 1 (- 2", SpecificError("Incomplete")),
            ("((1 2)", SpecificError("Incomplete")),
            ("1 2 3)", SpecificError("TrailingContent")),
            ("(1 2))", SpecificError("TrailingContent")),
            ("(+ 1 2) (+ 3 4)", SpecificError("TrailingContent")),
            (")", SpecificError("InvalidSyntax")),
            ("@invalid", SpecificError("InvalidSyntax")),
            ("", SpecificError("Incomplete")),
            ("   ", SpecificError("Incomplete")),
            // Comments are off by default
            ("; note\n42", SpecificError("InvalidSyntax")),
        ];

        run_parse_tests(test_cases);
    }

    #[test]
    fn test_comments() {
        let config = ParseConfig {
            handle_comments: true,
        };
        let test_cases = vec![
            ("; leading\n42", success(42)),
            ("42 ; trailing", success(42)),
            ("; one\n; two\n  #t  ; three", success(true)),
            ("(1 ; first\n 2)", success([1, 2])),
            ("(1;tight\n2)", success([1, 2])),
            ("(;empty\n)", success(nil())),
            (
                "(values 1 ; primary\n 2)",
                precompiled_op("values", vec![val(1), val(2)]),
            ),
            (
                "'(a ; quoted\n b)",
                semantically_equivalent(val([sym("quote"), val([sym("a"), sym("b")])])),
            ),
            ("\"a ; b\"", success("a ; b")),
            ("; nothing", SpecificError("Incomplete")),
            ("(1 2 ; unclosed)", SpecificError("Incomplete")),
        ];

        run_parse_tests_with_config(test_cases, config);
    }

    #[test]
    fn test_parse_error_details() {
        let Err(crate::Error::ParseError(err)) = parse_scheme("(1 @)") else {
            panic!("expected a parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
        assert_eq!(err.found.as_deref(), Some("@"));
        assert_eq!(err.context.as_deref(), Some("(1 @)"));

        let Err(crate::Error::ParseError(err)) = parse_scheme("(+ 1 2) extra") else {
            panic!("expected a parse error");
        };
        assert_eq!(err.kind, ParseErrorKind::TrailingContent);
        assert_eq!(err.found.as_deref(), Some("extra"));
    }

    #[test]
    fn test_parser_depth_limits() {
        let parens_under_limit = format!(
            "{}unbound{}",
            "(".repeat(MAX_PARSE_DEPTH - 1),
            ")".repeat(MAX_PARSE_DEPTH - 1)
        );
        let quotes_under_limit = format!("{}unbound", "'".repeat(MAX_PARSE_DEPTH - 1));
        let deep_parens_at_limit = format!(
            "{}1{}",
            "(".repeat(MAX_PARSE_DEPTH),
            ")".repeat(MAX_PARSE_DEPTH)
        );
        let deep_quotes_at_limit = format!("{}a", "'".repeat(MAX_PARSE_DEPTH));

        run_parse_tests(vec![
            (
                deep_parens_at_limit.as_str(),
                SpecificError("TooDeeplyNested"),
            ),
            (
                deep_quotes_at_limit.as_str(),
                SpecificError("TooDeeplyNested"),
            ),
        ]);

        assert!(
            parse_scheme(&parens_under_limit).is_ok(),
            "Parens just under depth limit should parse successfully"
        );
        assert!(
            parse_scheme(&quotes_under_limit).is_ok(),
            "Quotes just under depth limit should parse successfully"
        );
    }
}
