use multival::Error;
use multival::ast::Value;
use multival::evaluator::{Environment, Interpreter};
use multival::values::ValuesRegister;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("Multival Lisp evaluator with multiple values");
    println!("Enter S-expressions like: (floor/ 17 5)");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let mut interpreter = Interpreter::new();

    // Register custom function that can be called from user code for demonstration purposes
    interpreter
        .env_mut()
        .register_builtin_function("help", print_help);

    loop {
        match rl.readline("multival> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        _ = print_help(&[]).is_ok();
                        continue;
                    }
                    ":env" => {
                        print_environment(interpreter.env());
                        continue;
                    }
                    ":values" => {
                        print_register(interpreter.values());
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Goodbye!");
                        break;
                    }
                    _ => {}
                }

                match interpreter.eval_str(line) {
                    Ok(primary) => print_result(&primary, interpreter.values()),
                    Err(e) => println!("Error: {e}"),
                }
            }

            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

/// Print the primary value, or every value when the expression produced anything but
/// exactly one
fn print_result(primary: &Value, values: &ValuesRegister<Value>) {
    match values.as_slice() {
        [single] if single == primary => println!("{primary}"),
        // Don't print Unspecified values (e.g., from define)
        _ if matches!(primary, Value::Unspecified) => {}
        _ => print_register(values),
    }
}

fn print_register(values: &ValuesRegister<Value>) {
    match values.as_slice() {
        [] => println!("; No values"),
        [rest @ .., last] => {
            for value in rest {
                println!("{value} ;");
            }
            println!("{last}");
        }
    }
}

fn print_help(_args: &[Value]) -> Result<Value, Error> {
    println!("Multival Lisp evaluator:");
    println!("  :help      - Show this help message");
    println!("  :values    - Show every value produced by the last expression");
    println!("  :env       - Show current environment bindings");
    println!("  :quit      - Exit the interpreter");
    println!("  :exit      - Exit the interpreter");
    println!("  Ctrl+C     - Exit the interpreter");
    println!();
    println!("Supported operations:");
    println!("  Numbers: 42, -5, #x1F");
    println!("  Booleans: #t/#f");
    println!("  Arithmetic: +, -, *, max, min");
    println!("  Comparison: =, <, >, <=, >=, equal?");
    println!("  Logic: and, or, not");
    println!("  Lists: list, cons, car, cdr, null?, length");
    println!("  Language: if, begin, define, lambda, quote");
    println!("  Producing values: values, values-list, floor/, truncate/");
    println!("  Consuming values: multiple-value-call, multiple-value-list,");
    println!("                    multiple-value-prog1, multiple-value-bind, nth-value");
    println!();
    println!("Examples:");
    println!("  (floor/ 17 5)");
    println!("  (multiple-value-call list 'a (values 1 2))");
    println!("  (multiple-value-bind (q r) (truncate/ -17 5) (list q r))");
    println!("  (+ (values 1 2 3) 10)  ; extra values are dropped");
    println!();

    Ok(Value::Unspecified)
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in functions from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value {
            Value::BuiltinFunction { .. } | Value::ValuesBuiltin { .. } => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
