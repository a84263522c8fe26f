//! Interactive shell for the just runtime.
//!
//! Usage:
//!   just <file.js>              # Execute a JavaScript file
//!   just -e "code"              # Evaluate JavaScript code
//!   just                        # Start REPL (interactive mode)

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use just_runtime::runner::context::report::{ErrorReporter, SourcePosition};
use just_runtime::runner::context::{Context, LanguageVersion};
use just_runtime::runner::ds::error::{EngineError, EvaluatorError};
use just_runtime::runner::ds::object::JsObjectType;
use just_runtime::runner::ds::value::JsValue;

#[derive(Parser, Debug)]
#[command(name = "just", version, about = "just - JavaScript runtime shell")]
struct Cli {
    /// Script to execute. Starts the REPL when absent.
    file: Option<PathBuf>,

    /// Evaluate the given source instead of a file.
    #[arg(short = 'e', long = "eval", value_name = "CODE", conflicts_with = "file")]
    eval: Option<String>,

    /// Optimization level: -1 interprets, 0..=9 uses the bytecode backend.
    #[arg(short = 'O', long = "opt-level", allow_hyphen_values = true)]
    opt_level: Option<i32>,

    /// Language version code, e.g. 120 for 1.2.
    #[arg(long = "language-version")]
    language_version: Option<i32>,
}

/// Prints diagnostics to stderr and never escalates, so the shell survives
/// syntax errors.
struct ToolErrorReporter;

impl ToolErrorReporter {
    fn print(kind: &str, message: &str, position: &SourcePosition) {
        eprintln!("{}: {}: {}", position, kind, message);
        if let Some(line) = &position.line_source {
            eprintln!("{}", line);
            if let Some(column) = position.column {
                eprintln!("{}^", " ".repeat(column.saturating_sub(1) as usize));
            }
        }
    }
}

impl ErrorReporter for ToolErrorReporter {
    fn warning(&self, message: &str, position: &SourcePosition) {
        Self::print("warning", message, position);
    }

    fn error(&self, message: &str, position: &SourcePosition) -> Result<(), EvaluatorError> {
        Self::print("error", message, position);
        Ok(())
    }

    fn runtime_error(&self, message: &str, position: &SourcePosition) -> EvaluatorError {
        EvaluatorError::new(message, position.clone())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let cx = Context::enter();
    cx.set_error_reporter(Arc::new(ToolErrorReporter));
    if let Some(level) = cli.opt_level {
        cx.set_optimization_level(level);
    }
    if let Some(code) = cli.language_version {
        match LanguageVersion::from_code(code) {
            Some(version) => cx.set_language_version(version),
            None => {
                eprintln!("just: unknown language version {}", code);
                process::exit(2);
            }
        }
    }

    let scope = match cx.init_standard_objects() {
        Ok(scope) => scope,
        Err(e) => {
            eprintln!("just: {}", e);
            process::exit(1);
        }
    };

    let status = match (&cli.eval, &cli.file) {
        (Some(code), _) => run_source(&cx, &scope, code, "<command line>"),
        (None, Some(path)) => match fs::read_to_string(path) {
            Ok(source) => run_source(&cx, &scope, &source, &path.display().to_string()),
            Err(e) => {
                eprintln!("just: cannot read {}: {}", path.display(), e);
                1
            }
        },
        (None, None) => {
            run_repl(&cx, &scope);
            0
        }
    };

    Context::exit();
    process::exit(status);
}

fn run_source(cx: &Context, scope: &JsObjectType, source: &str, name: &str) -> i32 {
    match cx.evaluate_string(scope, source, Some(name), 1, None) {
        Ok(Some(_)) => 0,
        // nothing compiled: the reporter has printed why
        Ok(None) if cx.error_count() > 0 => 1,
        Ok(None) => 0,
        Err(e) => {
            print_failure(&e);
            1
        }
    }
}

fn print_failure(error: &EngineError) {
    match error {
        EngineError::Uncaught(value) => eprintln!("uncaught exception: {}", value),
        other => eprintln!("{}", other),
    }
}

fn run_repl(cx: &Context, scope: &JsObjectType) {
    println!("{}", Context::implementation_version());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut line_number = 1u32;

    loop {
        // accumulate until the buffer forms a complete unit
        let start_line = line_number;
        let mut buffer = String::new();
        loop {
            print!("{}", if buffer.is_empty() { "js> " } else { "  > " });
            let _ = io::stdout().flush();
            match lines.next() {
                Some(Ok(line)) => {
                    buffer.push_str(&line);
                    buffer.push('\n');
                    line_number += 1;
                }
                _ => {
                    println!();
                    return;
                }
            }
            if cx.is_compilable_unit(&buffer) {
                break;
            }
        }

        match cx.evaluate_string(scope, &buffer, Some("<stdin>"), start_line, None) {
            Ok(Some(JsValue::Undefined)) | Ok(None) => {}
            Ok(Some(value)) => match cx.to_string(&value) {
                Ok(s) => println!("{}", s),
                Err(e) => print_failure(&e),
            },
            Err(e) => print_failure(&e),
        }
    }
}
