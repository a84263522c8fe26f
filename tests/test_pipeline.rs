//! Tests for compiling source text through a context.
//!
//! These tests exercise diagnostics delivery, the completeness check used by
//! interactive shells, function fragments and source line bookkeeping.

extern crate just_runtime;

use std::sync::Arc;

use parking_lot::Mutex;

use just_runtime::runner::context::report::{ErrorReporter, SourcePosition};
use just_runtime::runner::context::Context;
use just_runtime::runner::ds::error::{EngineError, EvaluatorError};
use just_runtime::runner::ds::operations::object::get_property;
use just_runtime::runner::ds::value::JsValue;

/// Records every diagnostic and never escalates compile errors.
#[derive(Default)]
struct CollectingReporter {
    errors: Mutex<Vec<(String, SourcePosition)>>,
    warnings: Mutex<Vec<String>>,
}

impl ErrorReporter for CollectingReporter {
    fn warning(&self, message: &str, _position: &SourcePosition) {
        self.warnings.lock().push(message.to_string());
    }

    fn error(&self, message: &str, position: &SourcePosition) -> Result<(), EvaluatorError> {
        self.errors
            .lock()
            .push((message.to_string(), position.clone()));
        Ok(())
    }

    fn runtime_error(&self, message: &str, position: &SourcePosition) -> EvaluatorError {
        EvaluatorError::new(message, position.clone())
    }
}

fn collecting_context() -> (Context, Arc<CollectingReporter>) {
    let cx = Context::new();
    let reporter = Arc::new(CollectingReporter::default());
    cx.set_error_reporter(reporter.clone());
    (cx, reporter)
}

// ============================================================================
// Diagnostics
// ============================================================================

mod diagnostics_tests {
    use super::*;

    #[test]
    fn test_syntax_error_yields_no_script() {
        let (cx, reporter) = collecting_context();
        let scope = cx.init_standard_objects().unwrap();
        let script = cx
            .compile_string(&scope, "var = ;", Some("bad.js"), 1, None)
            .unwrap();
        assert!(script.is_none());
        assert!(cx.error_count() >= 1);
        let errors = reporter.errors.lock();
        assert_eq!(errors[0].1.source_name.as_deref(), Some("bad.js"));
        assert_eq!(errors[0].1.line, Some(1));
    }

    #[test]
    fn test_top_level_return_is_reported() {
        let (cx, reporter) = collecting_context();
        let scope = cx.init_standard_objects().unwrap();
        let result = cx
            .evaluate_string(&scope, "var a = 1;\nreturn a;", Some("ret.js"), 10, None)
            .unwrap();
        assert!(result.is_none());
        assert_eq!(cx.error_count(), 1);

        let errors = reporter.errors.lock();
        assert_eq!(errors[0].0, "invalid return");
        assert_eq!(errors[0].1.line, Some(11));
        assert_eq!(errors[0].1.line_source.as_deref(), Some("return a;"));
    }

    #[test]
    fn test_error_count_resets_per_compile() {
        let (cx, _reporter) = collecting_context();
        let scope = cx.init_standard_objects().unwrap();
        cx.compile_string(&scope, "1 = 2;", None, 1, None).unwrap();
        assert_eq!(cx.error_count(), 1);
        let script = cx.compile_string(&scope, "1 + 2;", None, 1, None).unwrap();
        assert!(script.is_some());
        assert_eq!(cx.error_count(), 0);
    }

    #[test]
    fn test_default_reporter_escalates() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        match cx.compile_string(&scope, "1 = 2;", Some("lhs.js"), 3, None) {
            Err(EngineError::Evaluator(e)) => {
                assert_eq!(e.message, "invalid assignment left-hand side");
                assert_eq!(e.position.line, Some(3));
            }
            other => panic!("expected an escalated error, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_parameter_warns() {
        let (cx, reporter) = collecting_context();
        let scope = cx.init_standard_objects().unwrap();
        let value = cx
            .evaluate_string(&scope, "function f(a, a) { return a; } f(1, 2);", None, 1, None)
            .unwrap();
        assert_eq!(value, Some(JsValue::Number(2.0)));
        assert_eq!(cx.error_count(), 0);
        assert_eq!(reporter.warnings.lock().len(), 1);
    }

    #[test]
    fn test_empty_source_compiles_to_nothing() {
        let (cx, reporter) = collecting_context();
        let scope = cx.init_standard_objects().unwrap();
        let script = cx.compile_string(&scope, "  // nothing\n", None, 1, None).unwrap();
        assert!(script.is_none());
        assert!(reporter.errors.lock().is_empty());
    }

    #[test]
    fn test_runtime_reference_error() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let err = cx
            .evaluate_string(&scope, "missing + 1;", None, 1, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Script(ref e) if e.name() == "ReferenceError"));
    }

    #[test]
    fn test_compile_reader() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let source: &[u8] = b"var s = 'read'; s;";
        let value = cx
            .evaluate_reader(&scope, source, Some("reader.js"), 1, None)
            .unwrap();
        assert_eq!(value, Some(JsValue::String("read".to_string())));
    }
}

// ============================================================================
// Completeness check
// ============================================================================

mod compilable_unit_tests {
    use super::*;

    #[test]
    fn test_complete_sources() {
        let cx = Context::new();
        assert!(cx.is_compilable_unit("var x = 1;"));
        assert!(cx.is_compilable_unit("1 + 1;"));
        assert!(cx.is_compilable_unit(""));
    }

    #[test]
    fn test_incomplete_sources() {
        let cx = Context::new();
        assert!(!cx.is_compilable_unit("function f() {"));
        assert!(!cx.is_compilable_unit("1 +"));
        assert!(!cx.is_compilable_unit("if (x) {\n  y = 1;\n"));
    }

    #[test]
    fn test_shell_inputs() {
        let cx = Context::new();
        assert!(!cx.is_compilable_unit("function f("));
        assert!(!cx.is_compilable_unit("1+"));
        assert!(cx.is_compilable_unit("1+1"));
        assert!(cx.is_compilable_unit("1+1;"));
    }

    #[test]
    fn test_errors_before_end_are_complete() {
        let cx = Context::new();
        assert!(cx.is_compilable_unit("var x = ;"));
        assert!(cx.is_compilable_unit("return 1;"));
    }

    #[test]
    fn test_check_restores_reporter() {
        let (cx, reporter) = collecting_context();
        assert!(cx.is_compilable_unit("var x = ;"));
        assert!(reporter.errors.lock().is_empty());

        let scope = cx.init_standard_objects().unwrap();
        let script = cx.compile_string(&scope, "1 = 2;", None, 1, None).unwrap();
        assert!(script.is_none());
        assert_eq!(reporter.errors.lock().len(), 1);
    }
}

// ============================================================================
// Function fragments
// ============================================================================

mod function_tests {
    use super::*;

    #[test]
    fn test_compile_function_is_callable() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let function = cx
            .compile_function(&scope, "function mul(a, b) { return a * b; }", Some("mul.js"), 1, None)
            .unwrap()
            .expect("a function");
        let result = function
            .call(&cx, &scope, JsValue::Undefined, vec![JsValue::Number(6.0), JsValue::Number(7.0)])
            .unwrap();
        assert_eq!(result, JsValue::Number(42.0));
        assert_eq!(function.info().source_name.as_deref(), Some("mul.js"));
    }

    #[test]
    fn test_compile_function_without_function_yields_nothing() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let function = cx.compile_function(&scope, "1 + 2;", None, 1, None).unwrap();
        assert!(function.is_none());
    }

    #[test]
    fn test_compiled_function_construct() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let function = cx
            .compile_function(&scope, "function Point(x) { this.x = x; }", None, 1, None)
            .unwrap()
            .expect("a function");
        let point = function.construct(&cx, vec![JsValue::Number(3.0)]).unwrap();
        let object = point.as_object().expect("an object").clone();
        assert_eq!(get_property(&object, &"x".into()), Some(JsValue::Number(3.0)));
    }
}
