//! Tests comparing the interpreter with the bytecode backend.
//!
//! Every program here runs once per optimization level and both runs must
//! agree. Without the `optimizer` feature every level interprets, so the
//! comparisons still hold.

extern crate just_runtime;

use std::thread;

use just_runtime::runner::context::{Context, FrameInfo, INTERPRET_ONLY, MAX_FRAME_DEPTH};
use just_runtime::runner::ds::error::EngineError;
use just_runtime::runner::ds::value::JsValue;

fn run_at(level: i32, code: &str) -> Result<Option<JsValue>, EngineError> {
    let cx = Context::new();
    cx.set_optimization_level(level);
    let scope = cx.init_standard_objects()?;
    cx.evaluate_string(&scope, code, Some("parity"), 1, None)
}

/// Evaluate at both levels and return the agreed value.
fn both(code: &str) -> JsValue {
    let interpreted = run_at(INTERPRET_ONLY, code)
        .unwrap_or_else(|e| panic!("interpreter failed on {:?}: {}", code, e))
        .expect("interpreter compiled");
    let compiled = run_at(9, code)
        .unwrap_or_else(|e| panic!("bytecode failed on {:?}: {}", code, e))
        .expect("bytecode compiled");
    assert_eq!(interpreted, compiled, "backends disagree on {:?}", code);
    interpreted
}

/// Run `f` on a thread with room for deep native recursion.
fn with_big_stack<F: FnOnce() + Send + 'static>(f: F) {
    thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .expect("spawn")
        .join()
        .expect("test thread");
}

// ============================================================================
// Expressions
// ============================================================================

mod expression_tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        assert_eq!(both("var x = 5 + 3; x * 2;"), JsValue::Number(16.0));
        assert_eq!(both("1 + 2 * 3 - 4 / 2;"), JsValue::Number(5.0));
        assert_eq!(both("7 % 3;"), JsValue::Number(1.0));
        assert_eq!(both("'a' + 1 + 2;"), JsValue::String("a12".to_string()));
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(both("1 < 2 && 2 <= 2;"), JsValue::Boolean(true));
        assert_eq!(both("null == undefined;"), JsValue::Boolean(true));
        assert_eq!(both("null === undefined;"), JsValue::Boolean(false));
        assert_eq!(both("0 || 'fallback';"), JsValue::String("fallback".to_string()));
        assert_eq!(both("!'';"), JsValue::Boolean(true));
        assert_eq!(both("true ? 'y' : 'n';"), JsValue::String("y".to_string()));
    }

    #[test]
    fn test_typeof() {
        assert_eq!(both("typeof undeclared;"), JsValue::String("undefined".to_string()));
        assert_eq!(both("typeof 1;"), JsValue::String("number".to_string()));
        assert_eq!(both("typeof {};"), JsValue::String("object".to_string()));
        assert_eq!(both("typeof function() {};"), JsValue::String("function".to_string()));
        assert_eq!(both("typeof null;"), JsValue::String("object".to_string()));
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(both("var a = 1; a += 2; a *= 3; a;"), JsValue::Number(9.0));
        assert_eq!(
            both("var o = {n: 10}; o.n -= 4; o['n'] /= 2; o.n;"),
            JsValue::Number(3.0)
        );
    }

    #[test]
    fn test_comma_and_unary() {
        assert_eq!(both("var a = (1, 2, 3); -a;"), JsValue::Number(-3.0));
        assert_eq!(both("+'42';"), JsValue::Number(42.0));
    }
}

// ============================================================================
// Statements and functions
// ============================================================================

mod statement_tests {
    use super::*;

    #[test]
    fn test_while_and_if() {
        let code = "var i = 0; var evens = 0;\n\
                    while (i < 10) { if (i % 2 === 0) evens += 1; else evens += 0; i += 1; }\n\
                    evens;";
        assert_eq!(both(code), JsValue::Number(5.0));
    }

    #[test]
    fn test_hoisted_function() {
        assert_eq!(both("var r = f(4); function f(n) { return n * n; } r;"), JsValue::Number(16.0));
    }

    #[test]
    fn test_closure_captures_scope() {
        let code = "function counter() { var c = 0; return function() { c += 1; return c; }; }\n\
                    var next = counter(); next(); next(); next();";
        assert_eq!(both(code), JsValue::Number(3.0));
    }

    #[test]
    fn test_recursion_within_limit() {
        with_big_stack(|| {
            let code = "function fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } fib(12);";
            assert_eq!(both(code), JsValue::Number(144.0));
        });
    }

    #[test]
    fn test_constructor_and_prototype() {
        let code = "function P(x) { this.x = x; }\n\
                    P.prototype.twice = function() { return this.x * 2; };\n\
                    var p = new P(21); p.twice();";
        assert_eq!(both(code), JsValue::Number(42.0));
        assert_eq!(
            both("function Q() {} Q.prototype.isPrototypeOf(new Q());"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_this_at_top_level_is_global() {
        assert_eq!(both("var g = 1; this.g;"), JsValue::Number(1.0));
    }

    #[test]
    fn test_completion_value_of_last_expression() {
        assert_eq!(both("1; 2; var x = 3;"), JsValue::Number(2.0));
        assert_eq!(both("var only = 1;"), JsValue::Undefined);
    }
}

// ============================================================================
// Failures
// ============================================================================

mod failure_tests {
    use super::*;

    #[test]
    fn test_throw_is_uncaught_on_both() {
        for level in [INTERPRET_ONLY, 9] {
            match run_at(level, "throw 'boom';") {
                Err(EngineError::Uncaught(JsValue::String(s))) => assert_eq!(s, "boom"),
                other => panic!("level {}: expected uncaught, got {:?}", level, other),
            }
        }
    }

    #[test]
    fn test_calling_non_function() {
        for level in [INTERPRET_ONLY, 9] {
            let err = run_at(level, "var n = 1; n();").unwrap_err();
            assert!(
                matches!(err, EngineError::Script(ref e) if e.name() == "TypeError"),
                "level {}: {:?}",
                level,
                err
            );
        }
    }

    #[test]
    fn test_runaway_recursion_is_reported() {
        with_big_stack(|| {
            for level in [INTERPRET_ONLY, 9] {
                let cx = Context::new();
                cx.set_optimization_level(level);
                let scope = cx.init_standard_objects().unwrap();
                let result = cx.evaluate_string(
                    &scope,
                    "function down(n) { return down(n + 1); } down(0);",
                    Some("deep.js"),
                    1,
                    None,
                );
                match result {
                    Err(EngineError::Evaluator(e)) => {
                        assert_eq!(e.message, "too much recursion");
                        assert_eq!(e.position.source_name.as_deref(), Some("deep.js"));
                    }
                    other => panic!("level {}: expected recursion error, got {:?}", level, other),
                }
                assert_eq!(cx.frame_depth(), 0);
                assert_eq!(cx.error_count(), 1);
            }
        });
    }

    #[test]
    fn test_frame_limit_is_shared_by_nested_units() {
        let cx = Context::new();
        let mut guards = Vec::new();
        for _ in 0..MAX_FRAME_DEPTH {
            guards.push(
                cx.enter_frame(FrameInfo {
                    source_name: None,
                    line: 1,
                    security_domain: None,
                })
                .unwrap(),
            );
        }
        let scope = cx.init_standard_objects().unwrap();
        let result = cx.evaluate_string(&scope, "1;", None, 1, None);
        assert!(matches!(result, Err(EngineError::Evaluator(_))));
        drop(guards);
        assert_eq!(cx.frame_depth(), 0);
    }
}
