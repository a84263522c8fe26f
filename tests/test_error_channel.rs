//! Tests for diagnostic routing.
//!
//! The free reporting functions go to whatever context the calling thread
//! has entered; a debug observer's reporter hook takes precedence over the
//! configured reporter.

extern crate just_runtime;

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use just_runtime::runner::context::debug::DebugObserver;
use just_runtime::runner::context::report::{
    self, ErrorReporter, SourcePosition,
};
use just_runtime::runner::context::{Context, FrameInfo};
use just_runtime::runner::ds::error::{EngineError, EvaluatorError};

/// Keeps messages, tagged with a label, and never escalates.
struct Recorder {
    label: &'static str,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ErrorReporter for Recorder {
    fn warning(&self, message: &str, _position: &SourcePosition) {
        self.seen.lock().push(format!("{} warning {}", self.label, message));
    }

    fn error(&self, message: &str, _position: &SourcePosition) -> Result<(), EvaluatorError> {
        self.seen.lock().push(format!("{} error {}", self.label, message));
        Ok(())
    }

    fn runtime_error(&self, message: &str, position: &SourcePosition) -> EvaluatorError {
        self.seen.lock().push(format!("{} fatal {}", self.label, message));
        EvaluatorError::new(message, position.clone())
    }
}

struct HookObserver {
    hook: Arc<dyn ErrorReporter>,
}

impl DebugObserver for HookObserver {
    fn error_reporter_hook(&self) -> Option<Arc<dyn ErrorReporter>> {
        Some(self.hook.clone())
    }
}

fn on_fresh_thread<F: FnOnce() + Send + 'static>(f: F) {
    thread::spawn(f).join().expect("worker thread");
}

// ============================================================================
// Without a context
// ============================================================================

mod unbound_tests {
    use super::*;

    #[test]
    fn test_error_without_context_is_terminating() {
        on_fresh_thread(|| {
            let position = SourcePosition::new(Some("x.js"), 2);
            match report::report_error("lost", position.clone()) {
                Err(EngineError::Evaluator(e)) => {
                    assert_eq!(e.message, "lost");
                    assert_eq!(e.position, position);
                }
                other => panic!("expected an evaluator error, got {:?}", other),
            }
            let fatal = report::report_runtime_error("fatal", SourcePosition::unknown());
            assert!(matches!(fatal, EngineError::Evaluator(_)));
        });
    }

    #[test]
    fn test_warning_without_context_is_dropped() {
        on_fresh_thread(|| {
            report::report_warning("nobody listens", SourcePosition::unknown());
        });
    }

    #[test]
    fn test_here_variants_without_context() {
        on_fresh_thread(|| {
            match report::report_error_here("where") {
                Err(EngineError::Evaluator(e)) => assert_eq!(e.position, SourcePosition::unknown()),
                other => panic!("expected an evaluator error, got {:?}", other),
            }
        });
    }
}

// ============================================================================
// With an entered context
// ============================================================================

mod bound_tests {
    use super::*;

    #[test]
    fn test_free_functions_use_entered_context() {
        on_fresh_thread(|| {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let cx = Context::enter();
            cx.set_error_reporter(Arc::new(Recorder {
                label: "configured",
                seen: seen.clone(),
            }));

            report::report_warning("w", SourcePosition::unknown());
            report::report_error("e", SourcePosition::unknown()).unwrap();
            let fatal = report::report_runtime_error("f", SourcePosition::unknown());
            assert!(matches!(fatal, EngineError::Evaluator(ref e) if e.message == "f"));

            assert_eq!(cx.error_count(), 2);
            assert_eq!(
                *seen.lock(),
                vec!["configured warning w", "configured error e", "configured fatal f"]
            );
            Context::exit();
        });
    }

    #[test]
    fn test_here_variants_read_innermost_frame() {
        on_fresh_thread(|| {
            let cx = Context::enter();
            let _frame = cx
                .enter_frame(FrameInfo {
                    source_name: Some("frame.js".to_string()),
                    line: 9,
                    security_domain: None,
                })
                .unwrap();
            match report::report_runtime_error_here("deep") {
                EngineError::Evaluator(e) => {
                    assert_eq!(e.position.source_name.as_deref(), Some("frame.js"));
                    assert_eq!(e.position.line, Some(9));
                }
                other => panic!("expected an evaluator error, got {:?}", other),
            }
            drop(_frame);
            Context::exit();
        });
    }

    #[test]
    fn test_last_interpreted_position_survives_frame_exit() {
        let cx = Context::new();
        {
            let _frame = cx
                .enter_frame(FrameInfo {
                    source_name: Some("gone.js".to_string()),
                    line: 1,
                    security_domain: None,
                })
                .unwrap();
            cx.set_current_line(5);
        }
        let position = cx.current_position();
        assert_eq!(position.source_name.as_deref(), Some("gone.js"));
        assert_eq!(position.line, Some(5));
        assert_eq!(Context::new().current_position(), SourcePosition::unknown());
    }
}

// ============================================================================
// Debug hook precedence
// ============================================================================

mod hook_tests {
    use super::*;

    #[test]
    fn test_hook_outranks_configured_reporter() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cx = Context::new();
        cx.set_error_reporter(Arc::new(Recorder {
            label: "configured",
            seen: seen.clone(),
        }));
        cx.set_debug_observer(Some(Arc::new(HookObserver {
            hook: Arc::new(Recorder {
                label: "hook",
                seen: seen.clone(),
            }),
        })));

        cx.report_error("one", SourcePosition::unknown()).unwrap();
        cx.set_error_reporter(Arc::new(Recorder {
            label: "replaced",
            seen: seen.clone(),
        }));
        cx.report_error("two", SourcePosition::unknown()).unwrap();

        cx.set_debug_observer(None);
        cx.report_error("three", SourcePosition::unknown()).unwrap();
        assert_eq!(
            *seen.lock(),
            vec!["hook error one", "hook error two", "replaced error three"]
        );
    }

    #[test]
    fn test_compile_errors_reach_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cx = Context::new();
        cx.set_debug_observer(Some(Arc::new(HookObserver {
            hook: Arc::new(Recorder {
                label: "hook",
                seen: seen.clone(),
            }),
        })));
        let scope = cx.init_standard_objects().unwrap();
        let script = cx.compile_string(&scope, "return 1;", None, 1, None).unwrap();
        assert!(script.is_none());
        assert_eq!(*seen.lock(), vec!["hook error invalid return"]);
    }
}
