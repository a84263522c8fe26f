//! Debugger extension point. Every hook defaults to doing nothing; only the
//! error-reporter hook currently takes part in execution.

use std::sync::Arc;

use crate::runner::context::report::ErrorReporter;

pub trait DebugObserver: Send + Sync {
    fn on_source_text(&self, _source_name: Option<&str>, _text: &str) {}

    fn on_script_load(&self, _source_name: Option<&str>) {}

    fn on_call(&self, _function_name: &str) {}

    fn on_execute(&self, _source_name: Option<&str>) {}

    fn on_new_object(&self, _class_name: &str) {}

    fn on_bytecode(&self, _offset: usize) {}

    /// A reporter that takes precedence over the context's configured one.
    fn error_reporter_hook(&self) -> Option<Arc<dyn ErrorReporter>> {
        None
    }
}

#[derive(Debug, Default)]
pub struct NoopDebugObserver;

impl DebugObserver for NoopDebugObserver {}
