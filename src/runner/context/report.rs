//! Diagnostic delivery. Warnings and errors found while compiling or running go to the
//! current context's error reporter; without a context, errors become `EvaluatorError`s.

use std::fmt;
use std::fmt::{Display, Formatter};

use tracing::warn;

use crate::runner::context::registry::ContextRegistry;
use crate::runner::ds::error::{EngineError, EvaluatorError};

/// Where a diagnostic points. Every field is optional; unknown parts stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    pub source_name: Option<String>,
    pub line: Option<u32>,
    pub line_source: Option<String>,
    pub column: Option<u32>,
}
impl SourcePosition {
    pub fn new(source_name: Option<&str>, line: u32) -> Self {
        SourcePosition {
            source_name: source_name.map(|s| s.to_string()),
            line: Some(line),
            line_source: None,
            column: None,
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_line_source(mut self, line_source: Option<String>, column: Option<u32>) -> Self {
        self.line_source = line_source;
        self.column = column;
        self
    }
}
impl Display for SourcePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = self.source_name.as_deref().unwrap_or("<unknown source>");
        match self.line {
            Some(line) => write!(f, "{}#{}", name, line),
            None => write!(f, "{}", name),
        }
    }
}

/// Receiver of diagnostics.
///
/// `error` may escalate by returning `Err`, which aborts the operation that reported it.
/// `runtime_error` always produces the error the caller will raise.
pub trait ErrorReporter: Send + Sync {
    fn warning(&self, message: &str, position: &SourcePosition);

    fn error(&self, message: &str, position: &SourcePosition) -> Result<(), EvaluatorError>;

    fn runtime_error(&self, message: &str, position: &SourcePosition) -> EvaluatorError;
}

/// Ignores warnings and raises on every error.
#[derive(Debug, Default)]
pub struct DefaultErrorReporter;

impl ErrorReporter for DefaultErrorReporter {
    fn warning(&self, _message: &str, _position: &SourcePosition) {}

    fn error(&self, message: &str, position: &SourcePosition) -> Result<(), EvaluatorError> {
        Err(EvaluatorError::new(message, position.clone()))
    }

    fn runtime_error(&self, message: &str, position: &SourcePosition) -> EvaluatorError {
        EvaluatorError::new(message, position.clone())
    }
}

/// Route a warning to the current thread's context. Dropped (and logged) without one.
pub fn report_warning(message: &str, position: SourcePosition) {
    match ContextRegistry::global().current_context() {
        Some(cx) => cx.report_warning(message, position),
        None => warn!(%position, "{}", message),
    }
}

pub fn report_error(message: &str, position: SourcePosition) -> Result<(), EngineError> {
    match ContextRegistry::global().current_context() {
        Some(cx) => cx.report_error(message, position),
        None => Err(EvaluatorError::new(message, position).into()),
    }
}

pub fn report_runtime_error(message: &str, position: SourcePosition) -> EngineError {
    match ContextRegistry::global().current_context() {
        Some(cx) => cx.report_runtime_error(message, position),
        None => EvaluatorError::new(message, position).into(),
    }
}

/// Variants that take the position from the current context's innermost frame.
pub fn report_error_here(message: &str) -> Result<(), EngineError> {
    match ContextRegistry::global().current_context() {
        Some(cx) => {
            let position = cx.current_position();
            cx.report_error(message, position)
        }
        None => Err(EvaluatorError::new(message, SourcePosition::unknown()).into()),
    }
}

pub fn report_runtime_error_here(message: &str) -> EngineError {
    match ContextRegistry::global().current_context() {
        Some(cx) => {
            let position = cx.current_position();
            cx.report_runtime_error(message, position)
        }
        None => EvaluatorError::new(message, SourcePosition::unknown()).into(),
    }
}
