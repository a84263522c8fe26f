//! Error types shared by the runtime, the compilation pipeline and the embedding API.

use crate::runner::context::report::SourcePosition;
use crate::runner::ds::value::JsValue;
use thiserror::Error;

/// Script-level errors raised by language operations (property access, calls, conversions).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JErrorType {
    #[error("Uncaught reference error: {0}.")]
    ReferenceError(String),
    #[error("Uncaught type error: {0}.")]
    TypeError(String),
    #[error("Uncaught range error: {0}.")]
    RangeError(String),
    #[error("Uncaught syntax error: {0}.")]
    SyntaxError(String),
}
impl JErrorType {
    /// Constructor name of the script-visible error object.
    pub fn name(&self) -> &'static str {
        match self {
            JErrorType::ReferenceError(_) => "ReferenceError",
            JErrorType::TypeError(_) => "TypeError",
            JErrorType::RangeError(_) => "RangeError",
            JErrorType::SyntaxError(_) => "SyntaxError",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            JErrorType::ReferenceError(m)
            | JErrorType::TypeError(m)
            | JErrorType::RangeError(m)
            | JErrorType::SyntaxError(m) => m,
        }
    }
}

/// A diagnostic escalated to an error by an error reporter.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} ({position})")]
pub struct EvaluatorError {
    pub message: String,
    pub position: SourcePosition,
}
impl EvaluatorError {
    pub fn new(message: &str, position: SourcePosition) -> Self {
        EvaluatorError {
            message: message.to_string(),
            position,
        }
    }
}

/// Every failure surfaced by the embedding API.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Evaluator(#[from] EvaluatorError),
    #[error("security error: {0}")]
    Security(String),
    #[error("constructor \"{0}\" not found")]
    ConstructorNotFound(String),
    #[error("\"{0}\" is not a function")]
    NotAFunction(String),
    #[error("failed to initialize {name}: {message}")]
    Initialization { name: String, message: String },
    #[error(transparent)]
    Script(#[from] JErrorType),
    #[error("uncaught exception: {0}")]
    Uncaught(JsValue),
    #[error("no context is associated with the current thread")]
    NoContext,
    #[error("i/o error: {0}")]
    Io(String),
}
impl EngineError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EngineError::Script(JErrorType::TypeError(message.into()))
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        EngineError::Script(JErrorType::ReferenceError(message.into()))
    }
}
