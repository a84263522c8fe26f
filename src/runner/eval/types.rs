//! Completion records, execution environments and assignable references used by the
//! tree walker.

use std::rc::Rc;

use crate::runner::backend::UnitInfo;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::lex_env::{assign_binding, resolve_binding};
use crate::runner::ds::operations::object::{get_property, put_property};
use crate::runner::ds::value::JsValue;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionType {
    /// Execution continues with the next statement.
    Normal,
    /// The enclosing function returns.
    Return,
}

/// Result of executing a statement. Script-level `throw` travels as
/// `EngineError::Uncaught` instead of a completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub completion_type: CompletionType,
    pub value: Option<JsValue>,
}

impl Completion {
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
        }
    }

    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    /// The value, or undefined if none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// Keep an earlier value when this normal completion produced none.
    pub fn update_empty(self, value: Option<JsValue>) -> Self {
        if self.is_normal() && self.value.is_none() {
            Completion { value, ..self }
        } else {
            self
        }
    }
}

/// Where a running body resolves names and what `this` is.
#[derive(Clone)]
pub struct ExecEnv {
    pub scope: JsObjectType,
    pub this: JsValue,
    pub unit: Rc<UnitInfo>,
}

/// Assignable location produced by the left side of an assignment.
pub enum Reference {
    Binding(String),
    Property { base: JsObjectType, key: PropertyKey },
}

impl Reference {
    pub fn get_value(&self, env: &ExecEnv) -> ValueResult {
        match self {
            Reference::Binding(name) => resolve_binding(&env.scope, name),
            Reference::Property { base, key } => {
                Ok(get_property(base, key).unwrap_or(JsValue::Undefined))
            }
        }
    }

    pub fn put_value(&self, env: &ExecEnv, value: JsValue) {
        match self {
            Reference::Binding(name) => assign_binding(&env.scope, name, value),
            Reference::Property { base, key } => {
                put_property(base, key.clone(), value);
            }
        }
    }
}

/// Statement outcome.
pub type EvalResult = Result<Completion, EngineError>;

pub type ValueResult = Result<JsValue, EngineError>;
