//! Interpreted closures.

use std::rc::Rc;

use crate::parser::ast::FunctionData;
use crate::runner::backend::UnitInfo;
use crate::runner::context::{Context, FrameInfo};
use crate::runner::ds::error::EngineError;
use crate::runner::ds::function_object::{install_prototype, new_function, Callable};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyAttributes, PropertyKey};
use crate::runner::ds::operations::lex_env::new_activation;
use crate::runner::ds::operations::object::{new_plain_object, top_level_scope};
use crate::runner::ds::value::JsValue;

use super::statement::{execute_statements, instantiate_declarations};
use super::types::{CompletionType, ExecEnv};

/// A function body evaluated by walking its tree.
pub struct InterpretedFunction {
    data: Rc<FunctionData>,
    unit: Rc<UnitInfo>,
}

impl InterpretedFunction {
    pub fn new(data: Rc<FunctionData>, unit: Rc<UnitInfo>) -> Self {
        InterpretedFunction { data, unit }
    }

    fn name(&self) -> &str {
        self.data.id.as_deref().unwrap_or("anonymous")
    }
}

impl Callable for InterpretedFunction {
    fn call(
        &self,
        cx: &Context,
        callee: &JsObjectType,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError> {
        let _frame = cx.enter_frame(FrameInfo {
            source_name: self.unit.source_name.clone(),
            line: self.data.meta.line,
            security_domain: self.unit.security_domain.clone(),
        })?;
        cx.debug_observer().on_call(self.name());

        let closure_scope = callee
            .borrow()
            .parent_scope()
            .unwrap_or_else(|| callee.clone());
        let activation = new_activation(&closure_scope);
        {
            let mut a = activation.borrow_mut();
            let mut args = args.into_iter();
            for param in self.data.params.iter() {
                a.define_own(
                    PropertyKey::from_name(param),
                    args.next().unwrap_or(JsValue::Undefined),
                    PropertyAttributes::PERMANENT,
                );
            }
            if let (true, Some(name)) = (self.data.is_expression, &self.data.id) {
                let key = PropertyKey::from_name(name);
                if !a.has_own(&key) {
                    a.define_own(key, JsValue::Object(callee.clone()), PropertyAttributes::empty());
                }
            }
        }

        let this = if this.is_null_or_undefined() {
            JsValue::Object(top_level_scope(&closure_scope))
        } else {
            this
        };
        let env = ExecEnv {
            scope: activation,
            this,
            unit: self.unit.clone(),
        };
        instantiate_declarations(&self.data.declarations, &env);
        let completion = execute_statements(&self.data.body, cx, &env)?;
        Ok(match completion.completion_type {
            CompletionType::Return => completion.get_value(),
            CompletionType::Normal => JsValue::Undefined,
        })
    }
}

/// Function object for `data` closing over `scope`, with a fresh `prototype` object.
pub fn instantiate_function(
    data: &Rc<FunctionData>,
    scope: &JsObjectType,
    unit: &Rc<UnitInfo>,
) -> JsObjectType {
    let callable = Rc::new(InterpretedFunction::new(data.clone(), unit.clone()));
    let function = new_function(
        scope,
        data.id.as_deref().unwrap_or(""),
        data.params.len(),
        callable,
    );
    let prototype = new_plain_object(scope);
    install_prototype(
        &function,
        &prototype,
        PropertyAttributes::DONTENUM | PropertyAttributes::PERMANENT,
    );
    function
}
