//! Tree-walking interpreter backend.
//!
//! Runs the transformed tree directly. Its compiled-program wrapper is the
//! [`CallerClass::Interpreter`] sentinel, so security resolution for interpreted frames
//! answers with the domain the running unit asserted.

pub mod expression;
pub mod function;
pub mod statement;
pub mod types;

use std::rc::Rc;

use crate::parser::api::TokenStream;
use crate::parser::ast::ProgramData;
use crate::parser::static_semantics;
use crate::runner::backend::{
    Backend, CompiledFunction, CompiledUnit, EmitRequest, Script, ScriptBody, Tree, UnitInfo,
};
use crate::runner::context::security::CallerClass;
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::value::JsValue;

pub use types::{Completion, CompletionType, ExecEnv, Reference};

use self::function::instantiate_function;
use self::statement::{execute_statements, instantiate_declarations};

pub const INTERPRETER_CLASS_NAME: &str = "<interpreted>";

pub struct InterpreterBackend;

impl Backend for InterpreterBackend {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn is_optimizing(&self) -> bool {
        false
    }

    fn transform(
        &self,
        cx: &Context,
        ts: &TokenStream,
        program: ProgramData,
    ) -> Result<ProgramData, EngineError> {
        static_semantics::transform(cx, ts, program, false)
    }

    fn emit(&self, request: EmitRequest<'_>) -> Result<CompiledUnit, EngineError> {
        let info = Rc::new(UnitInfo {
            class_name: INTERPRETER_CLASS_NAME.to_string(),
            source_name: request.source_name,
            line: request.line,
            security_domain: request.security_domain,
            caller_class: CallerClass::Interpreter,
        });
        Ok(match request.tree {
            Tree::Program(program) => CompiledUnit::Script(Script::new(
                info.clone(),
                Rc::new(InterpretedScript {
                    program,
                    unit: info,
                }),
            )),
            Tree::Function(data) => {
                let function = instantiate_function(&data, request.scope, &info);
                CompiledUnit::Function(CompiledFunction::new(info, function))
            }
        })
    }
}

struct InterpretedScript {
    program: ProgramData,
    unit: Rc<UnitInfo>,
}

impl ScriptBody for InterpretedScript {
    fn exec(&self, cx: &Context, scope: &JsObjectType) -> Result<JsValue, EngineError> {
        let env = ExecEnv {
            scope: scope.clone(),
            this: JsValue::Object(scope.clone()),
            unit: self.unit.clone(),
        };
        instantiate_declarations(&self.program.declarations, &env);
        let completion = execute_statements(&self.program.body, cx, &env)?;
        Ok(completion.get_value())
    }
}
