//! Optimizing backend: constant folding, a bytecode compiler and a stack VM.
//!
//! ```text
//! transformed tree → fold constants → Compiler → Chunk → Vm → value
//! ```
//!
//! Every emitted unit gets a generated class name from the context's naming
//! settings and is defined through the installed security support, when one
//! exists, under the unit's security domain.

pub mod bytecode;
pub mod compiler;
pub mod vm;

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, trace, Level};

use crate::parser::api::TokenStream;
use crate::parser::ast::ProgramData;
use crate::parser::static_semantics;
use crate::runner::backend::{
    Backend, CompiledFunction, CompiledUnit, EmitRequest, Script, Tree, UnitInfo,
};
use crate::runner::context::security::CallerClass;
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;

use self::bytecode::Chunk;
use self::compiler::Compiler;
use self::vm::{make_closure, BytecodeScript};

/// Compile a transformed program into stack bytecode.
pub fn compile(program: &ProgramData) -> Chunk {
    Compiler::new().compile_program(program)
}

pub struct BytecodeBackend {
    serial: AtomicUsize,
}

impl Default for BytecodeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BytecodeBackend {
    pub fn new() -> Self {
        BytecodeBackend {
            serial: AtomicUsize::new(0),
        }
    }
}

impl Backend for BytecodeBackend {
    fn name(&self) -> &'static str {
        "bytecode"
    }

    fn is_optimizing(&self) -> bool {
        true
    }

    fn transform(
        &self,
        cx: &Context,
        ts: &TokenStream,
        program: ProgramData,
    ) -> Result<ProgramData, EngineError> {
        static_semantics::transform(cx, ts, program, true)
    }

    fn emit(&self, request: EmitRequest<'_>) -> Result<CompiledUnit, EngineError> {
        let class_name = request
            .naming
            .class_name(self.serial.fetch_add(1, Ordering::Relaxed));
        if let Some(support) = &request.security_support {
            let loaded = support.define_class(&class_name, request.security_domain.as_ref());
            debug!(class = %class_name, loaded = %loaded, "defined compiled unit");
        }
        let info = Rc::new(UnitInfo {
            class_name: class_name.clone(),
            source_name: request.source_name,
            line: request.line,
            security_domain: request.security_domain,
            caller_class: CallerClass::Named(class_name),
        });

        Ok(match request.tree {
            Tree::Program(program) => {
                let chunk = compile(&program);
                if request.cx.is_generating_debug() && tracing::enabled!(Level::TRACE) {
                    trace!("\n{}", chunk.disassemble(&info.class_name));
                }
                CompiledUnit::Script(Script::new(
                    info.clone(),
                    Rc::new(BytecodeScript::new(chunk, info)),
                ))
            }
            Tree::Function(data) => {
                let function = Rc::new(Compiler::compile_function(&data));
                let object = make_closure(&function, request.scope, &info);
                CompiledUnit::Function(CompiledFunction::new(info, object))
            }
        })
    }
}
