//! Execution backends and the units they produce.
//!
//! A backend turns a transformed tree into a [`CompiledUnit`]. Two exist:
//!
//! ```text
//! level -1      → interpreter (tree walking, always available)
//! level 0..=9   → bytecode    (constant folding + stack VM, `optimizer` feature)
//! ```
//!
//! The set is decided once per process by [`BackendRegistry::discover`]; without an
//! optimizing backend the registry holds the interpreter alone.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::parser::api::TokenStream;
use crate::parser::ast::{FunctionData, ProgramData};
use crate::runner::context::security::{CallerClass, SecurityDomain, SecuritySupport};
use crate::runner::context::{Context, FrameInfo, INTERPRET_ONLY};
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::construct;
use crate::runner::ds::value::JsValue;
use crate::runner::eval::InterpreterBackend;
#[cfg(feature = "optimizer")]
use crate::runner::jit::BytecodeBackend;

/// Tree handed to a backend for emission.
#[derive(Debug, Clone)]
pub enum Tree {
    Program(ProgramData),
    Function(Rc<FunctionData>),
}

/// Naming of generated units, passed through to the backend untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNaming {
    pub target_class_file_name: Option<String>,
    pub target_package: Option<String>,
}
impl ClassNaming {
    /// `<package>.<file-or-c><serial>`, without the package part when none is set.
    pub fn class_name(&self, serial: usize) -> String {
        let base = self
            .target_class_file_name
            .as_deref()
            .map(|f| f.trim_end_matches(".class"))
            .unwrap_or("c");
        match &self.target_package {
            Some(p) if !p.is_empty() => format!("{}.{}{}", p, base, serial),
            _ => format!("{}{}", base, serial),
        }
    }
}

/// Everything a backend gets to build a unit.
pub struct EmitRequest<'a> {
    pub cx: &'a Context,
    pub scope: &'a JsObjectType,
    pub tree: Tree,
    pub security_domain: Option<SecurityDomain>,
    pub security_support: Option<Arc<dyn SecuritySupport>>,
    pub naming: ClassNaming,
    pub source_name: Option<String>,
    pub line: u32,
}

pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }

    fn is_optimizing(&self) -> bool;

    /// Semantic transform over a parsed program. Errors go through the context.
    fn transform(
        &self,
        cx: &Context,
        ts: &TokenStream,
        program: ProgramData,
    ) -> Result<ProgramData, EngineError>;

    fn emit(&self, request: EmitRequest<'_>) -> Result<CompiledUnit, EngineError>;
}

/// Ordered backends, interpreter first.
pub struct BackendRegistry {
    backends: Vec<Arc<dyn Backend>>,
}

lazy_static! {
    static ref GLOBAL_BACKENDS: Arc<BackendRegistry> = Arc::new(BackendRegistry::discover());
}

impl BackendRegistry {
    /// The interpreter plus every compiled-in optimizing backend that reports itself
    /// available.
    pub fn discover() -> Self {
        let mut candidates: Vec<Arc<dyn Backend>> = vec![Arc::new(InterpreterBackend)];
        #[cfg(feature = "optimizer")]
        candidates.push(Arc::new(BytecodeBackend::new()));
        let backends: Vec<Arc<dyn Backend>> =
            candidates.into_iter().filter(|b| b.is_available()).collect();
        debug!(
            backends = ?backends.iter().map(|b| b.name()).collect::<Vec<_>>(),
            "discovered backends"
        );
        BackendRegistry { backends }
    }

    pub fn interpreter_only() -> Self {
        BackendRegistry {
            backends: vec![Arc::new(InterpreterBackend)],
        }
    }

    pub fn from_backends(backends: Vec<Arc<dyn Backend>>) -> Self {
        BackendRegistry { backends }
    }

    pub fn global() -> Arc<BackendRegistry> {
        GLOBAL_BACKENDS.clone()
    }

    pub fn interpreter(&self) -> Arc<dyn Backend> {
        match self.backends.iter().find(|b| !b.is_optimizing()) {
            Some(b) => b.clone(),
            None => Arc::new(InterpreterBackend),
        }
    }

    pub fn optimizing(&self) -> Option<Arc<dyn Backend>> {
        self.backends.iter().find(|b| b.is_optimizing()).cloned()
    }

    pub fn has_optimizer(&self) -> bool {
        self.optimizing().is_some()
    }

    pub fn select(&self, optimization_level: i32) -> Arc<dyn Backend> {
        if optimization_level == INTERPRET_ONLY {
            return self.interpreter();
        }
        self.optimizing().unwrap_or_else(|| self.interpreter())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}

/// Identity of an emitted unit, reasserted on each invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitInfo {
    pub class_name: String,
    pub source_name: Option<String>,
    pub line: u32,
    pub security_domain: Option<SecurityDomain>,
    pub caller_class: CallerClass,
}
impl UnitInfo {
    fn frame(&self) -> FrameInfo {
        FrameInfo {
            source_name: self.source_name.clone(),
            line: self.line,
            security_domain: self.security_domain.clone(),
        }
    }
}

/// Backend-specific body of a compiled program.
pub trait ScriptBody {
    fn exec(&self, cx: &Context, scope: &JsObjectType) -> Result<JsValue, EngineError>;
}

/// A compiled top-level program.
#[derive(Clone)]
pub struct Script {
    info: Rc<UnitInfo>,
    body: Rc<dyn ScriptBody>,
}
impl Script {
    pub fn new(info: Rc<UnitInfo>, body: Rc<dyn ScriptBody>) -> Self {
        Script { info, body }
    }

    pub fn info(&self) -> &UnitInfo {
        &self.info
    }

    /// Run against `scope`. Yields the value of the last expression statement.
    pub fn exec(&self, cx: &Context, scope: &JsObjectType) -> Result<JsValue, EngineError> {
        let _frame = cx.enter_frame(self.info.frame())?;
        cx.debug_observer().on_execute(self.info.source_name.as_deref());
        self.body.exec(cx, scope)
    }
}
impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Script").field("info", &self.info).finish()
    }
}

/// A compiled function fragment, callable repeatedly.
#[derive(Clone)]
pub struct CompiledFunction {
    info: Rc<UnitInfo>,
    function: JsObjectType,
}
impl CompiledFunction {
    pub fn new(info: Rc<UnitInfo>, function: JsObjectType) -> Self {
        CompiledFunction { info, function }
    }

    pub fn info(&self) -> &UnitInfo {
        &self.info
    }

    pub fn function_object(&self) -> &JsObjectType {
        &self.function
    }

    /// Call with `this`; a null or undefined `this` means `scope`.
    pub fn call(
        &self,
        cx: &Context,
        scope: &JsObjectType,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError> {
        let _frame = cx.enter_frame(self.info.frame())?;
        let this = if this.is_null_or_undefined() {
            JsValue::Object(scope.clone())
        } else {
            this
        };
        let callable = self
            .function
            .borrow()
            .as_function()
            .map(|f| f.callable())
            .ok_or_else(|| EngineError::NotAFunction(self.info.class_name.clone()))?;
        callable.call(cx, &self.function, this, args)
    }

    pub fn construct(&self, cx: &Context, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
        let _frame = cx.enter_frame(self.info.frame())?;
        construct(cx, &JsValue::Object(self.function.clone()), args)
    }
}
impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("info", &self.info)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum CompiledUnit {
    Script(Script),
    Function(CompiledFunction),
}
impl CompiledUnit {
    pub fn info(&self) -> &UnitInfo {
        match self {
            CompiledUnit::Script(s) => s.info(),
            CompiledUnit::Function(f) => f.info(),
        }
    }
}
