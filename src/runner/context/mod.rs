//! The execution context: per-session configuration, diagnostics state, security policy
//! and the entry points for compiling and evaluating source text.
//!
//! A `Context` is a cheap handle; clones refer to the same session. Threads bind to a
//! context through the [`registry::ContextRegistry`].

pub mod config;
pub mod debug;
pub mod registry;
pub mod report;
pub mod security;

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::runner::backend::{Backend, BackendRegistry, ClassNaming, CompiledFunction, CompiledUnit, Script};
use crate::runner::context::config::RuntimeConfig;
use crate::runner::context::debug::{DebugObserver, NoopDebugObserver};
use crate::runner::context::registry::{ContextRegistry, ContextScope};
use crate::runner::context::report::{DefaultErrorReporter, ErrorReporter, SourcePosition};
use crate::runner::context::security::{
    CallerClass, SecurityDomain, SecurityResolver, SecuritySupport,
};
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::{new_object, JsObjectType, NativeObject};
use crate::runner::ds::operations::object as object_ops;
use crate::runner::ds::operations::type_conversion;
use crate::runner::ds::value::JsValue;
use crate::runner::pipeline::CompilationPipeline;
use crate::runner::plugin::registry::BuiltInRegistry;

pub const IMPLEMENTATION_VERSION: &str = concat!("just-runtime ", env!("CARGO_PKG_VERSION"));

/// Optimization level that selects the interpreter.
pub const INTERPRET_ONLY: i32 = -1;
pub const MAX_OPTIMIZATION_LEVEL: i32 = 9;
pub const MAX_DEBUG_LEVEL: i32 = 9;

/// Nesting limit for compiled-unit and function frames.
pub const MAX_FRAME_DEPTH: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LanguageVersion {
    Default,
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
}
impl LanguageVersion {
    pub fn code(&self) -> i32 {
        match self {
            LanguageVersion::Default => 0,
            LanguageVersion::V1_0 => 100,
            LanguageVersion::V1_1 => 110,
            LanguageVersion::V1_2 => 120,
            LanguageVersion::V1_3 => 130,
            LanguageVersion::V1_4 => 140,
            LanguageVersion::V1_5 => 150,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => LanguageVersion::Default,
            100 => LanguageVersion::V1_0,
            110 => LanguageVersion::V1_1,
            120 => LanguageVersion::V1_2,
            130 => LanguageVersion::V1_3,
            140 => LanguageVersion::V1_4,
            150 => LanguageVersion::V1_5,
            _ => return None,
        })
    }

    /// ECMA-262 edition 1 semantics apply to the default version and 1.3 onwards.
    pub fn is_ecma1(&self) -> bool {
        *self == LanguageVersion::Default || *self >= LanguageVersion::V1_3
    }
}
impl Default for LanguageVersion {
    fn default() -> Self {
        LanguageVersion::Default
    }
}
impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageVersion::Default => write!(f, "default"),
            v => write!(f, "{}.{}", v.code() / 100, (v.code() % 100) / 10),
        }
    }
}

pub enum PropertyChange {
    LanguageVersion {
        old: LanguageVersion,
        new: LanguageVersion,
    },
    ErrorReporter {
        old: Option<Arc<dyn ErrorReporter>>,
        new: Arc<dyn ErrorReporter>,
    },
}

pub trait PropertyChangeListener: Send + Sync {
    fn property_changed(&self, cx: &Context, change: &PropertyChange);
}

/// Explicit metadata for one active compiled-unit or function invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub source_name: Option<String>,
    pub line: u32,
    pub security_domain: Option<SecurityDomain>,
}

type ThreadLocalValue = Arc<dyn Any + Send + Sync>;

struct ContextState {
    language_version: LanguageVersion,
    optimization_level: i32,
    generating_debug: bool,
    generating_debug_changed: bool,
    generating_source: bool,
    debug_level: i32,
    locale: String,
    error_reporter: Option<Arc<dyn ErrorReporter>>,
    suppress_reporter_hook: bool,
    security_support: Option<Arc<dyn SecuritySupport>>,
    interpreter_security_domain: Option<SecurityDomain>,
    error_count: usize,
    thread_local: HashMap<String, ThreadLocalValue>,
    serializing: HashSet<usize>,
    debug_observer: Option<Arc<dyn DebugObserver>>,
    listeners: Vec<Arc<dyn PropertyChangeListener>>,
    frames: Vec<FrameInfo>,
    last_position: Option<(Option<String>, u32)>,
    dynamic_scope: bool,
    naming: ClassNaming,
}

struct ContextInner {
    id: Uuid,
    backends: Arc<BackendRegistry>,
    state: Mutex<ContextState>,
    compile_check: Mutex<()>,
}

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("id", &self.inner.id).finish()
    }
}

/// Drops one frame pushed by [`Context::enter_frame`], restoring the interpreter domain.
pub struct FrameGuard<'a> {
    cx: &'a Context,
    previous_domain: Option<SecurityDomain>,
}
impl<'a> Drop for FrameGuard<'a> {
    fn drop(&mut self) {
        let mut state = self.cx.state();
        state.frames.pop();
        state.interpreter_security_domain = self.previous_domain.take();
    }
}

/// Saved reporter configuration restored when an interactive completeness check ends.
pub(crate) struct SavedReporter {
    reporter: Option<Arc<dyn ErrorReporter>>,
    suppress_hook: bool,
}

impl Context {
    /// A standalone context using the process-wide backend registry.
    pub fn new() -> Self {
        Self::with_backends(BackendRegistry::global())
    }

    pub fn with_backends(backends: Arc<BackendRegistry>) -> Self {
        let optimization_level = if backends.has_optimizer() {
            0
        } else {
            INTERPRET_ONLY
        };
        Context {
            inner: Arc::new(ContextInner {
                id: Uuid::new_v4(),
                backends,
                state: Mutex::new(ContextState {
                    language_version: LanguageVersion::Default,
                    optimization_level,
                    generating_debug: false,
                    generating_debug_changed: false,
                    generating_source: true,
                    debug_level: 0,
                    locale: "en-US".to_string(),
                    error_reporter: None,
                    suppress_reporter_hook: false,
                    security_support: None,
                    interpreter_security_domain: None,
                    error_count: 0,
                    thread_local: HashMap::new(),
                    serializing: HashSet::new(),
                    debug_observer: None,
                    listeners: Vec::new(),
                    frames: Vec::new(),
                    last_position: None,
                    dynamic_scope: false,
                    naming: ClassNaming::default(),
                }),
                compile_check: Mutex::new(()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ContextState> {
        self.inner.state.lock()
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Thread binding ───────────────────────────────────────

    /// Bind a context to the calling thread (reusing one already bound).
    pub fn enter() -> Context {
        ContextRegistry::global().acquire(None)
    }

    /// Bind `cx` to the calling thread unless the thread already has a context or `cx`
    /// is bound elsewhere.
    pub fn enter_with(cx: &Context) -> Context {
        ContextRegistry::global().acquire(Some(cx.clone()))
    }

    pub fn exit() {
        ContextRegistry::global().release()
    }

    /// Scoped `enter`/`exit` pair.
    pub fn scoped() -> ContextScope<'static> {
        ContextRegistry::global().enter(None)
    }

    pub fn current() -> Option<Context> {
        ContextRegistry::global().current_context()
    }

    pub fn implementation_version() -> &'static str {
        IMPLEMENTATION_VERSION
    }

    // ── Language version ─────────────────────────────────────

    pub fn language_version(&self) -> LanguageVersion {
        self.state().language_version
    }

    pub fn set_language_version(&self, version: LanguageVersion) {
        let (old, listeners) = {
            let mut state = self.state();
            let old = state.language_version;
            state.language_version = version;
            (old, state.listeners.clone())
        };
        if old != version {
            let change = PropertyChange::LanguageVersion { old, new: version };
            for listener in listeners.iter() {
                listener.property_changed(self, &change);
            }
        }
    }

    pub fn add_property_change_listener(&self, listener: Arc<dyn PropertyChangeListener>) {
        self.state().listeners.push(listener);
    }

    pub fn remove_property_change_listener(&self, listener: &Arc<dyn PropertyChangeListener>) {
        self.state()
            .listeners
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    // ── Error reporting ──────────────────────────────────────

    /// The reporter diagnostics go to: a debug hook if installed, else the configured
    /// reporter, else a default reporter that raises on errors.
    pub fn error_reporter(&self) -> Arc<dyn ErrorReporter> {
        let (observer, configured) = {
            let state = self.state();
            let observer = if state.suppress_reporter_hook {
                None
            } else {
                state.debug_observer.clone()
            };
            (observer, state.error_reporter.clone())
        };
        if let Some(hook) = observer.and_then(|o| o.error_reporter_hook()) {
            return hook;
        }
        match configured {
            Some(reporter) => reporter,
            None => {
                let reporter: Arc<dyn ErrorReporter> = Arc::new(DefaultErrorReporter);
                self.state().error_reporter = Some(reporter.clone());
                reporter
            }
        }
    }

    /// Replace the configured reporter, returning the previous one.
    pub fn set_error_reporter(&self, reporter: Arc<dyn ErrorReporter>) -> Option<Arc<dyn ErrorReporter>> {
        let (old, listeners) = {
            let mut state = self.state();
            let old = state.error_reporter.replace(reporter.clone());
            (old, state.listeners.clone())
        };
        let change = PropertyChange::ErrorReporter {
            old: old.clone(),
            new: reporter,
        };
        for listener in listeners.iter() {
            listener.property_changed(self, &change);
        }
        old
    }

    pub(crate) fn install_check_reporter(&self) -> SavedReporter {
        let mut state = self.state();
        let saved = SavedReporter {
            reporter: state.error_reporter.take(),
            suppress_hook: state.suppress_reporter_hook,
        };
        state.error_reporter = Some(Arc::new(DefaultErrorReporter));
        state.suppress_reporter_hook = true;
        saved
    }

    pub(crate) fn restore_reporter(&self, saved: SavedReporter) {
        let mut state = self.state();
        state.error_reporter = saved.reporter;
        state.suppress_reporter_hook = saved.suppress_hook;
    }

    pub fn report_warning(&self, message: &str, position: SourcePosition) {
        self.error_reporter().warning(message, &position);
    }

    /// Count and deliver an error. `Err` means the reporter escalated it.
    pub fn report_error(&self, message: &str, position: SourcePosition) -> Result<(), EngineError> {
        self.state().error_count += 1;
        self.error_reporter()
            .error(message, &position)
            .map_err(EngineError::from)
    }

    /// Count and deliver a fatal runtime error; the caller propagates the result.
    pub fn report_runtime_error(&self, message: &str, position: SourcePosition) -> EngineError {
        self.state().error_count += 1;
        self.error_reporter().runtime_error(message, &position).into()
    }

    pub fn error_count(&self) -> usize {
        self.state().error_count
    }

    pub(crate) fn reset_error_count(&self) {
        self.state().error_count = 0;
    }

    /// Innermost frame position, else the last interpreted position, else unknown.
    pub fn current_position(&self) -> SourcePosition {
        let state = self.state();
        if let Some(frame) = state.frames.last() {
            return SourcePosition::new(frame.source_name.as_deref(), frame.line);
        }
        match &state.last_position {
            Some((name, line)) => SourcePosition::new(name.as_deref(), *line),
            None => SourcePosition::unknown(),
        }
    }

    pub fn locale(&self) -> String {
        self.state().locale.clone()
    }

    pub fn set_locale(&self, locale: &str) {
        self.state().locale = locale.to_string();
    }

    // ── Optimization and debug flags ─────────────────────────

    pub fn optimization_level(&self) -> i32 {
        self.state().optimization_level
    }

    /// Clamp to -1..=9; forced to -1 when no optimizing backend is available.
    pub fn set_optimization_level(&self, level: i32) {
        let level = if self.inner.backends.has_optimizer() {
            level.clamp(INTERPRET_ONLY, MAX_OPTIMIZATION_LEVEL)
        } else {
            INTERPRET_ONLY
        };
        self.state().optimization_level = level;
    }

    pub fn is_generating_debug(&self) -> bool {
        self.state().generating_debug
    }

    pub fn is_generating_debug_changed(&self) -> bool {
        self.state().generating_debug_changed
    }

    /// Enabling debug info sets the optimization level to 0.
    pub fn set_generating_debug(&self, generating_debug: bool) {
        {
            let mut state = self.state();
            state.generating_debug_changed = true;
            state.generating_debug = generating_debug;
        }
        if generating_debug {
            self.set_optimization_level(0);
        }
    }

    pub fn is_generating_source(&self) -> bool {
        self.state().generating_source
    }

    pub fn set_generating_source(&self, generating_source: bool) {
        self.state().generating_source = generating_source;
    }

    pub fn debug_level(&self) -> i32 {
        self.state().debug_level
    }

    /// Clamped to 0..=9. Any positive level sets the optimization level to 0.
    pub fn set_debug_level(&self, level: i32) {
        let level = level.clamp(0, MAX_DEBUG_LEVEL);
        self.state().debug_level = level;
        if level > 0 {
            self.set_optimization_level(0);
        }
    }

    pub fn has_compile_functions_with_dynamic_scope(&self) -> bool {
        self.state().dynamic_scope
    }

    pub fn set_compile_functions_with_dynamic_scope(&self, flag: bool) {
        self.state().dynamic_scope = flag;
    }

    // ── Naming of generated units ────────────────────────────

    pub fn target_class_file_name(&self) -> Option<String> {
        self.state().naming.target_class_file_name.clone()
    }

    /// Stored only when an optimizing backend exists.
    pub fn set_target_class_file_name(&self, name: Option<&str>) {
        if self.inner.backends.has_optimizer() {
            self.state().naming.target_class_file_name = name.map(|n| n.to_string());
        }
    }

    pub fn target_package(&self) -> Option<String> {
        self.state().naming.target_package.clone()
    }

    pub fn set_target_package(&self, package: Option<&str>) {
        if self.inner.backends.has_optimizer() {
            self.state().naming.target_package = package.map(|p| p.to_string());
        }
    }

    pub fn class_naming(&self) -> ClassNaming {
        self.state().naming.clone()
    }

    // ── Security ─────────────────────────────────────────────

    pub fn security_support(&self) -> Option<Arc<dyn SecuritySupport>> {
        self.state().security_support.clone()
    }

    /// Install the security support. It can be set once per context.
    pub fn set_security_support(&self, support: Arc<dyn SecuritySupport>) -> Result<(), EngineError> {
        let mut state = self.state();
        if state.security_support.is_some() {
            return Err(EngineError::Security(
                "cannot overwrite existing security support".to_string(),
            ));
        }
        state.security_support = Some(support);
        Ok(())
    }

    pub fn is_security_domain_required() -> bool {
        RuntimeConfig::global().require_security_domain
    }

    /// Domain asserted by the innermost running unit.
    pub fn interpreter_security_domain(&self) -> Option<SecurityDomain> {
        self.state().interpreter_security_domain.clone()
    }

    pub fn is_interpreter_class(class: &CallerClass) -> bool {
        *class == CallerClass::Interpreter
    }

    pub fn security_resolver(&self) -> SecurityResolver {
        let state = self.state();
        SecurityResolver::new(
            state.security_support.clone(),
            state.interpreter_security_domain.clone(),
            Self::is_security_domain_required(),
        )
    }

    /// Domain of the caller `depth` frames up; `None` scans for the first available.
    pub fn security_domain_for_stack_depth(
        &self,
        depth: Option<usize>,
    ) -> Result<Option<SecurityDomain>, EngineError> {
        self.security_resolver().domain_for_depth(depth)
    }

    pub fn security_domain_any(&self) -> Result<Option<SecurityDomain>, EngineError> {
        self.security_resolver().domain_any()
    }

    // ── Frames ───────────────────────────────────────────────

    /// Push an invocation frame and assert its security domain until the guard drops.
    pub fn enter_frame(&self, frame: FrameInfo) -> Result<FrameGuard<'_>, EngineError> {
        let depth = self.state().frames.len();
        if depth >= MAX_FRAME_DEPTH {
            let position = self.current_position();
            return Err(self.report_runtime_error("too much recursion", position));
        }
        let mut state = self.state();
        let previous_domain = std::mem::replace(
            &mut state.interpreter_security_domain,
            frame.security_domain.clone(),
        );
        state.last_position = Some((frame.source_name.clone(), frame.line));
        state.frames.push(frame);
        Ok(FrameGuard {
            cx: self,
            previous_domain,
        })
    }

    pub fn frame_depth(&self) -> usize {
        self.state().frames.len()
    }

    /// Record the line the innermost frame is executing.
    pub fn set_current_line(&self, line: u32) {
        let mut state = self.state();
        let name = match state.frames.last_mut() {
            Some(frame) => {
                frame.line = line;
                frame.source_name.clone()
            }
            None => None,
        };
        state.last_position = Some((name, line));
    }

    // ── Serialization guard ──────────────────────────────────

    /// Mark an object as being rendered. False when it already is.
    pub fn begin_serialization(&self, object_id: usize) -> bool {
        self.state().serializing.insert(object_id)
    }

    pub fn end_serialization(&self, object_id: usize) {
        self.state().serializing.remove(&object_id);
    }

    pub fn serialization_in_progress(&self) -> usize {
        self.state().serializing.len()
    }

    // ── Caller-owned data and observers ──────────────────────

    pub fn get_thread_local(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.state().thread_local.get(key).cloned()
    }

    pub fn put_thread_local(&self, key: &str, value: Arc<dyn Any + Send + Sync>) {
        self.state().thread_local.insert(key.to_string(), value);
    }

    pub fn remove_thread_local(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.state().thread_local.remove(key)
    }

    pub fn debug_observer(&self) -> Arc<dyn DebugObserver> {
        match &self.state().debug_observer {
            Some(observer) => observer.clone(),
            None => Arc::new(NoopDebugObserver),
        }
    }

    pub fn set_debug_observer(&self, observer: Option<Arc<dyn DebugObserver>>) {
        self.state().debug_observer = observer;
    }

    pub fn is_debugging_active(&self) -> bool {
        self.state().debug_observer.is_some()
    }

    // ── Backends ─────────────────────────────────────────────

    pub fn backends(&self) -> Arc<BackendRegistry> {
        self.inner.backends.clone()
    }

    /// Interpreter for level -1, the optimizing backend otherwise when present.
    pub fn select_backend(&self) -> Arc<dyn Backend> {
        let level = self.optimization_level();
        let backend = self.inner.backends.select(level);
        if !backend.is_optimizing() && level != INTERPRET_ONLY {
            self.state().optimization_level = INTERPRET_ONLY;
        }
        debug!(backend = backend.name(), level, "selected backend");
        backend
    }

    // ── Compilation and evaluation ───────────────────────────

    fn check_domain_argument(&self, domain: &Option<SecurityDomain>) -> Result<(), EngineError> {
        if domain.is_some() && self.security_support().is_none() {
            return Err(EngineError::Security(
                "a security domain requires an installed security support".to_string(),
            ));
        }
        Ok(())
    }

    pub fn compile_string(
        &self,
        scope: &JsObjectType,
        source: &str,
        source_name: Option<&str>,
        line: u32,
        security_domain: Option<SecurityDomain>,
    ) -> Result<Option<Script>, EngineError> {
        self.check_domain_argument(&security_domain)?;
        let unit = CompilationPipeline::new(self).compile(
            scope,
            source,
            source_name,
            line,
            security_domain,
            false,
        )?;
        Ok(match unit {
            Some(CompiledUnit::Script(script)) => Some(script),
            _ => None,
        })
    }

    pub fn compile_reader<R: Read>(
        &self,
        scope: &JsObjectType,
        reader: R,
        source_name: Option<&str>,
        line: u32,
        security_domain: Option<SecurityDomain>,
    ) -> Result<Option<Script>, EngineError> {
        let source = read_source(reader)?;
        self.compile_string(scope, &source, source_name, line, security_domain)
    }

    /// Compile the first function defined by `source`.
    pub fn compile_function(
        &self,
        scope: &JsObjectType,
        source: &str,
        source_name: Option<&str>,
        line: u32,
        security_domain: Option<SecurityDomain>,
    ) -> Result<Option<CompiledFunction>, EngineError> {
        self.check_domain_argument(&security_domain)?;
        let unit = CompilationPipeline::new(self).compile(
            scope,
            source,
            source_name,
            line,
            security_domain,
            true,
        )?;
        Ok(match unit {
            Some(CompiledUnit::Function(function)) => Some(function),
            _ => None,
        })
    }

    /// Compile and run. `None` means nothing was compiled (empty input or reported errors).
    pub fn evaluate_string(
        &self,
        scope: &JsObjectType,
        source: &str,
        source_name: Option<&str>,
        line: u32,
        security_domain: Option<SecurityDomain>,
    ) -> Result<Option<JsValue>, EngineError> {
        match self.compile_string(scope, source, source_name, line, security_domain)? {
            Some(script) => script.exec(self, scope).map(Some),
            None => Ok(None),
        }
    }

    pub fn evaluate_reader<R: Read>(
        &self,
        scope: &JsObjectType,
        reader: R,
        source_name: Option<&str>,
        line: u32,
        security_domain: Option<SecurityDomain>,
    ) -> Result<Option<JsValue>, EngineError> {
        let source = read_source(reader)?;
        self.evaluate_string(scope, &source, source_name, line, security_domain)
    }

    /// Whether `source` is complete enough to compile. Only a failure at end of input
    /// counts as incomplete.
    pub fn is_compilable_unit(&self, source: &str) -> bool {
        let _serial = self.inner.compile_check.lock();
        CompilationPipeline::new(self).is_compilable_unit(source)
    }

    // ── Objects ──────────────────────────────────────────────

    /// Fresh global object populated with the standard constructors.
    pub fn init_standard_objects(&self) -> Result<JsObjectType, EngineError> {
        let global = new_object(NativeObject::with_class("global"));
        self.init_standard_objects_into(&global)?;
        Ok(global)
    }

    pub fn init_standard_objects_into(&self, scope: &JsObjectType) -> Result<(), EngineError> {
        BuiltInRegistry::with_core().install(self, scope)
    }

    /// `new Object()` in `scope`.
    pub fn new_object(&self, scope: &JsObjectType) -> Result<JsObjectType, EngineError> {
        self.new_object_with(scope, "Object", vec![])
    }

    pub fn new_object_with(
        &self,
        scope: &JsObjectType,
        constructor_name: &str,
        args: Vec<JsValue>,
    ) -> Result<JsObjectType, EngineError> {
        object_ops::new_object_by_name(self, scope, constructor_name, args)
    }

    pub fn new_array(&self, scope: &JsObjectType, length: u32) -> JsObjectType {
        let array = object_ops::new_array(scope, vec![]);
        array.borrow_mut().put_own("length".into(), JsValue::Number(length as f64));
        array
    }

    pub fn new_array_from(&self, scope: &JsObjectType, elements: Vec<JsValue>) -> JsObjectType {
        object_ops::new_array(scope, elements)
    }

    pub fn get_elements(&self, object: &JsObjectType) -> Result<Option<Vec<JsValue>>, EngineError> {
        object_ops::get_elements(self, object)
    }

    // ── Conversions ──────────────────────────────────────────

    pub fn to_boolean(value: &JsValue) -> bool {
        type_conversion::to_boolean(value)
    }

    pub fn to_number(&self, value: &JsValue) -> Result<f64, EngineError> {
        type_conversion::to_number(self, value)
    }

    pub fn to_string(&self, value: &JsValue) -> Result<String, EngineError> {
        type_conversion::to_string(self, value)
    }

    pub fn to_object(scope: &JsObjectType, value: &JsValue) -> Result<JsObjectType, EngineError> {
        type_conversion::to_object(scope, value)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

fn read_source<R: Read>(mut reader: R) -> Result<String, EngineError> {
    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|e| EngineError::Io(e.to_string()))?;
    Ok(source)
}
