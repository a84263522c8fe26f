//! Source text to compiled unit.
//!
//! ```text
//! reset errors → tokenize → select backend → parse → transform → [pick function] → emit
//! ```
//!
//! Ordinary compile errors never surface as `Err`: they are counted on the context and
//! delivered to its reporter, and the pipeline answers `Ok(None)`. An `Err` means a
//! reporter escalated or a security check failed.

use std::rc::Rc;

use tracing::debug;

use crate::parser::api::{parse, TokenStream};
use crate::parser::ast::{ExpressionType, FunctionData, ProgramData, StatementType};
use crate::runner::backend::{CompiledUnit, EmitRequest, Tree};
use crate::runner::context::security::SecurityDomain;
use crate::runner::context::{Context, SavedReporter};
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::JsObjectType;

pub struct CompilationPipeline<'a> {
    cx: &'a Context,
}

/// Puts the context's reporter back however the completeness check ends.
struct ReporterRestore<'a> {
    cx: &'a Context,
    saved: Option<SavedReporter>,
}
impl<'a> Drop for ReporterRestore<'a> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.cx.restore_reporter(saved);
        }
    }
}

impl<'a> CompilationPipeline<'a> {
    pub fn new(cx: &'a Context) -> Self {
        CompilationPipeline { cx }
    }

    pub fn compile(
        &self,
        scope: &JsObjectType,
        source: &str,
        source_name: Option<&str>,
        line: u32,
        security_domain: Option<SecurityDomain>,
        want_function: bool,
    ) -> Result<Option<CompiledUnit>, EngineError> {
        let cx = self.cx;
        cx.reset_error_count();
        cx.debug_observer().on_source_text(source_name, source);

        let mut ts = TokenStream::new(source, source_name, line);
        let backend = cx.select_backend();
        let security_domain = match security_domain {
            Some(d) => Some(d),
            None if cx.security_support().is_some() => cx.security_domain_any()?,
            None => None,
        };

        let program = match parse(cx, &mut ts)? {
            Some(program) => program,
            None => {
                debug!(source = ?source_name, errors = cx.error_count(), "nothing to compile");
                return Ok(None);
            }
        };
        let program = backend.transform(cx, &ts, program)?;
        let tree = if want_function {
            match first_function(&program) {
                Some(f) => Tree::Function(f),
                None => return Ok(None),
            }
        } else {
            Tree::Program(program)
        };
        if cx.error_count() > 0 {
            debug!(source = ?source_name, errors = cx.error_count(), "compile failed");
            return Ok(None);
        }

        let unit = backend.emit(EmitRequest {
            cx,
            scope,
            tree,
            security_domain,
            security_support: cx.security_support(),
            naming: cx.class_naming(),
            source_name: source_name.map(|s| s.to_string()),
            line,
        })?;
        let errors = cx.error_count();
        debug!(
            source = ?source_name,
            backend = backend.name(),
            class = %unit.info().class_name,
            errors,
            "compiled"
        );
        if errors == 0 {
            cx.debug_observer().on_script_load(source_name);
            Ok(Some(unit))
        } else {
            Ok(None)
        }
    }

    /// Parse and transform with a reporter that raises, never emitting. Incomplete only
    /// when the failure sits at end of input.
    pub fn is_compilable_unit(&self, source: &str) -> bool {
        let cx = self.cx;
        let _restore = ReporterRestore {
            cx,
            saved: Some(cx.install_check_reporter()),
        };
        cx.reset_error_count();
        let mut ts = TokenStream::new(source, None, 1);
        let outcome = parse(cx, &mut ts).and_then(|program| match program {
            Some(program) => cx
                .backends()
                .interpreter()
                .transform(cx, &ts, program)
                .map(|_| ()),
            None => Ok(()),
        });
        !(outcome.is_err() && ts.eof())
    }
}

/// First function defined at the top level of `program`.
fn first_function(program: &ProgramData) -> Option<Rc<FunctionData>> {
    program.body.iter().find_map(|statement| match statement {
        StatementType::FunctionDeclaration(f) => Some(f.clone()),
        StatementType::ExpressionStatement {
            expression: ExpressionType::FunctionExpression(f),
            ..
        } => Some(f.clone()),
        _ => None,
    })
}
