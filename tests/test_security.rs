//! Tests for security domains.
//!
//! A host support object exposes a fixed caller stack; these tests check
//! how domains are resolved from it, how compiled units carry and assert
//! them, and how misuse is rejected.

extern crate just_runtime;

use std::sync::Arc;

use parking_lot::Mutex;

use just_runtime::runner::context::security::{
    CallerClass, SecurityDomain, SecuritySupport, REQUIRED_DOMAIN_MISSING,
};
use just_runtime::runner::context::{Context, FrameInfo};
use just_runtime::runner::ds::error::EngineError;
use just_runtime::runner::ds::object::JsObjectType;
use just_runtime::runner::ds::value::JsValue;
use just_runtime::runner::plugin::registry::BuiltInRegistry;
use just_runtime::runner::plugin::types::BuiltInObject;

/// Caller stack fixed at construction; classes named `trusted.*` map to a domain
/// of the same name.
struct HostStack {
    classes: Vec<CallerClass>,
    defined: Mutex<Vec<(String, Option<SecurityDomain>)>>,
}

impl HostStack {
    fn new(classes: Vec<CallerClass>) -> Arc<Self> {
        Arc::new(HostStack {
            classes,
            defined: Mutex::new(Vec::new()),
        })
    }
}

impl SecuritySupport for HostStack {
    fn class_context(&self) -> Vec<CallerClass> {
        self.classes.clone()
    }

    fn security_domain(&self, class: &CallerClass) -> Option<SecurityDomain> {
        match class {
            CallerClass::Named(name) if name.starts_with("trusted.") => {
                Some(SecurityDomain::new(name))
            }
            _ => None,
        }
    }

    fn define_class(&self, name: &str, domain: Option<&SecurityDomain>) -> String {
        self.defined
            .lock()
            .push((name.to_string(), domain.cloned()));
        name.to_string()
    }
}

fn named(name: &str) -> CallerClass {
    CallerClass::Named(name.to_string())
}

/// Returns the domain asserted by whatever unit is running.
fn probe_domain(
    cx: &Context,
    _this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    Ok(match cx.interpreter_security_domain() {
        Some(domain) => JsValue::String(domain.0),
        None => JsValue::Null,
    })
}

fn scope_with_probe(cx: &Context) -> JsObjectType {
    let scope = cx.init_standard_objects().expect("standard objects");
    let mut registry = BuiltInRegistry::new();
    registry.register_object(BuiltInObject::new("probe", probe_domain).with_no_prototype());
    registry.install(cx, &scope).expect("probe installs");
    scope
}

// ============================================================================
// Resolution from the caller stack
// ============================================================================

mod resolution_tests {
    use super::*;

    #[test]
    fn test_no_support_follows_required_policy() {
        let cx = Context::new();
        if Context::is_security_domain_required() {
            match cx.security_domain_any() {
                Err(EngineError::Security(message)) => assert_eq!(message, REQUIRED_DOMAIN_MISSING),
                other => panic!("expected a security error, got {:?}", other),
            }
            assert!(matches!(
                cx.security_domain_for_stack_depth(Some(0)),
                Err(EngineError::Security(_))
            ));
        } else {
            assert_eq!(cx.security_domain_any().unwrap(), None);
        }
    }

    #[test]
    fn test_compile_without_support_needs_no_domain() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let script = cx.compile_string(&scope, "1;", None, 1, None).unwrap();
        assert!(script.is_some());
    }

    #[test]
    fn test_depth_skips_support_frame() {
        let cx = Context::new();
        cx.set_security_support(HostStack::new(vec![
            named("trusted.support"),
            named("trusted.first"),
            named("trusted.second"),
        ]))
        .unwrap();
        assert_eq!(
            cx.security_domain_for_stack_depth(Some(0)).unwrap(),
            Some(SecurityDomain::new("trusted.first"))
        );
        assert_eq!(
            cx.security_domain_for_stack_depth(Some(1)).unwrap(),
            Some(SecurityDomain::new("trusted.second"))
        );
    }

    #[test]
    fn test_scan_finds_first_domain() {
        let cx = Context::new();
        cx.set_security_support(HostStack::new(vec![
            named("support"),
            named("plain.Caller"),
            named("trusted.app"),
        ]))
        .unwrap();
        assert_eq!(
            cx.security_domain_any().unwrap(),
            Some(SecurityDomain::new("trusted.app"))
        );
    }

    #[test]
    fn test_interpreter_frame_uses_running_unit_domain() {
        let cx = Context::new();
        cx.set_security_support(HostStack::new(vec![
            named("support"),
            CallerClass::Interpreter,
        ]))
        .unwrap();
        {
            let _frame = cx
                .enter_frame(FrameInfo {
                    source_name: Some("unit".to_string()),
                    line: 1,
                    security_domain: Some(SecurityDomain::new("asserted")),
                })
                .unwrap();
            assert_eq!(
                cx.security_domain_for_stack_depth(Some(0)).unwrap(),
                Some(SecurityDomain::new("asserted"))
            );
        }
        assert_eq!(cx.interpreter_security_domain(), None);
    }

    #[test]
    fn test_missing_required_domain() {
        let cx = Context::new();
        cx.set_security_support(HostStack::new(vec![named("support"), named("plain.Caller")]))
            .unwrap();
        match cx.security_domain_any() {
            Err(EngineError::Security(message)) => assert_eq!(message, REQUIRED_DOMAIN_MISSING),
            other => panic!("expected a security error, got {:?}", other),
        }
    }
}

// ============================================================================
// Installation rules
// ============================================================================

mod installation_tests {
    use super::*;

    #[test]
    fn test_support_installs_once() {
        let cx = Context::new();
        assert!(cx.security_support().is_none());
        cx.set_security_support(HostStack::new(vec![])).unwrap();
        let again = cx.set_security_support(HostStack::new(vec![]));
        assert!(matches!(again, Err(EngineError::Security(_))));
    }

    #[test]
    fn test_domain_without_support_is_rejected() {
        let cx = Context::new();
        let scope = cx.init_standard_objects().unwrap();
        let result = cx.compile_string(&scope, "1;", None, 1, Some(SecurityDomain::new("d")));
        assert!(matches!(result, Err(EngineError::Security(_))));
        let result = cx.compile_function(
            &scope,
            "function f() {}",
            None,
            1,
            Some(SecurityDomain::new("d")),
        );
        assert!(matches!(result, Err(EngineError::Security(_))));
    }

    #[test]
    fn test_compile_without_resolvable_domain_fails() {
        let cx = Context::new();
        cx.set_security_support(HostStack::new(vec![named("support")]))
            .unwrap();
        let scope = cx.init_standard_objects().unwrap();
        let result = cx.compile_string(&scope, "1;", None, 1, None);
        assert!(matches!(result, Err(EngineError::Security(_))));
    }
}

// ============================================================================
// Domains carried by compiled units
// ============================================================================

mod execution_tests {
    use super::*;

    fn run_probe(level: i32) {
        let cx = Context::new();
        cx.set_optimization_level(level);
        cx.set_security_support(HostStack::new(vec![named("support"), named("trusted.host")]))
            .unwrap();
        let scope = scope_with_probe(&cx);

        let script = cx
            .compile_string(&scope, "probe();", Some("probe.js"), 1, None)
            .unwrap()
            .unwrap();
        assert_eq!(
            script.info().security_domain,
            Some(SecurityDomain::new("trusted.host"))
        );
        assert_eq!(
            script.exec(&cx, &scope).unwrap(),
            JsValue::String("trusted.host".to_string())
        );

        let explicit = cx
            .evaluate_string(
                &scope,
                "function inner() { return probe(); } inner();",
                None,
                1,
                Some(SecurityDomain::new("explicit")),
            )
            .unwrap();
        assert_eq!(explicit, Some(JsValue::String("explicit".to_string())));
        assert_eq!(cx.interpreter_security_domain(), None);
        assert_eq!(cx.frame_depth(), 0);
    }

    #[test]
    fn test_interpreted_unit_asserts_domain() {
        run_probe(-1);
    }

    #[cfg(feature = "optimizer")]
    #[test]
    fn test_bytecode_unit_asserts_domain() {
        run_probe(3);
    }

    #[cfg(feature = "optimizer")]
    #[test]
    fn test_bytecode_units_are_defined_under_domain() {
        use just_runtime::runner::backend::BackendRegistry;

        let cx = Context::with_backends(Arc::new(BackendRegistry::discover()));
        cx.set_optimization_level(1);
        let support = HostStack::new(vec![named("support"), named("trusted.loader")]);
        cx.set_security_support(support.clone()).unwrap();
        let scope = cx.init_standard_objects().unwrap();

        cx.compile_string(&scope, "1;", None, 1, None).unwrap().unwrap();
        cx.compile_function(&scope, "function f() {}", None, 1, Some(SecurityDomain::new("own")))
            .unwrap()
            .unwrap();

        let defined = support.defined.lock();
        assert_eq!(
            *defined,
            vec![
                ("c0".to_string(), Some(SecurityDomain::new("trusted.loader"))),
                ("c1".to_string(), Some(SecurityDomain::new("own"))),
            ]
        );
    }

    #[test]
    fn test_interpreter_defines_nothing() {
        let cx = Context::new();
        cx.set_optimization_level(-1);
        let support = HostStack::new(vec![named("support"), named("trusted.loader")]);
        cx.set_security_support(support.clone()).unwrap();
        let scope = cx.init_standard_objects().unwrap();
        cx.compile_string(&scope, "1;", None, 1, None).unwrap().unwrap();
        assert!(support.defined.lock().is_empty());
    }
}
