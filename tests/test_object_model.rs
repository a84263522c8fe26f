//! Tests for the standard constructors and the object model.
//!
//! These tests verify Object, Array and Error as installed by
//! `init_standard_objects`, source rendering of nested and cyclic
//! structures, and the conversion helpers on `Context`.

extern crate just_runtime;

use just_runtime::runner::context::{Context, LanguageVersion};
use just_runtime::runner::ds::error::EngineError;
use just_runtime::runner::ds::object::JsObjectType;
use just_runtime::runner::ds::value::JsValue;

fn setup() -> (Context, JsObjectType) {
    let cx = Context::new();
    let scope = cx.init_standard_objects().expect("standard objects");
    (cx, scope)
}

fn eval(cx: &Context, scope: &JsObjectType, code: &str) -> JsValue {
    cx.evaluate_string(scope, code, Some("test"), 1, None)
        .unwrap_or_else(|e| panic!("evaluating {:?} failed: {}", code, e))
        .unwrap_or_else(|| panic!("{:?} did not compile", code))
}

fn string(value: &str) -> JsValue {
    JsValue::String(value.to_string())
}

// ============================================================================
// Object
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_global_object_class() {
        let (_cx, scope) = setup();
        assert_eq!(scope.borrow().class_name(), "global");
    }

    #[test]
    fn test_default_to_string() {
        let (cx, scope) = setup();
        assert_eq!(
            eval(&cx, &scope, "var o = {a: 1}; o.toString();"),
            string("[object Object]")
        );
    }

    #[test]
    fn test_version_1_2_to_string_renders_source() {
        let (cx, scope) = setup();
        cx.set_language_version(LanguageVersion::V1_2);
        assert_eq!(
            eval(&cx, &scope, "var o = {a: 1, b: 'x'}; o.toString();"),
            string("{a:1, b:\"x\"}")
        );
    }

    #[test]
    fn test_has_own_property() {
        let (cx, scope) = setup();
        eval(&cx, &scope, "var o = {a: 1};");
        assert_eq!(eval(&cx, &scope, "o.hasOwnProperty('a');"), JsValue::Boolean(true));
        assert_eq!(
            eval(&cx, &scope, "o.hasOwnProperty('toString');"),
            JsValue::Boolean(false)
        );
    }

    #[test]
    fn test_property_is_enumerable() {
        let (cx, scope) = setup();
        eval(&cx, &scope, "var o = {a: 1};");
        assert_eq!(
            eval(&cx, &scope, "o.propertyIsEnumerable('a');"),
            JsValue::Boolean(true)
        );
        assert_eq!(
            eval(&cx, &scope, "o.propertyIsEnumerable('toString');"),
            JsValue::Boolean(false)
        );
        assert_eq!(
            eval(&cx, &scope, "Object.prototype.propertyIsEnumerable('toString');"),
            JsValue::Boolean(false)
        );
    }

    #[test]
    fn test_is_prototype_of() {
        let (cx, scope) = setup();
        eval(&cx, &scope, "var o = {};");
        assert_eq!(
            eval(&cx, &scope, "Object.prototype.isPrototypeOf(o);"),
            JsValue::Boolean(true)
        );
        assert_eq!(
            eval(&cx, &scope, "o.isPrototypeOf(Object.prototype);"),
            JsValue::Boolean(false)
        );
        assert_eq!(
            eval(&cx, &scope, "Array.prototype.isPrototypeOf([]);"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_object_called_as_function() {
        let (cx, scope) = setup();
        assert_eq!(eval(&cx, &scope, "typeof Object();"), string("object"));
        assert_eq!(eval(&cx, &scope, "typeof new Object();"), string("object"));
    }

    #[test]
    fn test_constructor_prototype_is_fixed() {
        let (cx, scope) = setup();
        eval(&cx, &scope, "Object.prototype = null;");
        assert_eq!(eval(&cx, &scope, "typeof Object.prototype;"), string("object"));
    }
}

// ============================================================================
// Source rendering
// ============================================================================

mod source_tests {
    use super::*;

    #[test]
    fn test_nested_to_source() {
        let (cx, scope) = setup();
        assert_eq!(
            eval(&cx, &scope, "var o = {n: 1, s: 'q\"', a: [1, 'a', [2]]}; o.toSource();"),
            string("{n:1, s:\"q\\\"\", a:[1, \"a\", [2]]}")
        );
    }

    #[test]
    fn test_cycle_renders_empty_object() {
        let (cx, scope) = setup();
        assert_eq!(
            eval(&cx, &scope, "var o = {a: 1}; o.self = o; o.toSource();"),
            string("{a:1, self:{}}")
        );
        assert_eq!(cx.serialization_in_progress(), 0);
    }

    #[test]
    fn test_array_cycle_renders_empty_array() {
        let (cx, scope) = setup();
        assert_eq!(
            eval(&cx, &scope, "var a = [1]; a[1] = a; a.toSource();"),
            string("[1, []]")
        );
    }

    #[test]
    fn test_guard_cleared_after_failure() {
        let (cx, scope) = setup();
        let result = cx.evaluate_string(
            &scope,
            "var o = {x: {toSource: function() { throw 'bad'; }}}; o.toSource();",
            None,
            1,
            None,
        );
        assert!(matches!(result, Err(EngineError::Uncaught(JsValue::String(ref s))) if s == "bad"));
        assert_eq!(cx.serialization_in_progress(), 0);
        assert_eq!(
            eval(&cx, &scope, "var p = {y: 2}; p.toSource();"),
            string("{y:2}")
        );
    }
}

// ============================================================================
// Array
// ============================================================================

mod array_tests {
    use super::*;

    #[test]
    fn test_array_length_argument() {
        let (cx, scope) = setup();
        assert_eq!(eval(&cx, &scope, "new Array(3).length;"), JsValue::Number(3.0));
        assert_eq!(eval(&cx, &scope, "Array(1, 2).length;"), JsValue::Number(2.0));
        assert_eq!(eval(&cx, &scope, "Array('3').length;"), JsValue::Number(1.0));
    }

    #[test]
    fn test_invalid_array_length() {
        let (cx, scope) = setup();
        let err = cx
            .evaluate_string(&scope, "new Array(-1);", None, 1, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Script(ref e) if e.name() == "RangeError"));
    }

    #[test]
    fn test_maximum_array_length() {
        let (cx, scope) = setup();
        assert_eq!(
            eval(&cx, &scope, "new Array(4294967295).length;"),
            JsValue::Number(4294967295.0)
        );
        let err = cx
            .evaluate_string(&scope, "new Array(4294967296);", None, 1, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Script(ref e) if e.name() == "RangeError"));
    }

    #[test]
    fn test_huge_sparse_array_does_not_expand() {
        let (cx, scope) = setup();
        for code in [
            "new Array(4294967294).join('');",
            "new Array(4294967294).toSource();",
        ] {
            let err = cx.evaluate_string(&scope, code, None, 1, None).unwrap_err();
            assert!(
                matches!(err, EngineError::Script(ref e) if e.name() == "RangeError"),
                "{}: {:?}",
                code,
                err
            );
        }
        let huge = cx.new_array(&scope, 4294967294);
        assert!(cx.get_elements(&huge).is_err());
        assert_eq!(eval(&cx, &scope, "new Array(3).join('-');"), string("--"));
    }

    #[test]
    fn test_join_and_to_string() {
        let (cx, scope) = setup();
        assert_eq!(eval(&cx, &scope, "[1, 2].toString();"), string("1,2"));
        assert_eq!(eval(&cx, &scope, "[1, null, 'x'].join('-');"), string("1--x"));
        assert_eq!(eval(&cx, &scope, "[1, 2].toSource();"), string("[1, 2]"));
    }

    #[test]
    fn test_new_array_from_context() {
        let (cx, scope) = setup();
        let sized = cx.new_array(&scope, 3);
        let elements = cx.get_elements(&sized).unwrap().expect("array-like");
        assert_eq!(elements, vec![JsValue::Undefined; 3]);

        let filled = cx.new_array_from(&scope, vec![JsValue::Number(1.0), string("b")]);
        let elements = cx.get_elements(&filled).unwrap().expect("array-like");
        assert_eq!(elements, vec![JsValue::Number(1.0), string("b")]);
        assert_eq!(filled.borrow().class_name(), "Array");
    }

    #[test]
    fn test_get_elements_requires_length() {
        let (cx, scope) = setup();
        let plain = cx.new_object(&scope).unwrap();
        assert!(cx.get_elements(&plain).unwrap().is_none());
    }
}

mod delete_tests {
    use super::*;
    use just_runtime::runner::ds::object_property::{PropertyAttributes, PropertyKey};
    use just_runtime::runner::ds::operations::object::{delete_property, has_own_property, has_property};

    #[test]
    fn test_delete_refuses_permanent() {
        let (cx, scope) = setup();
        let o = cx.new_object(&scope).unwrap();
        o.borrow_mut()
            .define_own("fixed".into(), JsValue::Number(1.0), PropertyAttributes::PERMANENT);
        o.borrow_mut()
            .define_own("loose".into(), JsValue::Number(2.0), PropertyAttributes::empty());

        assert!(!delete_property(&o, &PropertyKey::from("fixed")));
        assert!(has_own_property(&o, &PropertyKey::from("fixed")));
        assert!(delete_property(&o, &PropertyKey::from("loose")));
        assert!(!has_own_property(&o, &PropertyKey::from("loose")));
        assert!(delete_property(&o, &PropertyKey::from("never")));
    }

    #[test]
    fn test_delete_leaves_inherited() {
        let (cx, scope) = setup();
        let o = cx.new_object(&scope).unwrap();
        let key = PropertyKey::from("toString");
        assert!(delete_property(&o, &key));
        assert!(has_property(&o, &key));
    }

    #[test]
    fn test_array_length_is_permanent() {
        let (cx, scope) = setup();
        let a = cx.new_array(&scope, 2);
        assert!(!delete_property(&a, &PropertyKey::from("length")));
    }
}

mod prototype_cycle_tests {
    use super::*;
    use just_runtime::runner::ds::object_property::PropertyKey;
    use just_runtime::runner::ds::operations::object::{get_property, has_property, is_prototype_of};

    /// Two objects whose prototypes point at each other, plus `a.own = 1`.
    fn cycle(cx: &Context, scope: &JsObjectType) -> (JsObjectType, JsObjectType) {
        let a = cx.new_object(scope).unwrap();
        let b = cx.new_object(scope).unwrap();
        a.borrow_mut().put_own("own".into(), JsValue::Number(1.0));
        a.borrow_mut().set_prototype(Some(b.clone()));
        b.borrow_mut().set_prototype(Some(a.clone()));
        (a, b)
    }

    fn unlink(a: &JsObjectType, b: &JsObjectType) {
        a.borrow_mut().set_prototype(None);
        b.borrow_mut().set_prototype(None);
    }

    #[test]
    fn test_lookup_terminates_on_cycle() {
        let (cx, scope) = setup();
        let (a, b) = cycle(&cx, &scope);
        let missing = PropertyKey::from("missing");
        assert_eq!(get_property(&a, &missing), None);
        assert!(!has_property(&b, &missing));
        assert_eq!(get_property(&b, &PropertyKey::from("own")), Some(JsValue::Number(1.0)));
        assert!(has_property(&b, &PropertyKey::from("own")));
        unlink(&a, &b);
    }

    #[test]
    fn test_is_prototype_of_terminates_on_cycle() {
        let (cx, scope) = setup();
        let (a, b) = cycle(&cx, &scope);
        let outsider = cx.new_object(&scope).unwrap();
        assert!(is_prototype_of(&b, &JsValue::Object(a.clone())));
        assert!(is_prototype_of(&a, &JsValue::Object(b.clone())));
        assert!(!is_prototype_of(&outsider, &JsValue::Object(a.clone())));
        unlink(&a, &b);
    }
}

// ============================================================================
// Error
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_error_message_and_to_string() {
        let (cx, scope) = setup();
        eval(&cx, &scope, "var e = new Error('boom');");
        assert_eq!(eval(&cx, &scope, "e.message;"), string("boom"));
        assert_eq!(eval(&cx, &scope, "e.name;"), string("Error"));
        assert_eq!(eval(&cx, &scope, "e.toString();"), string("Error: boom"));
        assert_eq!(eval(&cx, &scope, "new Error().toString();"), string("Error"));
    }

    #[test]
    fn test_error_without_new() {
        let (cx, scope) = setup();
        assert_eq!(eval(&cx, &scope, "Error('x').message;"), string("x"));
        assert_eq!(
            eval(&cx, &scope, "Error.prototype.isPrototypeOf(Error('x'));"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_thrown_error_object() {
        let (cx, scope) = setup();
        match cx.evaluate_string(&scope, "throw new Error('bad');", None, 1, None) {
            Err(EngineError::Uncaught(JsValue::Object(o))) => {
                assert_eq!(o.borrow().class_name(), "Error");
            }
            other => panic!("expected an uncaught Error, got {:?}", other),
        }
    }
}

// ============================================================================
// Construction and conversions
// ============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_new_object_with_unknown_constructor() {
        let (cx, scope) = setup();
        let err = cx.new_object_with(&scope, "Nope", vec![]).err().unwrap();
        assert!(matches!(err, EngineError::ConstructorNotFound(ref n) if n == "Nope"));
    }

    #[test]
    fn test_new_object_with_error_constructor() {
        let (cx, scope) = setup();
        let error = cx
            .new_object_with(&scope, "Error", vec![string("made")])
            .unwrap();
        assert_eq!(error.borrow().class_name(), "Error");
    }

    #[test]
    fn test_to_object_rejects_undefined() {
        let (_cx, scope) = setup();
        assert!(Context::to_object(&scope, &JsValue::Undefined).is_err());
        assert!(Context::to_object(&scope, &JsValue::Null).is_err());
        assert!(Context::to_object(&scope, &JsValue::Number(1.0)).is_ok());
    }

    #[test]
    fn test_primitive_conversions() {
        let (cx, _scope) = setup();
        assert!(!Context::to_boolean(&string("")));
        assert!(Context::to_boolean(&JsValue::Number(-1.0)));
        assert_eq!(cx.to_number(&string(" 12 ")).unwrap(), 12.0);
        assert!(cx.to_number(&string("abc")).unwrap().is_nan());
        assert_eq!(cx.to_string(&JsValue::Number(2.5)).unwrap(), "2.5");
        assert_eq!(cx.to_string(&JsValue::Null).unwrap(), "null");
    }
}
