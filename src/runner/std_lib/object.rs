//! Object built-in.
//!
//! Provides the Object constructor and the `Object.prototype` methods every
//! script object inherits.

use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::{
    call_function, get_property, has_own_property, is_prototype_of, new_plain_object,
    object_to_string, property_is_enumerable, structure_to_source, to_property_key,
    top_level_scope,
};
use crate::runner::ds::operations::type_conversion::to_object;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::BuiltInObject;

/// Register the Object built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let object = BuiltInObject::new("Object", object_function)
        .with_no_prototype()
        .with_constructor(object_constructor)
        .with_arity(1)
        .add_method("toString", object_to_string_method, 0)
        .add_method("toLocaleString", object_to_locale_string, 0)
        .add_method("toSource", object_to_source, 0)
        .add_method("valueOf", object_value_of, 0)
        .add_method("hasOwnProperty", object_has_own_property, 1)
        .add_method("propertyIsEnumerable", object_property_is_enumerable, 1)
        .add_method("isPrototypeOf", object_is_prototype_of, 1);

    registry.register_object(object);
}

/// Receiver of a prototype method as an object.
pub(crate) fn this_object(this: &JsValue) -> Result<JsObjectType, EngineError> {
    match this {
        JsValue::Object(o) => Ok(o.clone()),
        _ => Err(EngineError::type_error(format!("{} is not an object", this))),
    }
}

fn convert(scope: &JsObjectType, args: &[JsValue]) -> Result<JsValue, EngineError> {
    Ok(match args.first() {
        None | Some(JsValue::Undefined) | Some(JsValue::Null) => {
            JsValue::Object(new_plain_object(scope))
        }
        Some(v) => JsValue::Object(to_object(scope, v)?),
    })
}

/// `Object(value)`: objects pass through, primitives are wrapped.
fn object_function(_cx: &Context, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    let scope = top_level_scope(&this_object(&this)?);
    convert(&scope, &args)
}

/// `new Object(value)`.
fn object_constructor(
    _cx: &Context,
    callee: &JsObjectType,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    convert(&top_level_scope(callee), &args)
}

/// Object.prototype.toString
fn object_to_string_method(
    cx: &Context,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    Ok(JsValue::String(object_to_string(cx, &o)?))
}

/// Object.prototype.toLocaleString, which defers to `toString`.
fn object_to_locale_string(
    cx: &Context,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    match get_property(&o, &"toString".into()) {
        Some(method) if method.is_callable() => call_function(cx, &method, this, vec![]),
        _ => Ok(JsValue::String(object_to_string(cx, &o)?)),
    }
}

/// Object.prototype.toSource
fn object_to_source(cx: &Context, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    Ok(JsValue::String(structure_to_source(cx, &o)?))
}

/// Object.prototype.valueOf
fn object_value_of(_cx: &Context, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    Ok(this)
}

/// Object.prototype.hasOwnProperty
fn object_has_own_property(
    cx: &Context,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    let key = to_property_key(cx, args.first().unwrap_or(&JsValue::Undefined))?;
    Ok(JsValue::Boolean(has_own_property(&o, &key)))
}

/// Object.prototype.propertyIsEnumerable: own and enumerable.
fn object_property_is_enumerable(
    cx: &Context,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    let key = to_property_key(cx, args.first().unwrap_or(&JsValue::Undefined))?;
    Ok(JsValue::Boolean(property_is_enumerable(&o, &key)))
}

/// Object.prototype.isPrototypeOf
fn object_is_prototype_of(
    _cx: &Context,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    let candidate = args.into_iter().next().unwrap_or(JsValue::Undefined);
    Ok(JsValue::Boolean(is_prototype_of(&o, &candidate)))
}
