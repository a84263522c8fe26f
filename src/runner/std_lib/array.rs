//! Array built-in.
//!
//! Provides the Array constructor and the prototype's string conversions.

use crate::runner::context::Context;
use crate::runner::ds::array_object::is_valid_length;
use crate::runner::ds::error::{EngineError, JErrorType};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::operations::object::{array_to_source, get_elements, new_array, top_level_scope};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::BuiltInObject;

use super::object::this_object;

/// Register the Array built-in with the registry.
pub fn register(registry: &mut BuiltInRegistry) {
    let array = BuiltInObject::new("Array", array_function)
        .with_prototype_class("Array")
        .with_constructor(array_constructor)
        .with_arity(1)
        .add_method("toString", array_to_string, 0)
        .add_method("join", array_join, 1)
        .add_method("toSource", array_to_source_method, 0);

    registry.register_object(array);
}

/// `Array(n)` makes an empty array of length `n`; any other arguments become elements.
fn create(scope: &JsObjectType, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    if let [JsValue::Number(n)] = args.as_slice() {
        let n = *n;
        if !is_valid_length(n) {
            return Err(JErrorType::RangeError("invalid array length".to_string()).into());
        }
        let array = new_array(scope, vec![]);
        array.borrow_mut().put_own("length".into(), JsValue::Number(n));
        return Ok(JsValue::Object(array));
    }
    Ok(JsValue::Object(new_array(scope, args)))
}

fn array_function(_cx: &Context, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    create(&top_level_scope(&this_object(&this)?), args)
}

fn array_constructor(
    _cx: &Context,
    callee: &JsObjectType,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    create(&top_level_scope(callee), args)
}

fn join(cx: &Context, this: &JsValue, separator: &str) -> Result<JsValue, EngineError> {
    let o = this_object(this)?;
    let elements = get_elements(cx, &o)?.unwrap_or_default();
    let mut parts = Vec::with_capacity(elements.len());
    for element in elements.iter() {
        parts.push(match element {
            JsValue::Undefined | JsValue::Null => String::new(),
            _ => to_string(cx, element)?,
        });
    }
    Ok(JsValue::String(parts.join(separator)))
}

/// Array.prototype.toString
fn array_to_string(cx: &Context, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    join(cx, &this, ",")
}

/// Array.prototype.join
fn array_join(cx: &Context, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => ",".to_string(),
        Some(s) => to_string(cx, s)?,
    };
    join(cx, &this, &separator)
}

/// Array.prototype.toSource: `[a, b]`.
fn array_to_source_method(
    cx: &Context,
    this: JsValue,
    _args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    Ok(JsValue::String(array_to_source(cx, &o)?))
}
