//! Error built-in.

use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::{new_object, JsObjectType, NativeObject};
use crate::runner::ds::object_property::PropertyAttributes;
use crate::runner::ds::operations::object::{construct, get_property, get_top_level_prop, top_level_scope};
use crate::runner::ds::operations::type_conversion::to_string;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::registry::BuiltInRegistry;
use crate::runner::plugin::types::BuiltInObject;

use super::object::this_object;

pub fn register(registry: &mut BuiltInRegistry) {
    let error = BuiltInObject::new("Error", error_function)
        .with_prototype_class("Error")
        .with_constructor(error_constructor)
        .with_arity(1)
        .add_prototype_property("name", JsValue::String("Error".to_string()))
        .add_prototype_property("message", JsValue::String(String::new()))
        .add_method("toString", error_to_string, 0);
    registry.register_object(error);
}

/// `Error(msg)` without `new` behaves like `new Error(msg)`.
fn error_function(cx: &Context, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    let scope = top_level_scope(&this_object(&this)?);
    match get_top_level_prop(&scope, "Error") {
        Some(ctor) => construct(cx, &ctor, args),
        None => Err(EngineError::ConstructorNotFound("Error".to_string())),
    }
}

fn error_constructor(
    cx: &Context,
    callee: &JsObjectType,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    let error = new_object(NativeObject::with_class("Error"));
    let prototype = match get_property(callee, &"prototype".into()) {
        Some(JsValue::Object(p)) => Some(p),
        _ => None,
    };
    let message = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(m) => Some(to_string(cx, m)?),
    };
    {
        let mut e = error.borrow_mut();
        e.set_prototype(prototype);
        e.set_parent_scope(Some(top_level_scope(callee)));
        if let Some(message) = message {
            e.define_own(
                "message".into(),
                JsValue::String(message),
                PropertyAttributes::DONTENUM,
            );
        }
    }
    Ok(JsValue::Object(error))
}

/// Error.prototype.toString: `name: message`, or just `name` without a message.
fn error_to_string(cx: &Context, this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    let o = this_object(&this)?;
    let name = match get_property(&o, &"name".into()) {
        Some(v) => to_string(cx, &v)?,
        None => "Error".to_string(),
    };
    let message = match get_property(&o, &"message".into()) {
        Some(v) => to_string(cx, &v)?,
        None => String::new(),
    };
    Ok(JsValue::String(if message.is_empty() {
        name
    } else {
        format!("{}: {}", name, message)
    }))
}
