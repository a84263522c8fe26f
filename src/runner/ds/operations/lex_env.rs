//! Name resolution over the scope chain. Scopes are ordinary objects linked through
//! their parent scope; the outermost one is the global object.

use std::collections::HashSet;

use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::{new_object, object_id, JsObjectType, NativeObject};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyKey};
use crate::runner::ds::operations::object::{get_property, has_property, put_property};
use crate::runner::ds::value::JsValue;

/// Innermost scope object that can see `name` (own or inherited).
pub fn get_identifier_reference(scope: &JsObjectType, name: &str) -> Option<JsObjectType> {
    let key = PropertyKey::from(name);
    let mut visited = HashSet::new();
    let mut current = Some(scope.clone());
    while let Some(s) = current {
        if !visited.insert(object_id(&s)) {
            break;
        }
        if has_property(&s, &key) {
            return Some(s);
        }
        current = s.borrow().parent_scope();
    }
    None
}

pub fn resolve_binding(scope: &JsObjectType, name: &str) -> Result<JsValue, EngineError> {
    match get_identifier_reference(scope, name) {
        Some(s) => Ok(get_property(&s, &PropertyKey::from(name)).unwrap_or(JsValue::Undefined)),
        None => Err(EngineError::reference_error(format!("{} is not defined", name))),
    }
}

/// Assign to the nearest visible binding, or create a global one when none exists.
pub fn assign_binding(scope: &JsObjectType, name: &str, value: JsValue) {
    let target = match get_identifier_reference(scope, name) {
        Some(s) => s,
        None => crate::runner::ds::operations::object::top_level_scope(scope),
    };
    put_property(&target, PropertyKey::from(name), value);
}

/// `var name`: an undeletable own binding, left alone when already present.
pub fn declare_var(scope: &JsObjectType, name: &str) {
    let key = PropertyKey::from(name);
    let mut s = scope.borrow_mut();
    if !s.has_own(&key) {
        s.define_own(key, JsValue::Undefined, PropertyAttributes::PERMANENT);
    }
}

/// Function declarations overwrite whatever the name held.
pub fn declare_function(scope: &JsObjectType, name: &str, function: JsValue) {
    scope
        .borrow_mut()
        .define_own(PropertyKey::from(name), function, PropertyAttributes::PERMANENT);
}

/// Activation record for one function invocation.
pub fn new_activation(parent: &JsObjectType) -> JsObjectType {
    let activation = new_object(NativeObject::with_class("Call"));
    activation
        .borrow_mut()
        .set_parent_scope(Some(parent.clone()));
    activation
}
