//! Prototype-chain and scope-chain operations over shared objects.
//!
//! Chain walks remember every object they visit, so a cyclic prototype link ends the
//! walk instead of looping.

use std::collections::HashSet;
use std::rc::Rc;

use crate::runner::context::{Context, LanguageVersion};
use crate::runner::ds::array_object::{NativeArray, ARRAY_LENGTH_PROP};
use crate::runner::ds::error::{EngineError, JErrorType};
use crate::runner::ds::function_object::Callable;
use crate::runner::ds::object::{new_object, object_id, JsObject, JsObjectType, NativeObject};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyKey};
use crate::runner::ds::operations::type_conversion::{
    escape_string, number_to_string, to_number, to_object, to_string,
};
use crate::runner::ds::value::JsValue;

fn walk_prototypes<T>(
    start: &JsObjectType,
    mut visit: impl FnMut(&JsObjectType, &dyn JsObject) -> Option<T>,
) -> Option<T> {
    let mut visited = HashSet::new();
    let mut current = Some(start.clone());
    while let Some(o) = current {
        if !visited.insert(object_id(&o)) {
            break;
        }
        let b = o.borrow();
        if let Some(found) = visit(&o, &*b) {
            return Some(found);
        }
        let next = b.prototype();
        drop(b);
        current = next;
    }
    None
}

/// First object on the prototype chain (starting at `start`) that owns `key`.
pub fn find_owner(start: &JsObjectType, key: &PropertyKey) -> Option<JsObjectType> {
    walk_prototypes(start, |o, b| if b.has_own(key) { Some(o.clone()) } else { None })
}

/// Chain lookup. `None` means the property exists nowhere on the chain.
pub fn get_property(start: &JsObjectType, key: &PropertyKey) -> Option<JsValue> {
    walk_prototypes(start, |_, b| b.get_own(key))
}

pub fn has_property(start: &JsObjectType, key: &PropertyKey) -> bool {
    find_owner(start, key).is_some()
}

/// Store on `target` itself unless the chain holds a READONLY property of that name.
pub fn put_property(target: &JsObjectType, key: PropertyKey, value: JsValue) -> bool {
    if let Some(owner) = find_owner(target, &key) {
        if !Rc::ptr_eq(&owner, target) {
            let readonly = owner
                .borrow()
                .get_object_base()
                .attributes(&key)
                .map(|a| a.contains(PropertyAttributes::READONLY))
                .unwrap_or(false);
            if readonly {
                return false;
            }
        }
    }
    target.borrow_mut().put_own(key, value)
}

/// Deletes the own property only; inherited properties are untouched.
pub fn delete_property(target: &JsObjectType, key: &PropertyKey) -> bool {
    target.borrow_mut().delete_own(key)
}

pub fn has_own_property(target: &JsObjectType, key: &PropertyKey) -> bool {
    target.borrow().has_own(key)
}

/// True only for an own property without DONTENUM. Missing properties answer false.
pub fn property_is_enumerable(target: &JsObjectType, key: &PropertyKey) -> bool {
    target
        .borrow()
        .get_object_base()
        .is_enumerable(key)
        .unwrap_or(false)
}

/// Whether `this` appears on the prototype chain of `candidate`, starting one link up.
pub fn is_prototype_of(this: &JsObjectType, candidate: &JsValue) -> bool {
    let candidate = match candidate {
        JsValue::Object(o) => o,
        _ => return false,
    };
    let first = candidate.borrow().prototype();
    match first {
        Some(p) => walk_prototypes(&p, |o, _| {
            if Rc::ptr_eq(o, this) {
                Some(())
            } else {
                None
            }
        })
        .is_some(),
        None => false,
    }
}

/// Follow parent-scope links to the outermost scope.
pub fn top_level_scope(object: &JsObjectType) -> JsObjectType {
    let mut visited = HashSet::new();
    let mut current = object.clone();
    loop {
        visited.insert(object_id(&current));
        let parent = current.borrow().parent_scope();
        match parent {
            Some(p) if !visited.contains(&object_id(&p)) => current = p,
            _ => return current,
        }
    }
}

pub fn get_top_level_prop(scope: &JsObjectType, name: &str) -> Option<JsValue> {
    get_property(&top_level_scope(scope), &PropertyKey::from(name))
}

/// `<name>.prototype` looked up from the top-level scope of `scope`.
pub fn class_prototype(scope: &JsObjectType, class_name: &str) -> Option<JsObjectType> {
    match get_top_level_prop(scope, class_name) {
        Some(JsValue::Object(ctor)) => match get_property(&ctor, &"prototype".into()) {
            Some(JsValue::Object(p)) => Some(p),
            _ => None,
        },
        _ => None,
    }
}

fn callable_of(f: &JsValue) -> Option<(JsObjectType, Rc<dyn Callable>)> {
    match f {
        JsValue::Object(o) => {
            let callable = o.borrow().as_function().map(|func| func.callable());
            callable.map(|c| (o.clone(), c))
        }
        _ => None,
    }
}

pub fn call_function(
    cx: &Context,
    f: &JsValue,
    this: JsValue,
    args: Vec<JsValue>,
) -> Result<JsValue, EngineError> {
    match callable_of(f) {
        Some((callee, callable)) => callable.call(cx, &callee, this, args),
        None => Err(EngineError::type_error(format!("{} is not a function", f))),
    }
}

pub fn construct(cx: &Context, f: &JsValue, args: Vec<JsValue>) -> Result<JsValue, EngineError> {
    match callable_of(f) {
        Some((callee, callable)) => callable.construct(cx, &callee, args),
        None => Err(EngineError::type_error(format!("{} is not a constructor", f))),
    }
}

/// `new <ctor_name>(args)` resolved against the top-level scope of `scope`.
pub fn new_object_by_name(
    cx: &Context,
    scope: &JsObjectType,
    ctor_name: &str,
    args: Vec<JsValue>,
) -> Result<JsObjectType, EngineError> {
    let ctor = match get_top_level_prop(scope, ctor_name) {
        Some(v) => v,
        None => return Err(EngineError::ConstructorNotFound(ctor_name.to_string())),
    };
    if !ctor.is_callable() {
        return Err(EngineError::NotAFunction(ctor_name.to_string()));
    }
    match construct(cx, &ctor, args)? {
        JsValue::Object(o) => Ok(o),
        other => Err(EngineError::type_error(format!(
            "constructor {} returned {}",
            ctor_name, other
        ))),
    }
}

/// Array object linked to `Array.prototype` of `scope`'s top level.
pub fn new_array(scope: &JsObjectType, elements: Vec<JsValue>) -> JsObjectType {
    let array = new_object(NativeArray::from_elements(elements));
    {
        let mut a = array.borrow_mut();
        a.set_prototype(
            class_prototype(scope, "Array").or_else(|| class_prototype(scope, "Object")),
        );
        a.set_parent_scope(Some(top_level_scope(scope)));
    }
    array
}

/// Longest `length` that `get_elements` will expand into a vector.
pub const MAX_DENSE_LENGTH: u32 = 1 << 24;

/// Dense copy of indices `0..length`. `None` when `length` is not a number; a RangeError
/// when it exceeds `MAX_DENSE_LENGTH`.
pub fn get_elements(cx: &Context, object: &JsObjectType) -> Result<Option<Vec<JsValue>>, EngineError> {
    let length = match get_property(object, &ARRAY_LENGTH_PROP) {
        Some(v) => to_number(cx, &v)?,
        None => f64::NAN,
    };
    if length.is_nan() {
        return Ok(None);
    }
    let length = length.max(0.0);
    if length > MAX_DENSE_LENGTH as f64 {
        return Err(JErrorType::RangeError(format!(
            "array length {} is too large to expand",
            number_to_string(length)
        ))
        .into());
    }
    let length = length as u32;
    let mut elements = Vec::new();
    for i in 0..length {
        elements.push(get_property(object, &PropertyKey::Int(i)).unwrap_or(JsValue::Undefined));
    }
    Ok(Some(elements))
}

/// Clears the object's entry in the context's serialization set on every exit path.
struct SerializationGuard<'a> {
    cx: &'a Context,
    id: usize,
}
impl<'a> Drop for SerializationGuard<'a> {
    fn drop(&mut self) {
        self.cx.end_serialization(self.id);
    }
}

fn enter_serialization<'a>(cx: &'a Context, object: &JsObjectType) -> Option<SerializationGuard<'a>> {
    let id = object_id(object);
    if cx.begin_serialization(id) {
        Some(SerializationGuard { cx, id })
    } else {
        None
    }
}

/// Object-literal rendering of the enumerable own properties: `{a:1, b:"x"}`.
/// An object already being rendered further up renders as `{}`.
pub fn structure_to_source(cx: &Context, object: &JsObjectType) -> Result<String, EngineError> {
    let _guard = match enter_serialization(cx, object) {
        Some(g) => g,
        None => return Ok("{}".to_string()),
    };
    let ids = object.borrow().ids();
    let mut parts = Vec::with_capacity(ids.len());
    for key in ids {
        let value = get_property(object, &key).unwrap_or(JsValue::Undefined);
        let rendered = match &value {
            JsValue::String(s) => format!("\"{}\"", escape_string(s)),
            _ => value_to_source(cx, &value)?,
        };
        parts.push(format!("{}:{}", key, rendered));
    }
    Ok(format!("{{{}}}", parts.join(", ")))
}

/// Array-literal rendering of elements `0..length`.
pub fn array_to_source(cx: &Context, object: &JsObjectType) -> Result<String, EngineError> {
    let _guard = match enter_serialization(cx, object) {
        Some(g) => g,
        None => return Ok("[]".to_string()),
    };
    let elements = get_elements(cx, object)?.unwrap_or_default();
    let mut parts = Vec::with_capacity(elements.len());
    for value in elements.iter() {
        parts.push(match value {
            JsValue::String(s) => format!("\"{}\"", escape_string(s)),
            _ => value_to_source(cx, value)?,
        });
    }
    Ok(format!("[{}]", parts.join(", ")))
}

/// Source form of a nested value: objects use their own `toSource` when they have one.
pub fn value_to_source(cx: &Context, value: &JsValue) -> Result<String, EngineError> {
    match value {
        JsValue::Object(o) => match get_property(o, &"toSource".into()) {
            Some(method) if method.is_callable() => {
                let result = call_function(cx, &method, value.clone(), vec![])?;
                to_string(cx, &result)
            }
            _ => structure_to_source(cx, o),
        },
        _ => to_string(cx, value),
    }
}

/// Version-sensitive `toString`: language version 1.2 renders source, everything else
/// renders `[object Class]`.
pub fn object_to_string(cx: &Context, object: &JsObjectType) -> Result<String, EngineError> {
    if cx.language_version() == LanguageVersion::V1_2 {
        structure_to_source(cx, object)
    } else {
        Ok(format!("[object {}]", object.borrow().class_name()))
    }
}

/// Plain object linked to `Object.prototype` of `scope`'s top level, as `{}` creates.
pub fn new_plain_object(scope: &JsObjectType) -> JsObjectType {
    let object = new_object(NativeObject::new());
    {
        let mut o = object.borrow_mut();
        o.set_prototype(class_prototype(scope, "Object"));
        o.set_parent_scope(Some(top_level_scope(scope)));
    }
    object
}

/// Property key for a computed member access: numbers become index keys directly.
pub fn to_property_key(cx: &Context, value: &JsValue) -> Result<PropertyKey, EngineError> {
    Ok(match value {
        JsValue::Number(n) => PropertyKey::from_number(*n),
        _ => PropertyKey::from_name(&to_string(cx, value)?),
    })
}

/// Object to read `key` from: objects as-is, primitives wrapped, undefined and null
/// rejected.
pub fn property_base(
    scope: &JsObjectType,
    value: &JsValue,
    key: &PropertyKey,
) -> Result<JsObjectType, EngineError> {
    match value {
        JsValue::Object(o) => Ok(o.clone()),
        JsValue::Undefined | JsValue::Null => Err(EngineError::type_error(format!(
            "cannot read property \"{}\" of {}",
            key, value
        ))),
        _ => to_object(scope, value),
    }
}
