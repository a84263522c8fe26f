use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::object_property::{PropertyAttributes, PropertyKey, PropertySlot};
use crate::runner::ds::value::JsValue;

pub type JsObjectType = Rc<RefCell<dyn JsObject>>;

/// Wrap a concrete object into the shared handle used everywhere else.
pub fn new_object<O: JsObject + 'static>(object: O) -> JsObjectType {
    Rc::new(RefCell::new(object))
}

/// Stable identity of a shared object, usable as a set key.
pub fn object_id(object: &JsObjectType) -> usize {
    Rc::as_ptr(object) as *const () as usize
}

pub fn same_object(a: &JsObjectType, b: &JsObjectType) -> bool {
    object_id(a) == object_id(b)
}

/// Own property table plus the two links every scriptable object carries.
///
/// Properties keep insertion order; enumeration and source rendering depend on it.
pub struct ObjectBase {
    properties: IndexMap<PropertyKey, PropertySlot>,
    prototype: Option<JsObjectType>,
    parent_scope: Option<JsObjectType>,
}
impl ObjectBase {
    pub fn new() -> Self {
        ObjectBase {
            properties: IndexMap::new(),
            prototype: None,
            parent_scope: None,
        }
    }

    pub fn get(&self, key: &PropertyKey) -> Option<JsValue> {
        self.properties.get(key).map(|slot| slot.value.clone())
    }

    pub fn has(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// Store a value, honouring READONLY. Returns false when the store was ignored.
    pub fn put(&mut self, key: PropertyKey, value: JsValue) -> bool {
        match self.properties.get_mut(&key) {
            Some(slot) => {
                if slot.attributes.contains(PropertyAttributes::READONLY) {
                    false
                } else {
                    slot.value = value;
                    true
                }
            }
            None => {
                self.properties
                    .insert(key, PropertySlot::new(value, PropertyAttributes::empty()));
                true
            }
        }
    }

    /// Create or overwrite a property with explicit attributes, bypassing READONLY.
    pub fn define(&mut self, key: PropertyKey, value: JsValue, attributes: PropertyAttributes) {
        self.properties.insert(key, PropertySlot::new(value, attributes));
    }

    /// Remove a property. PERMANENT properties stay and false is returned.
    pub fn delete(&mut self, key: &PropertyKey) -> bool {
        match self.properties.get(key) {
            Some(slot) if slot.attributes.contains(PropertyAttributes::PERMANENT) => false,
            Some(_) => {
                self.properties.shift_remove(key);
                true
            }
            None => true,
        }
    }

    pub fn attributes(&self, key: &PropertyKey) -> Result<PropertyAttributes, JErrorType> {
        self.properties
            .get(key)
            .map(|slot| slot.attributes)
            .ok_or_else(|| JErrorType::ReferenceError(format!("property {} not found", key)))
    }

    pub fn set_attributes(
        &mut self,
        key: &PropertyKey,
        attributes: PropertyAttributes,
    ) -> Result<(), JErrorType> {
        match self.properties.get_mut(key) {
            Some(slot) => {
                slot.attributes = attributes;
                Ok(())
            }
            None => Err(JErrorType::ReferenceError(format!(
                "property {} not found",
                key
            ))),
        }
    }

    pub fn is_enumerable(&self, key: &PropertyKey) -> Option<bool> {
        self.properties.get(key).map(|slot| slot.is_enumerable())
    }

    /// Enumerable own keys in insertion order.
    pub fn ids(&self) -> Vec<PropertyKey> {
        self.properties
            .iter()
            .filter(|(_, slot)| slot.is_enumerable())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn all_ids(&self) -> Vec<PropertyKey> {
        self.properties.keys().cloned().collect()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&PropertyKey, &PropertySlot) -> bool) {
        self.properties.retain(|k, v| keep(k, v));
    }

    pub fn prototype(&self) -> Option<JsObjectType> {
        self.prototype.clone()
    }

    pub fn set_prototype(&mut self, prototype: Option<JsObjectType>) {
        self.prototype = prototype;
    }

    pub fn parent_scope(&self) -> Option<JsObjectType> {
        self.parent_scope.clone()
    }

    pub fn set_parent_scope(&mut self, parent: Option<JsObjectType>) {
        self.parent_scope = parent;
    }
}
impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

/// The object protocol. Own-property methods work on this object only; chain walking
/// lives in `operations::object`.
pub trait JsObject {
    fn get_object_base(&self) -> &ObjectBase;

    fn get_object_base_mut(&mut self) -> &mut ObjectBase;

    fn class_name(&self) -> &str;

    fn get_own(&self, key: &PropertyKey) -> Option<JsValue> {
        self.get_object_base().get(key)
    }

    fn has_own(&self, key: &PropertyKey) -> bool {
        self.get_object_base().has(key)
    }

    fn put_own(&mut self, key: PropertyKey, value: JsValue) -> bool {
        self.get_object_base_mut().put(key, value)
    }

    fn define_own(&mut self, key: PropertyKey, value: JsValue, attributes: PropertyAttributes) {
        self.get_object_base_mut().define(key, value, attributes)
    }

    fn delete_own(&mut self, key: &PropertyKey) -> bool {
        self.get_object_base_mut().delete(key)
    }

    fn ids(&self) -> Vec<PropertyKey> {
        self.get_object_base().ids()
    }

    fn prototype(&self) -> Option<JsObjectType> {
        self.get_object_base().prototype()
    }

    fn set_prototype(&mut self, prototype: Option<JsObjectType>) {
        self.get_object_base_mut().set_prototype(prototype)
    }

    fn parent_scope(&self) -> Option<JsObjectType> {
        self.get_object_base().parent_scope()
    }

    fn set_parent_scope(&mut self, parent: Option<JsObjectType>) {
        self.get_object_base_mut().set_parent_scope(parent)
    }

    fn as_function(&self) -> Option<&FunctionObject> {
        None
    }

    /// Wrapped primitive for Boolean/Number/String wrapper objects.
    fn primitive_value(&self) -> Option<JsValue> {
        None
    }
}

/// The ordinary object. Also used for activation records ("Call"), the global
/// object ("global") and primitive wrappers.
pub struct NativeObject {
    base: ObjectBase,
    class_name: String,
    primitive: Option<JsValue>,
}
impl NativeObject {
    pub fn new() -> Self {
        Self::with_class("Object")
    }

    pub fn with_class(class_name: &str) -> Self {
        NativeObject {
            base: ObjectBase::new(),
            class_name: class_name.to_string(),
            primitive: None,
        }
    }

    pub fn wrapping(class_name: &str, primitive: JsValue) -> Self {
        NativeObject {
            base: ObjectBase::new(),
            class_name: class_name.to_string(),
            primitive: Some(primitive),
        }
    }
}
impl Default for NativeObject {
    fn default() -> Self {
        Self::new()
    }
}
impl JsObject for NativeObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn primitive_value(&self) -> Option<JsValue> {
        self.primitive.clone()
    }
}
