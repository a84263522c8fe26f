//! Core types for the built-in registry.

use indexmap::IndexMap;

use crate::runner::ds::function_object::{NativeCtor, NativeFn};
use crate::runner::ds::value::JsValue;

/// Built-in constructor definition, e.g. `Object`, `Array`, `Error`.
///
/// Installation turns this into a constructor function on the global object
/// whose `prototype` carries the registered methods and properties.
pub struct BuiltInObject {
    /// Global name of the constructor.
    pub name: String,

    /// Name of the built-in whose prototype this prototype inherits from.
    /// `None` only for `Object`.
    pub prototype: Option<String>,

    /// Class reported by the prototype object itself.
    pub prototype_class: String,

    /// Called as a plain function.
    pub function: NativeFn,

    /// Called through `new`. Defaults to allocating a receiver and calling
    /// `function` on it.
    pub constructor: Option<NativeCtor>,

    /// Declared parameter count.
    pub arity: usize,

    /// Prototype methods, installed in registration order.
    pub methods: IndexMap<String, (NativeFn, usize)>,

    /// Data properties on the prototype.
    pub prototype_properties: IndexMap<String, JsValue>,

    /// Data properties on the constructor.
    pub properties: IndexMap<String, JsValue>,

    /// Unavailable built-ins are skipped at installation.
    pub available: bool,
}

impl BuiltInObject {
    /// Create a new built-in inheriting from `Object.prototype`.
    pub fn new(name: impl Into<String>, function: NativeFn) -> Self {
        BuiltInObject {
            name: name.into(),
            prototype: Some("Object".to_string()),
            prototype_class: "Object".to_string(),
            function,
            constructor: None,
            arity: 0,
            methods: IndexMap::new(),
            prototype_properties: IndexMap::new(),
            properties: IndexMap::new(),
            available: true,
        }
    }

    /// Set the prototype chain parent.
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }

    /// Set no prototype (for `Object.prototype` itself).
    pub fn with_no_prototype(mut self) -> Self {
        self.prototype = None;
        self
    }

    pub fn with_prototype_class(mut self, class_name: impl Into<String>) -> Self {
        self.prototype_class = class_name.into();
        self
    }

    pub fn with_constructor(mut self, constructor: NativeCtor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_availability(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Add a prototype method.
    pub fn add_method(mut self, name: impl Into<String>, func: NativeFn, arity: usize) -> Self {
        self.methods.insert(name.into(), (func, arity));
        self
    }

    pub fn add_prototype_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.prototype_properties.insert(name.into(), value);
        self
    }

    /// Add a property on the constructor.
    pub fn add_property(mut self, name: impl Into<String>, value: JsValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

/// Metadata of a group of built-ins registered together.
#[derive(Debug, Clone)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    /// Constructor names this group provides.
    pub provides: Vec<String>,
}

impl PluginInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        PluginInfo {
            name: name.into(),
            version: version.into(),
            provides: Vec::new(),
        }
    }

    pub fn with_provides(mut self, provides: Vec<String>) -> Self {
        self.provides = provides;
        self
    }
}
