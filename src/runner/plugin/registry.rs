//! Registry of built-in constructors and their installation into a scope.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use super::types::{BuiltInObject, PluginInfo};
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::function_object::{install_prototype, new_function, NativeFunction};
use crate::runner::ds::object::{new_object, JsObjectType, NativeObject};
use crate::runner::ds::object_property::PropertyAttributes;
use crate::runner::ds::value::JsValue;
use crate::runner::std_lib::register_standard_constructors;

/// Registry for built-in objects, in installation order.
pub struct BuiltInRegistry {
    objects: IndexMap<String, BuiltInObject>,
    plugins: Vec<PluginInfo>,
}

impl BuiltInRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        BuiltInRegistry {
            objects: IndexMap::new(),
            plugins: Vec::new(),
        }
    }

    /// Create a registry with the standard constructors.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_standard_constructors(&mut registry);
        let provides = registry.objects.keys().cloned().collect();
        registry
            .plugins
            .push(PluginInfo::new("core", env!("CARGO_PKG_VERSION")).with_provides(provides));
        registry
    }

    /// Register a built-in object. Re-registering a name replaces the earlier entry.
    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    pub fn get_object_mut(&mut self, name: &str) -> Option<&mut BuiltInObject> {
        self.objects.get_mut(name)
    }

    pub fn has_object(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.objects
            .get(object)
            .map(|obj| obj.methods.contains_key(method))
            .unwrap_or(false)
    }

    pub fn object_names(&self) -> Vec<&String> {
        self.objects.keys().collect()
    }

    pub fn loaded_plugins(&self) -> &[PluginInfo] {
        &self.plugins
    }

    /// Define every available built-in on `scope`, plus the `undefined`, `NaN`
    /// and `Infinity` globals.
    ///
    /// `Object` goes first so later constructors find `Object.prototype`. A
    /// built-in whose parent prototype is missing fails the whole installation.
    pub fn install(&self, cx: &Context, scope: &JsObjectType) -> Result<(), EngineError> {
        let mut prototypes: HashMap<&str, JsObjectType> = HashMap::new();
        let ordered = self
            .objects
            .get("Object")
            .into_iter()
            .chain(self.objects.values().filter(|o| o.name != "Object"));

        for obj in ordered {
            if !obj.available {
                debug!(name = %obj.name, "skipping unavailable built-in");
                continue;
            }
            let parent = match &obj.prototype {
                Some(parent) => match prototypes.get(parent.as_str()) {
                    Some(p) => Some(p.clone()),
                    None => {
                        return Err(EngineError::Initialization {
                            name: obj.name.clone(),
                            message: format!("prototype parent \"{}\" is not installed", parent),
                        })
                    }
                },
                None => None,
            };
            let prototype = self.install_one(obj, parent, &prototypes, scope);
            prototypes.insert(obj.name.as_str(), prototype);
        }

        let global_attributes = PropertyAttributes::DONTENUM | PropertyAttributes::PERMANENT;
        let mut s = scope.borrow_mut();
        s.define_own("undefined".into(), JsValue::Undefined, global_attributes);
        s.define_own("NaN".into(), JsValue::Number(f64::NAN), global_attributes);
        s.define_own("Infinity".into(), JsValue::Number(f64::INFINITY), global_attributes);
        drop(s);

        debug!(
            context = %cx.id(),
            installed = ?prototypes.keys().collect::<Vec<_>>(),
            "standard objects installed"
        );
        Ok(())
    }

    fn install_one(
        &self,
        obj: &BuiltInObject,
        parent: Option<JsObjectType>,
        prototypes: &HashMap<&str, JsObjectType>,
        scope: &JsObjectType,
    ) -> JsObjectType {
        let prototype = new_object(NativeObject::with_class(&obj.prototype_class));
        {
            let mut p = prototype.borrow_mut();
            p.set_prototype(parent);
            p.set_parent_scope(Some(scope.clone()));
        }
        // before Object itself is installed, functions find no Object.prototype by name
        let function_prototype = prototypes.get("Object").cloned().unwrap_or_else(|| prototype.clone());

        let callable = match obj.constructor {
            Some(ctor) => NativeFunction::with_constructor(obj.function, ctor),
            None => NativeFunction::new(obj.function),
        };
        let constructor = new_function(scope, &obj.name, obj.arity, Rc::new(callable));
        constructor
            .borrow_mut()
            .set_prototype(Some(function_prototype.clone()));
        install_prototype(
            &constructor,
            &prototype,
            PropertyAttributes::DONTENUM | PropertyAttributes::READONLY | PropertyAttributes::PERMANENT,
        );

        for (name, (func, arity)) in obj.methods.iter() {
            let method = new_function(scope, name, *arity, Rc::new(NativeFunction::new(*func)));
            method
                .borrow_mut()
                .set_prototype(Some(function_prototype.clone()));
            prototype.borrow_mut().define_own(
                name.as_str().into(),
                JsValue::Object(method),
                PropertyAttributes::DONTENUM,
            );
        }
        for (name, value) in obj.prototype_properties.iter() {
            prototype.borrow_mut().define_own(
                name.as_str().into(),
                value.clone(),
                PropertyAttributes::DONTENUM,
            );
        }
        for (name, value) in obj.properties.iter() {
            constructor.borrow_mut().define_own(
                name.as_str().into(),
                value.clone(),
                PropertyAttributes::DONTENUM | PropertyAttributes::READONLY | PropertyAttributes::PERMANENT,
            );
        }

        scope.borrow_mut().define_own(
            obj.name.as_str().into(),
            JsValue::Object(constructor),
            PropertyAttributes::DONTENUM,
        );
        prototype
    }
}

impl Default for BuiltInRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::same_object;
    use crate::runner::ds::operations::object::{class_prototype, get_property};

    fn noop(_cx: &Context, _this: JsValue, _args: Vec<JsValue>) -> Result<JsValue, EngineError> {
        Ok(JsValue::Undefined)
    }

    #[test]
    fn test_core_registry_contents() {
        let registry = BuiltInRegistry::with_core();
        assert!(registry.has_object("Object"));
        assert!(registry.has_object("Array"));
        assert!(registry.has_object("Error"));
        assert!(registry.has_method("Object", "propertyIsEnumerable"));
        assert_eq!(registry.loaded_plugins()[0].name, "core");
    }

    #[test]
    fn test_install_links_prototypes() {
        let cx = Context::new();
        let global = new_object(NativeObject::with_class("global"));
        BuiltInRegistry::with_core().install(&cx, &global).unwrap();
        let object_proto = class_prototype(&global, "Object").unwrap();
        let array_proto = class_prototype(&global, "Array").unwrap();
        let parent = array_proto.borrow().prototype().unwrap();
        assert!(same_object(&parent, &object_proto));
        assert!(object_proto.borrow().prototype().is_none());
        assert!(global.borrow().ids().is_empty());
        assert!(matches!(
            get_property(&global, &"NaN".into()),
            Some(JsValue::Number(n)) if n.is_nan()
        ));
    }

    #[test]
    fn test_unavailable_builtin_is_skipped() {
        let cx = Context::new();
        let global = new_object(NativeObject::with_class("global"));
        let mut registry = BuiltInRegistry::with_core();
        registry.register_object(BuiltInObject::new("Extra", noop).with_availability(false));
        registry.install(&cx, &global).unwrap();
        assert!(get_property(&global, &"Extra".into()).is_none());
    }

    #[test]
    fn test_missing_parent_fails_installation() {
        let cx = Context::new();
        let global = new_object(NativeObject::with_class("global"));
        let mut registry = BuiltInRegistry::with_core();
        registry.register_object(BuiltInObject::new("Orphan", noop).with_prototype("Missing"));
        assert!(matches!(
            registry.install(&cx, &global),
            Err(EngineError::Initialization { .. })
        ));
    }
}
