use std::rc::Rc;

use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object::{new_object, JsObject, JsObjectType, NativeObject, ObjectBase};
use crate::runner::ds::object_property::PropertyAttributes;
use crate::runner::ds::operations::object::{class_prototype, get_property, top_level_scope};
use crate::runner::ds::value::JsValue;

/// Behaviour behind a function object. Interpreted closures, compiled bytecode functions
/// and native built-ins all implement this.
pub trait Callable {
    fn call(
        &self,
        cx: &Context,
        callee: &JsObjectType,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError>;

    /// `new F(args)`: allocate a receiver linked to `F.prototype`, call, and keep an
    /// object result if the body returned one.
    fn construct(
        &self,
        cx: &Context,
        callee: &JsObjectType,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError> {
        let receiver = create_construct_receiver(callee);
        let result = self.call(cx, callee, JsValue::Object(receiver.clone()), args)?;
        Ok(match result {
            JsValue::Object(_) => result,
            _ => JsValue::Object(receiver),
        })
    }
}

pub fn create_construct_receiver(callee: &JsObjectType) -> JsObjectType {
    let scope = top_level_scope(callee);
    let prototype = match get_property(callee, &"prototype".into()) {
        Some(JsValue::Object(p)) => Some(p),
        _ => class_prototype(&scope, "Object"),
    };
    let receiver = new_object(NativeObject::new());
    {
        let mut r = receiver.borrow_mut();
        r.set_prototype(prototype);
        r.set_parent_scope(Some(scope));
    }
    receiver
}

pub struct FunctionObject {
    base: ObjectBase,
    name: String,
    arity: usize,
    callable: Rc<dyn Callable>,
}
impl FunctionObject {
    pub fn new(name: &str, arity: usize, callable: Rc<dyn Callable>) -> Self {
        FunctionObject {
            base: ObjectBase::new(),
            name: name.to_string(),
            arity,
            callable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn callable(&self) -> Rc<dyn Callable> {
        self.callable.clone()
    }
}
impl JsObject for FunctionObject {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        "Function"
    }

    fn as_function(&self) -> Option<&FunctionObject> {
        Some(self)
    }
}

/// Function signature for built-in methods.
/// Native functions receive the context, `this` value, and arguments.
pub type NativeFn =
    fn(cx: &Context, this: JsValue, args: Vec<JsValue>) -> Result<JsValue, EngineError>;

/// Signature for built-in constructors invoked through `new`.
pub type NativeCtor =
    fn(cx: &Context, callee: &JsObjectType, args: Vec<JsValue>) -> Result<JsValue, EngineError>;

pub struct NativeFunction {
    func: NativeFn,
    ctor: Option<NativeCtor>,
}
impl NativeFunction {
    pub fn new(func: NativeFn) -> Self {
        NativeFunction { func, ctor: None }
    }

    pub fn with_constructor(func: NativeFn, ctor: NativeCtor) -> Self {
        NativeFunction {
            func,
            ctor: Some(ctor),
        }
    }
}
impl Callable for NativeFunction {
    fn call(
        &self,
        cx: &Context,
        callee: &JsObjectType,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError> {
        // an absent receiver is the callee's global object
        let this = if this.is_null_or_undefined() {
            JsValue::Object(top_level_scope(callee))
        } else {
            this
        };
        (self.func)(cx, this, args)
    }

    fn construct(
        &self,
        cx: &Context,
        callee: &JsObjectType,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError> {
        match self.ctor {
            Some(ctor) => ctor(cx, callee, args),
            None => {
                let receiver = create_construct_receiver(callee);
                let result = (self.func)(cx, JsValue::Object(receiver.clone()), args)?;
                Ok(match result {
                    JsValue::Object(_) => result,
                    _ => JsValue::Object(receiver),
                })
            }
        }
    }
}

/// Function object whose parent scope is `scope`, inheriting from `Function.prototype`
/// when the scope has one and `Object.prototype` otherwise.
pub fn new_function(
    scope: &JsObjectType,
    name: &str,
    arity: usize,
    callable: Rc<dyn Callable>,
) -> JsObjectType {
    let function = new_object(FunctionObject::new(name, arity, callable));
    {
        let mut f = function.borrow_mut();
        f.set_prototype(
            class_prototype(scope, "Function").or_else(|| class_prototype(scope, "Object")),
        );
        f.set_parent_scope(Some(scope.clone()));
    }
    function
}

/// Link `function.prototype` and `prototype.constructor` to each other.
pub fn install_prototype(function: &JsObjectType, prototype: &JsObjectType, attributes: PropertyAttributes) {
    function.borrow_mut().define_own(
        "prototype".into(),
        JsValue::Object(prototype.clone()),
        attributes,
    );
    prototype.borrow_mut().define_own(
        "constructor".into(),
        JsValue::Object(function.clone()),
        PropertyAttributes::DONTENUM,
    );
}
