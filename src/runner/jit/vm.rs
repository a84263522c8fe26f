//! Stack-based bytecode virtual machine.
//!
//! Executes the bytecode emitted by the compiler with a flat dispatch loop.
//! Names resolve on the same scope-object chain the interpreter uses, so both
//! backends observe identical binding semantics.

use std::rc::Rc;

use crate::parser::ast::UnaryOperator;
use crate::runner::backend::{ScriptBody, UnitInfo};
use crate::runner::context::{Context, FrameInfo};
use crate::runner::ds::error::EngineError;
use crate::runner::ds::function_object::{install_prototype, new_function, Callable};
use crate::runner::ds::object::JsObjectType;
use crate::runner::ds::object_property::{PropertyAttributes, PropertyKey};
use crate::runner::ds::operations::lex_env::{
    assign_binding, declare_function, declare_var, get_identifier_reference, new_activation,
    resolve_binding,
};
use crate::runner::ds::operations::object::{
    call_function, construct, get_property, new_array, new_plain_object, property_base,
    put_property, to_property_key, top_level_scope,
};
use crate::runner::ds::operations::test_and_comparison::{apply_binary, apply_unary};
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;

use super::bytecode::{Chunk, FunctionChunk, OpCode};
use super::compiler::opcode_binary_operator;

/// How a chunk finished.
pub enum VmResult {
    /// `Halt` at the end of a program: the last expression-statement value.
    Completed(JsValue),
    /// `Return` from a function body.
    Returned(JsValue),
}

/// The bytecode virtual machine.
pub struct Vm<'a> {
    cx: &'a Context,
    chunk: &'a Chunk,
    scope: JsObjectType,
    this: JsValue,
    unit: Rc<UnitInfo>,
    /// Instruction pointer.
    ip: usize,
    /// Operand stack.
    stack: Vec<JsValue>,
    result: JsValue,
}

impl<'a> Vm<'a> {
    pub fn new(
        cx: &'a Context,
        chunk: &'a Chunk,
        scope: JsObjectType,
        this: JsValue,
        unit: Rc<UnitInfo>,
    ) -> Self {
        Vm {
            cx,
            chunk,
            scope,
            this,
            unit,
            ip: 0,
            stack: Vec::with_capacity(64),
            result: JsValue::Undefined,
        }
    }

    /// Bind the chunk's hoisted `var` names and function declarations.
    pub fn hoist(&self) {
        for idx in self.chunk.var_names.iter() {
            declare_var(&self.scope, self.chunk.get_name(*idx));
        }
        for (name_idx, fn_idx) in self.chunk.hoisted_functions.iter() {
            if let Some(function) = self.chunk.functions.get(*fn_idx as usize) {
                let object = make_closure(function, &self.scope, &self.unit);
                declare_function(
                    &self.scope,
                    self.chunk.get_name(*name_idx),
                    JsValue::Object(object),
                );
            }
        }
    }

    #[inline]
    fn pop(&mut self) -> Result<JsValue, EngineError> {
        self.stack
            .pop()
            .ok_or_else(|| EngineError::type_error("bytecode stack underflow"))
    }

    #[inline]
    fn peek(&self, depth: usize) -> Result<JsValue, EngineError> {
        let len = self.stack.len();
        if depth < len {
            Ok(self.stack[len - 1 - depth].clone())
        } else {
            Err(EngineError::type_error("bytecode stack underflow"))
        }
    }

    fn pop_args(&mut self, argc: usize) -> Result<Vec<JsValue>, EngineError> {
        if argc > self.stack.len() {
            return Err(EngineError::type_error("bytecode stack underflow"));
        }
        Ok(self.stack.split_off(self.stack.len() - argc))
    }

    fn base_of(&self, value: &JsValue, key: &PropertyKey) -> Result<JsObjectType, EngineError> {
        property_base(&self.scope, value, key)
    }

    /// Run until `Halt` or `Return`.
    pub fn run(&mut self) -> Result<VmResult, EngineError> {
        let debugging = self.cx.is_debugging_active();
        let observer = self.cx.debug_observer();
        let chunk: &'a Chunk = self.chunk;
        let code = &chunk.code;

        while self.ip < code.len() {
            let instr = &code[self.ip];
            if debugging {
                observer.on_bytecode(self.ip);
            }
            self.ip += 1;

            match instr.op {
                // ── Constants & Literals ──────────────────────
                OpCode::Constant => {
                    let value = self
                        .chunk
                        .constants
                        .get(instr.operand as usize)
                        .cloned()
                        .unwrap_or(JsValue::Undefined);
                    self.stack.push(value);
                }
                OpCode::Undefined => self.stack.push(JsValue::Undefined),
                OpCode::Null => self.stack.push(JsValue::Null),
                OpCode::True => self.stack.push(JsValue::Boolean(true)),
                OpCode::False => self.stack.push(JsValue::Boolean(false)),
                OpCode::This => self.stack.push(self.this.clone()),

                // ── Arithmetic & Comparison ───────────────────
                OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Mod
                | OpCode::StrictEqual
                | OpCode::StrictNotEqual
                | OpCode::Equal
                | OpCode::NotEqual
                | OpCode::LessThan
                | OpCode::LessEqual
                | OpCode::GreaterThan
                | OpCode::GreaterEqual => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    let op = opcode_binary_operator(instr.op).ok_or_else(|| {
                        EngineError::type_error(format!("{:?} is not a binary opcode", instr.op))
                    })?;
                    self.stack.push(apply_binary(self.cx, &op, &a, &b)?);
                }

                // ── Unary ────────────────────────────────────
                OpCode::Negate | OpCode::UnaryPlus | OpCode::Not | OpCode::TypeOf => {
                    let v = self.pop()?;
                    let op = match instr.op {
                        OpCode::Negate => UnaryOperator::Minus,
                        OpCode::UnaryPlus => UnaryOperator::Plus,
                        OpCode::Not => UnaryOperator::LogicalNot,
                        _ => UnaryOperator::TypeOf,
                    };
                    self.stack.push(apply_unary(self.cx, &op, &v)?);
                }
                OpCode::TypeOfName => {
                    let name = self.chunk.get_name(instr.operand);
                    let value = match get_identifier_reference(&self.scope, name) {
                        Some(_) => resolve_binding(&self.scope, name)?,
                        None => JsValue::Undefined,
                    };
                    self.stack
                        .push(apply_unary(self.cx, &UnaryOperator::TypeOf, &value)?);
                }

                // ── Variables ────────────────────────────────
                OpCode::GetVar => {
                    let value = resolve_binding(&self.scope, self.chunk.get_name(instr.operand))?;
                    self.stack.push(value);
                }
                OpCode::SetVar => {
                    let value = self.peek(0)?;
                    assign_binding(&self.scope, self.chunk.get_name(instr.operand), value);
                }

                // ── Objects & Properties ─────────────────────
                OpCode::GetProp => {
                    let object = self.pop()?;
                    let key = PropertyKey::from_name(self.chunk.get_name(instr.operand));
                    let base = self.base_of(&object, &key)?;
                    self.stack
                        .push(get_property(&base, &key).unwrap_or(JsValue::Undefined));
                }
                OpCode::SetProp => {
                    let value = self.pop()?;
                    let object = self.pop()?;
                    let key = PropertyKey::from_name(self.chunk.get_name(instr.operand));
                    let base = self.base_of(&object, &key)?;
                    put_property(&base, key, value.clone());
                    self.stack.push(value);
                }
                OpCode::GetElem => {
                    let key = self.pop()?;
                    let object = self.pop()?;
                    let key = to_property_key(self.cx, &key)?;
                    let base = self.base_of(&object, &key)?;
                    self.stack
                        .push(get_property(&base, &key).unwrap_or(JsValue::Undefined));
                }
                OpCode::SetElem => {
                    let value = self.pop()?;
                    let key = self.pop()?;
                    let object = self.pop()?;
                    let key = to_property_key(self.cx, &key)?;
                    let base = self.base_of(&object, &key)?;
                    put_property(&base, key, value.clone());
                    self.stack.push(value);
                }
                OpCode::NewObject => {
                    self.stack
                        .push(JsValue::Object(new_plain_object(&self.scope)));
                }
                OpCode::InitProp => {
                    let value = self.pop()?;
                    if let JsValue::Object(o) = self.peek(0)? {
                        put_property(
                            &o,
                            PropertyKey::from_name(self.chunk.get_name(instr.operand)),
                            value,
                        );
                    }
                }
                OpCode::NewArray => {
                    let elements = self.pop_args(instr.operand as usize)?;
                    self.stack
                        .push(JsValue::Object(new_array(&self.scope, elements)));
                }
                OpCode::MakeClosure => {
                    let function = self
                        .chunk
                        .functions
                        .get(instr.operand as usize)
                        .ok_or_else(|| EngineError::type_error("unknown function index"))?;
                    let object = make_closure(function, &self.scope, &self.unit);
                    self.stack.push(JsValue::Object(object));
                }

                // ── Function calls ───────────────────────────
                OpCode::Call => {
                    let args = self.pop_args(instr.operand as usize)?;
                    let callee = self.pop()?;
                    let this = self.pop()?;
                    let result = call_function(self.cx, &callee, this, args)?;
                    self.stack.push(result);
                }
                OpCode::New => {
                    let args = self.pop_args(instr.operand as usize)?;
                    let callee = self.pop()?;
                    let result = construct(self.cx, &callee, args)?;
                    if let JsValue::Object(o) = &result {
                        observer.on_new_object(o.borrow().class_name());
                    }
                    self.stack.push(result);
                }

                // ── Control Flow ─────────────────────────────
                OpCode::Jump => self.ip = instr.operand as usize,
                OpCode::JumpIfFalse => {
                    if !to_boolean(&self.pop()?) {
                        self.ip = instr.operand as usize;
                    }
                }
                OpCode::JumpIfTrue => {
                    if to_boolean(&self.pop()?) {
                        self.ip = instr.operand as usize;
                    }
                }

                // ── Stack manipulation ───────────────────────
                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::Dup => {
                    let top = self.peek(0)?;
                    self.stack.push(top);
                }
                OpCode::Dup2 => {
                    let a = self.peek(1)?;
                    let b = self.peek(0)?;
                    self.stack.push(a);
                    self.stack.push(b);
                }

                // ── Misc ─────────────────────────────────────
                OpCode::SetResult => self.result = self.pop()?,
                OpCode::Line => self.cx.set_current_line(instr.operand),
                OpCode::Return => return Ok(VmResult::Returned(self.pop()?)),
                OpCode::Throw => return Err(EngineError::Uncaught(self.pop()?)),
                OpCode::Halt => break,
            }
        }

        Ok(VmResult::Completed(self.result.clone()))
    }
}

/// Function object running `function` with `scope` as its closure scope.
pub fn make_closure(
    function: &Rc<FunctionChunk>,
    scope: &JsObjectType,
    unit: &Rc<UnitInfo>,
) -> JsObjectType {
    let callable = Rc::new(BytecodeFunction {
        function: function.clone(),
        unit: unit.clone(),
    });
    let object = new_function(
        scope,
        function.name.as_deref().unwrap_or(""),
        function.params.len(),
        callable,
    );
    let prototype = new_plain_object(scope);
    install_prototype(
        &object,
        &prototype,
        PropertyAttributes::DONTENUM | PropertyAttributes::PERMANENT,
    );
    object
}

/// A compiled function body.
pub struct BytecodeFunction {
    function: Rc<FunctionChunk>,
    unit: Rc<UnitInfo>,
}

impl Callable for BytecodeFunction {
    fn call(
        &self,
        cx: &Context,
        callee: &JsObjectType,
        this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EngineError> {
        let _frame = cx.enter_frame(FrameInfo {
            source_name: self.unit.source_name.clone(),
            line: self.function.line,
            security_domain: self.unit.security_domain.clone(),
        })?;
        cx.debug_observer()
            .on_call(self.function.name.as_deref().unwrap_or("anonymous"));

        let closure_scope = callee
            .borrow()
            .parent_scope()
            .unwrap_or_else(|| callee.clone());
        let activation = new_activation(&closure_scope);
        {
            let mut a = activation.borrow_mut();
            let mut args = args.into_iter();
            for param in self.function.params.iter() {
                a.define_own(
                    PropertyKey::from_name(param),
                    args.next().unwrap_or(JsValue::Undefined),
                    PropertyAttributes::PERMANENT,
                );
            }
            if let (true, Some(name)) = (self.function.is_expression, &self.function.name) {
                let key = PropertyKey::from_name(name);
                if !a.has_own(&key) {
                    a.define_own(key, JsValue::Object(callee.clone()), PropertyAttributes::empty());
                }
            }
        }

        let this = if this.is_null_or_undefined() {
            JsValue::Object(top_level_scope(&closure_scope))
        } else {
            this
        };
        let mut vm = Vm::new(cx, &self.function.chunk, activation, this, self.unit.clone());
        vm.hoist();
        Ok(match vm.run()? {
            VmResult::Returned(v) => v,
            VmResult::Completed(_) => JsValue::Undefined,
        })
    }
}

/// A compiled top-level program.
pub struct BytecodeScript {
    chunk: Chunk,
    unit: Rc<UnitInfo>,
}

impl BytecodeScript {
    pub fn new(chunk: Chunk, unit: Rc<UnitInfo>) -> Self {
        BytecodeScript { chunk, unit }
    }

    pub fn chunk(&self) -> &Chunk {
        &self.chunk
    }
}

impl ScriptBody for BytecodeScript {
    fn exec(&self, cx: &Context, scope: &JsObjectType) -> Result<JsValue, EngineError> {
        let mut vm = Vm::new(
            cx,
            &self.chunk,
            scope.clone(),
            JsValue::Object(scope.clone()),
            self.unit.clone(),
        );
        vm.hoist();
        Ok(match vm.run()? {
            VmResult::Completed(v) | VmResult::Returned(v) => v,
        })
    }
}
