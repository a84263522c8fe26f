//! Stack bytecode emitted by the compiler and run by the VM.
//!
//! A [`Chunk`] is one program or function body: a flat instruction list, a literal
//! pool, an interned name table, the nested function bodies it can close over and
//! the declarations to hoist before the first instruction runs.

use std::fmt::Write;
use std::rc::Rc;

use indexmap::IndexSet;

use crate::runner::ds::value::JsValue;

/// Operand meanings are noted where an operation reads one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    // literals
    /// literal pool index
    Constant,
    Undefined,
    Null,
    True,
    False,
    This,

    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Negate,
    /// ToNumber of the popped value.
    UnaryPlus,

    // comparison
    StrictEqual,
    StrictNotEqual,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    Not,
    TypeOf,
    /// name index; an unresolvable name yields "undefined" instead of throwing
    TypeOfName,

    // scope chain, operand is a name index
    GetVar,
    /// Stores the top of stack and leaves it in place.
    SetVar,

    // properties
    /// [obj] -> [obj.name]
    GetProp,
    /// [obj, value] -> [value]
    SetProp,
    /// [obj, key] -> [obj[key]]
    GetElem,
    /// [obj, key, value] -> [value]
    SetElem,
    NewObject,
    /// [obj, value] -> [obj], defines `name` on obj
    InitProp,
    /// element count
    NewArray,
    /// function index
    MakeClosure,

    /// [this, callee, args..]; operand is the argument count
    Call,
    /// [callee, args..]; operand is the argument count
    New,

    // absolute targets
    Jump,
    JumpIfFalse,
    JumpIfTrue,

    Pop,
    Dup,
    /// [a, b] -> [a, b, a, b]
    Dup2,

    /// Pops into the script's completion value.
    SetResult,
    /// source line
    Line,
    Return,
    Throw,
    Halt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: OpCode,
    pub operand: u32,
}

/// A function body and what its closure binds on entry.
#[derive(Debug, Clone)]
pub struct FunctionChunk {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub is_expression: bool,
    pub line: u32,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub code: Vec<Instruction>,
    pub constants: Vec<JsValue>,
    names: IndexSet<String>,
    pub functions: Vec<Rc<FunctionChunk>>,
    /// `var` declarations, as name indices.
    pub var_names: Vec<u32>,
    /// Function declarations as (name index, function index).
    pub hoisted_functions: Vec<(u32, u32)>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `op` and return its offset.
    pub fn emit_with(&mut self, op: OpCode, operand: u32) -> usize {
        self.code.push(Instruction { op, operand });
        self.code.len() - 1
    }

    pub fn emit_op(&mut self, op: OpCode) -> usize {
        self.emit_with(op, 0)
    }

    pub fn add_constant(&mut self, value: JsValue) -> u32 {
        self.constants.push(value);
        (self.constants.len() - 1) as u32
    }

    /// Intern `name`; equal names share one index.
    pub fn add_name(&mut self, name: &str) -> u32 {
        match self.names.get_index_of(name) {
            Some(i) => i as u32,
            None => self.names.insert_full(name.to_string()).0 as u32,
        }
    }

    pub fn get_name(&self, index: u32) -> &str {
        self.names
            .get_index(index as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn add_function(&mut self, function: FunctionChunk) -> u32 {
        self.functions.push(Rc::new(function));
        (self.functions.len() - 1) as u32
    }

    /// Point the jump at `at` to the next instruction to be emitted.
    pub fn patch_jump(&mut self, at: usize) {
        let target = self.current_pos() as u32;
        if let Some(jump) = self.code.get_mut(at) {
            jump.operand = target;
        }
    }

    pub fn current_pos(&self) -> usize {
        self.code.len()
    }

    /// Listing of the instructions with operands resolved, one per line.
    pub fn disassemble(&self, title: &str) -> String {
        let mut listing = format!("-- {} --\n", title);
        for (offset, Instruction { op, operand }) in self.code.iter().enumerate() {
            let _ = write!(listing, "{:>5} {:<14}", offset, format!("{:?}", op));
            let _ = match op {
                OpCode::Constant => match self.constants.get(*operand as usize) {
                    Some(value) => write!(listing, " #{} {}", operand, value),
                    None => write!(listing, " #{} ?", operand),
                },
                OpCode::GetVar
                | OpCode::SetVar
                | OpCode::TypeOfName
                | OpCode::GetProp
                | OpCode::SetProp
                | OpCode::InitProp => write!(listing, " {}", self.get_name(*operand)),
                OpCode::Jump | OpCode::JumpIfFalse | OpCode::JumpIfTrue => {
                    write!(listing, " => {}", operand)
                }
                OpCode::Call | OpCode::New | OpCode::NewArray => write!(listing, " ({})", operand),
                OpCode::MakeClosure => {
                    let name = self
                        .functions
                        .get(*operand as usize)
                        .and_then(|f| f.name.as_deref())
                        .unwrap_or("anonymous");
                    write!(listing, " {}", name)
                }
                OpCode::Line => write!(listing, " @{}", operand),
                _ => Ok(()),
            };
            listing.push('\n');
        }
        listing
    }
}
