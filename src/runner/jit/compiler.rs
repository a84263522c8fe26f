//! AST-to-bytecode compiler.
//!
//! Walks the transformed tree once and emits a flat bytecode representation
//! that the VM can execute without tree-walking overhead. Nested functions
//! compile into their own chunks.

use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, Declarations, ExpressionType, FunctionData, HasMeta,
    LiteralType, LogicalOperator, MemberProperty, ProgramData, StatementType, UnaryOperator,
};
use crate::runner::ds::value::JsValue;

use super::bytecode::{Chunk, FunctionChunk, OpCode};

/// The bytecode compiler.
pub struct Compiler {
    chunk: Chunk,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            chunk: Chunk::new(),
        }
    }

    /// Compile a full program into bytecode.
    pub fn compile_program(mut self, program: &ProgramData) -> Chunk {
        self.compile_declarations(&program.declarations);
        for stmt in &program.body {
            self.compile_statement(stmt);
        }
        self.chunk.emit_op(OpCode::Halt);
        self.chunk
    }

    /// Compile one function body into its own chunk.
    pub fn compile_function(data: &Rc<FunctionData>) -> FunctionChunk {
        let mut compiler = Compiler::new();
        compiler.compile_declarations(&data.declarations);
        for stmt in &data.body {
            compiler.compile_statement(stmt);
        }
        compiler.chunk.emit_op(OpCode::Undefined);
        compiler.chunk.emit_op(OpCode::Return);
        FunctionChunk {
            name: data.id.clone(),
            params: data.params.clone(),
            is_expression: data.is_expression,
            line: data.meta.line,
            chunk: compiler.chunk,
        }
    }

    fn compile_declarations(&mut self, declarations: &Declarations) {
        for name in declarations.var_names.iter() {
            let idx = self.chunk.add_name(name);
            self.chunk.var_names.push(idx);
        }
        for function in declarations.functions.iter() {
            if let Some(name) = &function.id {
                let name_idx = self.chunk.add_name(name);
                let fn_idx = self.chunk.add_function(Compiler::compile_function(function));
                self.chunk.hoisted_functions.push((name_idx, fn_idx));
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    // Statements
    // ════════════════════════════════════════════════════════════

    fn compile_statement(&mut self, stmt: &StatementType) {
        self.chunk.emit_with(OpCode::Line, stmt.get_meta().line);
        match stmt {
            StatementType::EmptyStatement { .. } | StatementType::FunctionDeclaration(_) => {}

            StatementType::ExpressionStatement { expression, .. } => {
                self.compile_expression(expression);
                self.chunk.emit_op(OpCode::SetResult);
            }

            StatementType::VariableDeclaration { declarations, .. } => {
                for d in declarations.iter() {
                    if let Some(init) = &d.init {
                        self.compile_expression(init);
                        let idx = self.chunk.add_name(&d.id);
                        self.chunk.emit_with(OpCode::SetVar, idx);
                        self.chunk.emit_op(OpCode::Pop);
                    }
                }
            }

            StatementType::BlockStatement { body, .. } => {
                for s in body.iter() {
                    self.compile_statement(s);
                }
            }

            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.compile_expression(test);
                let else_jump = self.chunk.emit_with(OpCode::JumpIfFalse, 0);
                self.compile_statement(consequent);
                match alternate {
                    Some(alternate) => {
                        let end_jump = self.chunk.emit_with(OpCode::Jump, 0);
                        self.chunk.patch_jump(else_jump);
                        self.compile_statement(alternate);
                        self.chunk.patch_jump(end_jump);
                    }
                    None => self.chunk.patch_jump(else_jump),
                }
            }

            StatementType::WhileStatement { test, body, .. } => {
                let loop_start = self.chunk.current_pos() as u32;
                self.compile_expression(test);
                let exit_jump = self.chunk.emit_with(OpCode::JumpIfFalse, 0);
                self.compile_statement(body);
                self.chunk.emit_with(OpCode::Jump, loop_start);
                self.chunk.patch_jump(exit_jump);
            }

            StatementType::ReturnStatement { argument, .. } => {
                match argument {
                    Some(arg) => self.compile_expression(arg),
                    None => {
                        self.chunk.emit_op(OpCode::Undefined);
                    }
                }
                self.chunk.emit_op(OpCode::Return);
            }

            StatementType::ThrowStatement { argument, .. } => {
                self.compile_expression(argument);
                self.chunk.emit_op(OpCode::Throw);
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    // Expressions
    // ════════════════════════════════════════════════════════════

    fn compile_expression(&mut self, expr: &ExpressionType) {
        match expr {
            ExpressionType::Literal(literal) => self.compile_literal(literal),

            ExpressionType::Identifier(name) => {
                let idx = self.chunk.add_name(name);
                self.chunk.emit_with(OpCode::GetVar, idx);
            }

            ExpressionType::ThisExpression => {
                self.chunk.emit_op(OpCode::This);
            }

            ExpressionType::ArrayExpression(elements) => {
                for e in elements.iter() {
                    self.compile_expression(e);
                }
                self.chunk.emit_with(OpCode::NewArray, elements.len() as u32);
            }

            ExpressionType::ObjectExpression(properties) => {
                self.chunk.emit_op(OpCode::NewObject);
                for p in properties.iter() {
                    self.compile_expression(&p.value);
                    let idx = self.chunk.add_name(&p.key);
                    self.chunk.emit_with(OpCode::InitProp, idx);
                }
            }

            ExpressionType::FunctionExpression(data) => {
                let idx = self.chunk.add_function(Compiler::compile_function(data));
                self.chunk.emit_with(OpCode::MakeClosure, idx);
            }

            ExpressionType::UnaryExpression { operator, argument } => {
                if let (UnaryOperator::TypeOf, ExpressionType::Identifier(name)) =
                    (operator, argument.as_ref())
                {
                    let idx = self.chunk.add_name(name);
                    self.chunk.emit_with(OpCode::TypeOfName, idx);
                    return;
                }
                self.compile_expression(argument);
                self.chunk.emit_op(match operator {
                    UnaryOperator::Minus => OpCode::Negate,
                    UnaryOperator::Plus => OpCode::UnaryPlus,
                    UnaryOperator::LogicalNot => OpCode::Not,
                    UnaryOperator::TypeOf => OpCode::TypeOf,
                });
            }

            ExpressionType::BinaryExpression {
                operator,
                left,
                right,
            } => {
                self.compile_expression(left);
                self.compile_expression(right);
                self.chunk.emit_op(binary_opcode(operator));
            }

            ExpressionType::LogicalExpression {
                operator,
                left,
                right,
            } => {
                self.compile_expression(left);
                self.chunk.emit_op(OpCode::Dup);
                let end_jump = self.chunk.emit_with(
                    match operator {
                        LogicalOperator::Or => OpCode::JumpIfTrue,
                        LogicalOperator::And => OpCode::JumpIfFalse,
                    },
                    0,
                );
                self.chunk.emit_op(OpCode::Pop);
                self.compile_expression(right);
                self.chunk.patch_jump(end_jump);
            }

            ExpressionType::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => self.compile_assignment(operator, left, right),

            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.compile_expression(test);
                let else_jump = self.chunk.emit_with(OpCode::JumpIfFalse, 0);
                self.compile_expression(consequent);
                let end_jump = self.chunk.emit_with(OpCode::Jump, 0);
                self.chunk.patch_jump(else_jump);
                self.compile_expression(alternate);
                self.chunk.patch_jump(end_jump);
            }

            ExpressionType::CallExpression { callee, arguments } => {
                match callee.as_ref() {
                    ExpressionType::MemberExpression { object, property } => {
                        self.compile_expression(object);
                        self.chunk.emit_op(OpCode::Dup);
                        self.compile_member_get(property);
                    }
                    _ => {
                        self.chunk.emit_op(OpCode::Undefined);
                        self.compile_expression(callee);
                    }
                }
                for a in arguments.iter() {
                    self.compile_expression(a);
                }
                self.chunk.emit_with(OpCode::Call, arguments.len() as u32);
            }

            ExpressionType::NewExpression { callee, arguments } => {
                self.compile_expression(callee);
                for a in arguments.iter() {
                    self.compile_expression(a);
                }
                self.chunk.emit_with(OpCode::New, arguments.len() as u32);
            }

            ExpressionType::MemberExpression { object, property } => {
                self.compile_expression(object);
                self.compile_member_get(property);
            }

            ExpressionType::SequenceExpression(expressions) => {
                for (i, e) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.chunk.emit_op(OpCode::Pop);
                    }
                    self.compile_expression(e);
                }
                if expressions.is_empty() {
                    self.chunk.emit_op(OpCode::Undefined);
                }
            }
        }
    }

    fn compile_literal(&mut self, literal: &LiteralType) {
        match literal {
            LiteralType::NullLiteral => {
                self.chunk.emit_op(OpCode::Null);
            }
            LiteralType::BooleanLiteral(true) => {
                self.chunk.emit_op(OpCode::True);
            }
            LiteralType::BooleanLiteral(false) => {
                self.chunk.emit_op(OpCode::False);
            }
            LiteralType::NumberLiteral(n) => {
                let idx = self.chunk.add_constant(JsValue::Number(*n));
                self.chunk.emit_with(OpCode::Constant, idx);
            }
            LiteralType::StringLiteral(s) => {
                let idx = self.chunk.add_constant(JsValue::String(s.clone()));
                self.chunk.emit_with(OpCode::Constant, idx);
            }
        }
    }

    /// Object is on the stack; replace it with the property value.
    fn compile_member_get(&mut self, property: &MemberProperty) {
        match property {
            MemberProperty::Named(name) => {
                let idx = self.chunk.add_name(name);
                self.chunk.emit_with(OpCode::GetProp, idx);
            }
            MemberProperty::Computed(key) => {
                self.compile_expression(key);
                self.chunk.emit_op(OpCode::GetElem);
            }
        }
    }

    fn compile_assignment(
        &mut self,
        operator: &AssignmentOperator,
        left: &ExpressionType,
        right: &ExpressionType,
    ) {
        let compound = operator.binary_operator();
        match left {
            ExpressionType::Identifier(name) => {
                let idx = self.chunk.add_name(name);
                if let Some(op) = &compound {
                    self.chunk.emit_with(OpCode::GetVar, idx);
                    self.compile_expression(right);
                    self.chunk.emit_op(binary_opcode(op));
                } else {
                    self.compile_expression(right);
                }
                self.chunk.emit_with(OpCode::SetVar, idx);
            }
            ExpressionType::MemberExpression {
                object,
                property: MemberProperty::Named(name),
            } => {
                let idx = self.chunk.add_name(name);
                self.compile_expression(object);
                if let Some(op) = &compound {
                    self.chunk.emit_op(OpCode::Dup);
                    self.chunk.emit_with(OpCode::GetProp, idx);
                    self.compile_expression(right);
                    self.chunk.emit_op(binary_opcode(op));
                } else {
                    self.compile_expression(right);
                }
                self.chunk.emit_with(OpCode::SetProp, idx);
            }
            ExpressionType::MemberExpression {
                object,
                property: MemberProperty::Computed(key),
            } => {
                self.compile_expression(object);
                self.compile_expression(key);
                if let Some(op) = &compound {
                    self.chunk.emit_op(OpCode::Dup2);
                    self.chunk.emit_op(OpCode::GetElem);
                    self.compile_expression(right);
                    self.chunk.emit_op(binary_opcode(op));
                } else {
                    self.compile_expression(right);
                }
                self.chunk.emit_op(OpCode::SetElem);
            }
            // rejected by the semantic pass before emission
            _ => self.compile_expression(right),
        }
    }
}

fn binary_opcode(operator: &BinaryOperator) -> OpCode {
    match operator {
        BinaryOperator::LooselyEqual => OpCode::Equal,
        BinaryOperator::LooselyUnequal => OpCode::NotEqual,
        BinaryOperator::StrictlyEqual => OpCode::StrictEqual,
        BinaryOperator::StrictlyUnequal => OpCode::StrictNotEqual,
        BinaryOperator::LessThan => OpCode::LessThan,
        BinaryOperator::LessThanEqual => OpCode::LessEqual,
        BinaryOperator::GreaterThan => OpCode::GreaterThan,
        BinaryOperator::GreaterThanEqual => OpCode::GreaterEqual,
        BinaryOperator::Add => OpCode::Add,
        BinaryOperator::Subtract => OpCode::Sub,
        BinaryOperator::Multiply => OpCode::Mul,
        BinaryOperator::Divide => OpCode::Div,
        BinaryOperator::Modulo => OpCode::Mod,
    }
}

/// Operator an opcode applies, for opcodes that are plain binary operators.
pub fn opcode_binary_operator(op: OpCode) -> Option<BinaryOperator> {
    Some(match op {
        OpCode::Equal => BinaryOperator::LooselyEqual,
        OpCode::NotEqual => BinaryOperator::LooselyUnequal,
        OpCode::StrictEqual => BinaryOperator::StrictlyEqual,
        OpCode::StrictNotEqual => BinaryOperator::StrictlyUnequal,
        OpCode::LessThan => BinaryOperator::LessThan,
        OpCode::LessEqual => BinaryOperator::LessThanEqual,
        OpCode::GreaterThan => BinaryOperator::GreaterThan,
        OpCode::GreaterEqual => BinaryOperator::GreaterThanEqual,
        OpCode::Add => BinaryOperator::Add,
        OpCode::Sub => BinaryOperator::Subtract,
        OpCode::Mul => BinaryOperator::Multiply,
        OpCode::Div => BinaryOperator::Divide,
        OpCode::Mod => BinaryOperator::Modulo,
        _ => return None,
    })
}
