//! Semantic pass over a parsed program: early errors, hoisted declarations and, for the
//! optimizing backend, constant folding.

use std::rc::Rc;

use crate::parser::api::TokenStream;
use crate::parser::ast::*;
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::operations::test_and_comparison::{primitive_binary, primitive_unary};
use crate::runner::ds::value::JsValue;

/// Run the pass. Errors are reported through the context and counted; `Err` only when a
/// reporter escalates.
pub fn transform(
    cx: &Context,
    ts: &TokenStream,
    mut program: ProgramData,
    fold: bool,
) -> Result<ProgramData, EngineError> {
    let mut pass = SemanticPass {
        cx,
        ts,
        fold,
        function_depth: 0,
    };
    pass.visit_statements(&mut program.body)?;
    program.declarations = collect_declarations(&program.body);
    Ok(program)
}

/// Transform a single function tree, as used when a function fragment is compiled alone.
pub fn transform_function(
    cx: &Context,
    ts: &TokenStream,
    mut function: Rc<FunctionData>,
    fold: bool,
) -> Result<Rc<FunctionData>, EngineError> {
    let mut pass = SemanticPass {
        cx,
        ts,
        fold,
        function_depth: 0,
    };
    pass.visit_function(&mut function)?;
    Ok(function)
}

struct SemanticPass<'a> {
    cx: &'a Context,
    ts: &'a TokenStream,
    fold: bool,
    function_depth: usize,
}

impl<'a> SemanticPass<'a> {
    fn error(&self, message: &str, meta: &Meta) -> Result<(), EngineError> {
        self.cx.report_error(message, self.ts.position_of(meta))
    }

    fn visit_statements(&mut self, body: &mut [StatementType]) -> Result<(), EngineError> {
        for statement in body.iter_mut() {
            self.visit_statement(statement)?;
        }
        Ok(())
    }

    fn visit_statement(&mut self, statement: &mut StatementType) -> Result<(), EngineError> {
        match statement {
            StatementType::ExpressionStatement { expression, .. } => {
                self.visit_expression(expression)
            }
            StatementType::VariableDeclaration { declarations, .. } => {
                for d in declarations.iter_mut() {
                    if let Some(init) = &mut d.init {
                        self.visit_expression(init)?;
                    }
                }
                Ok(())
            }
            StatementType::FunctionDeclaration(f) => self.visit_function(f),
            StatementType::BlockStatement { body, .. } => self.visit_statements(body),
            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.visit_expression(test)?;
                self.visit_statement(consequent)?;
                if let Some(alternate) = alternate {
                    self.visit_statement(alternate)?;
                }
                Ok(())
            }
            StatementType::WhileStatement { test, body, .. } => {
                self.visit_expression(test)?;
                self.visit_statement(body)
            }
            StatementType::ReturnStatement { meta, argument } => {
                if self.function_depth == 0 {
                    self.error("invalid return", meta)?;
                }
                if let Some(argument) = argument {
                    self.visit_expression(argument)?;
                }
                Ok(())
            }
            StatementType::ThrowStatement { argument, .. } => self.visit_expression(argument),
            StatementType::EmptyStatement { .. } => Ok(()),
        }
    }

    fn visit_function(&mut self, function: &mut Rc<FunctionData>) -> Result<(), EngineError> {
        let f = Rc::make_mut(function);
        for (i, param) in f.params.iter().enumerate() {
            if f.params[..i].contains(param) {
                self.cx.report_warning(
                    &format!("duplicate formal parameter \"{}\"", param),
                    self.ts.position_of(&f.meta),
                );
            }
        }
        self.function_depth += 1;
        let result = self.visit_statements(&mut f.body);
        self.function_depth -= 1;
        result?;
        f.declarations = collect_declarations(&f.body);
        Ok(())
    }

    fn visit_expression(&mut self, expression: &mut ExpressionType) -> Result<(), EngineError> {
        match expression {
            ExpressionType::Literal(_)
            | ExpressionType::Identifier(_)
            | ExpressionType::ThisExpression => {}
            ExpressionType::ArrayExpression(elements) | ExpressionType::SequenceExpression(elements) => {
                for e in elements.iter_mut() {
                    self.visit_expression(e)?;
                }
            }
            ExpressionType::ObjectExpression(properties) => {
                for p in properties.iter_mut() {
                    self.visit_expression(&mut p.value)?;
                }
            }
            ExpressionType::FunctionExpression(f) => self.visit_function(f)?,
            ExpressionType::UnaryExpression { argument, .. } => self.visit_expression(argument)?,
            ExpressionType::BinaryExpression { left, right, .. }
            | ExpressionType::LogicalExpression { left, right, .. } => {
                self.visit_expression(left)?;
                self.visit_expression(right)?;
            }
            ExpressionType::AssignmentExpression {
                meta, left, right, ..
            } => {
                if !matches!(
                    **left,
                    ExpressionType::Identifier(_) | ExpressionType::MemberExpression { .. }
                ) {
                    self.error("invalid assignment left-hand side", meta)?;
                }
                self.visit_expression(left)?;
                self.visit_expression(right)?;
            }
            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.visit_expression(test)?;
                self.visit_expression(consequent)?;
                self.visit_expression(alternate)?;
            }
            ExpressionType::CallExpression { callee, arguments }
            | ExpressionType::NewExpression { callee, arguments } => {
                self.visit_expression(callee)?;
                for a in arguments.iter_mut() {
                    self.visit_expression(a)?;
                }
            }
            ExpressionType::MemberExpression { object, property } => {
                self.visit_expression(object)?;
                if let MemberProperty::Computed(p) = property {
                    self.visit_expression(p)?;
                }
            }
        }
        if self.fold {
            if let Some(folded) = fold_constant(expression) {
                *expression = folded;
            }
        }
        Ok(())
    }
}

fn literal_value(literal: &LiteralType) -> JsValue {
    match literal {
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
    }
}

fn value_literal(value: JsValue) -> Option<ExpressionType> {
    Some(ExpressionType::Literal(match value {
        JsValue::String(s) => LiteralType::StringLiteral(s),
        JsValue::Boolean(b) => LiteralType::BooleanLiteral(b),
        JsValue::Null => LiteralType::NullLiteral,
        JsValue::Number(n) => LiteralType::NumberLiteral(n),
        JsValue::Undefined | JsValue::Object(_) => return None,
    }))
}

/// Fold a unary or binary expression whose operands are already literals.
fn fold_constant(expression: &ExpressionType) -> Option<ExpressionType> {
    match expression {
        ExpressionType::UnaryExpression { operator, argument } => {
            let v = literal_value(argument.as_literal()?);
            value_literal(primitive_unary(operator, &v)?)
        }
        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
        } => {
            let a = literal_value(left.as_literal()?);
            let b = literal_value(right.as_literal()?);
            value_literal(primitive_binary(operator, &a, &b)?)
        }
        _ => None,
    }
}

/// Var names and function declarations of one body, not descending into nested functions.
pub fn collect_declarations(body: &[StatementType]) -> Declarations {
    let mut declarations = Declarations::default();
    collect_into(body, &mut declarations);
    declarations
}

fn collect_into(body: &[StatementType], declarations: &mut Declarations) {
    for statement in body {
        collect_statement(statement, declarations);
    }
}

fn collect_statement(statement: &StatementType, declarations: &mut Declarations) {
    match statement {
        StatementType::VariableDeclaration { declarations: d, .. } => {
            for declarator in d {
                if !declarations.var_names.contains(&declarator.id) {
                    declarations.var_names.push(declarator.id.clone());
                }
            }
        }
        StatementType::FunctionDeclaration(f) => declarations.functions.push(f.clone()),
        StatementType::BlockStatement { body, .. } => collect_into(body, declarations),
        StatementType::IfStatement {
            consequent,
            alternate,
            ..
        } => {
            collect_statement(consequent, declarations);
            if let Some(alternate) = alternate {
                collect_statement(alternate, declarations);
            }
        }
        StatementType::WhileStatement { body, .. } => collect_statement(body, declarations),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Meta {
        Meta {
            start_index: 0,
            end_index: 0,
            line: 1,
        }
    }

    fn number(n: f64) -> ExpressionType {
        ExpressionType::Literal(LiteralType::NumberLiteral(n))
    }

    #[test]
    fn test_fold_nested_binary() {
        let expression = ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            left: Box::new(number(1.0)),
            right: Box::new(number(2.0)),
        };
        assert_eq!(fold_constant(&expression), Some(number(3.0)));
        let not_literal = ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            left: Box::new(ExpressionType::Identifier("x".to_string())),
            right: Box::new(number(2.0)),
        };
        assert_eq!(fold_constant(&not_literal), None);
    }

    #[test]
    fn test_collect_declarations_skips_nested_functions() {
        let inner = Rc::new(FunctionData {
            meta: meta(),
            id: Some("g".to_string()),
            params: vec![],
            body: vec![StatementType::VariableDeclaration {
                meta: meta(),
                declarations: vec![VariableDeclaratorData {
                    meta: meta(),
                    id: "hidden".to_string(),
                    init: None,
                }],
            }],
            is_expression: false,
            declarations: Declarations::default(),
        });
        let body = vec![
            StatementType::BlockStatement {
                meta: meta(),
                body: vec![StatementType::VariableDeclaration {
                    meta: meta(),
                    declarations: vec![VariableDeclaratorData {
                        meta: meta(),
                        id: "a".to_string(),
                        init: None,
                    }],
                }],
            },
            StatementType::FunctionDeclaration(inner),
        ];
        let declarations = collect_declarations(&body);
        assert_eq!(declarations.var_names, vec!["a".to_string()]);
        assert_eq!(declarations.functions.len(), 1);
    }
}
