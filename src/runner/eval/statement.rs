//! Statement execution.

use crate::parser::ast::{Declarations, HasMeta, StatementType};
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::operations::lex_env::{assign_binding, declare_function, declare_var};
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;

use super::expression::evaluate_expression;
use super::function::instantiate_function;
use super::types::{Completion, EvalResult, ExecEnv};

/// Bind hoisted `var` names and function declarations in the environment's scope.
pub fn instantiate_declarations(declarations: &Declarations, env: &ExecEnv) {
    for name in declarations.var_names.iter() {
        declare_var(&env.scope, name);
    }
    for function in declarations.functions.iter() {
        if let Some(name) = &function.id {
            let object = instantiate_function(function, &env.scope, &env.unit);
            declare_function(&env.scope, name, JsValue::Object(object));
        }
    }
}

/// Execute statements in order. The completion value is the last value produced.
pub fn execute_statements(body: &[StatementType], cx: &Context, env: &ExecEnv) -> EvalResult {
    let mut last = None;
    for stmt in body.iter() {
        let completion = execute_statement(stmt, cx, env)?.update_empty(last.clone());
        if completion.is_abrupt() {
            return Ok(completion);
        }
        last = completion.value;
    }
    Ok(Completion {
        value: last,
        ..Completion::normal()
    })
}

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, cx: &Context, env: &ExecEnv) -> EvalResult {
    cx.set_current_line(stmt.get_meta().line);
    match stmt {
        StatementType::EmptyStatement { .. } | StatementType::FunctionDeclaration(_) => {
            Ok(Completion::normal())
        }

        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, cx, env)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::VariableDeclaration { declarations, .. } => {
            for d in declarations.iter() {
                if let Some(init) = &d.init {
                    let value = evaluate_expression(init, cx, env)?;
                    assign_binding(&env.scope, &d.id, value);
                }
            }
            Ok(Completion::normal())
        }

        StatementType::BlockStatement { body, .. } => execute_statements(body, cx, env),

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, cx, env)?) {
                execute_statement(consequent, cx, env)
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, cx, env)
            } else {
                Ok(Completion::normal())
            }
        }

        StatementType::WhileStatement { test, body, .. } => {
            let mut last = None;
            while to_boolean(&evaluate_expression(test, cx, env)?) {
                let completion = execute_statement(body, cx, env)?.update_empty(last.clone());
                if completion.is_abrupt() {
                    return Ok(completion);
                }
                last = completion.value;
            }
            Ok(Completion {
                value: last,
                ..Completion::normal()
            })
        }

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(arg) => evaluate_expression(arg, cx, env)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, cx, env)?;
            Err(EngineError::Uncaught(value))
        }
    }
}
