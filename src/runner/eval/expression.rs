//! Expression evaluation.

use crate::parser::ast::{
    AssignmentOperator, ExpressionType, LiteralType, LogicalOperator, MemberProperty,
    UnaryOperator,
};
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::lex_env::get_identifier_reference;
use crate::runner::ds::operations::object::{
    call_function, construct, new_array, new_plain_object, property_base, put_property,
    to_property_key,
};
use crate::runner::ds::operations::test_and_comparison::{apply_binary, apply_unary};
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::value::JsValue;

use super::function::instantiate_function;
use super::types::{ExecEnv, Reference, ValueResult};

pub fn literal_value(literal: &LiteralType) -> JsValue {
    match literal {
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::NumberLiteral(n) => JsValue::Number(*n),
    }
}

/// Evaluate an expression to a value.
pub fn evaluate_expression(expr: &ExpressionType, cx: &Context, env: &ExecEnv) -> ValueResult {
    match expr {
        ExpressionType::Literal(literal) => Ok(literal_value(literal)),

        ExpressionType::Identifier(_) | ExpressionType::MemberExpression { .. } => {
            evaluate_reference(expr, cx, env)?.get_value(env)
        }

        ExpressionType::ThisExpression => Ok(env.this.clone()),

        ExpressionType::ArrayExpression(elements) => {
            let values = evaluate_arguments(elements, cx, env)?;
            Ok(JsValue::Object(new_array(&env.scope, values)))
        }

        ExpressionType::ObjectExpression(properties) => {
            let object = new_plain_object(&env.scope);
            for property in properties {
                let value = evaluate_expression(&property.value, cx, env)?;
                put_property(&object, PropertyKey::from_name(&property.key), value);
            }
            Ok(JsValue::Object(object))
        }

        ExpressionType::FunctionExpression(data) => Ok(JsValue::Object(instantiate_function(
            data,
            &env.scope,
            &env.unit,
        ))),

        ExpressionType::UnaryExpression { operator, argument } => {
            if let (UnaryOperator::TypeOf, ExpressionType::Identifier(name)) =
                (operator, argument.as_ref())
            {
                // typeof of an undeclared name is "undefined", not a ReferenceError
                if get_identifier_reference(&env.scope, name).is_none() {
                    return Ok(JsValue::String("undefined".to_string()));
                }
            }
            let value = evaluate_expression(argument, cx, env)?;
            apply_unary(cx, operator, &value)
        }

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, cx, env)?;
            let r = evaluate_expression(right, cx, env)?;
            apply_binary(cx, operator, &l, &r)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
        } => {
            let l = evaluate_expression(left, cx, env)?;
            let short_circuit = match operator {
                LogicalOperator::Or => to_boolean(&l),
                LogicalOperator::And => !to_boolean(&l),
            };
            if short_circuit {
                Ok(l)
            } else {
                evaluate_expression(right, cx, env)
            }
        }

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment(operator, left, right, cx, env),

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
        } => {
            if to_boolean(&evaluate_expression(test, cx, env)?) {
                evaluate_expression(consequent, cx, env)
            } else {
                evaluate_expression(alternate, cx, env)
            }
        }

        ExpressionType::CallExpression { callee, arguments } => {
            let (function, this) = match callee.as_ref() {
                ExpressionType::MemberExpression { .. } => {
                    let reference = evaluate_reference(callee, cx, env)?;
                    let this = match &reference {
                        Reference::Property { base, .. } => JsValue::Object(base.clone()),
                        Reference::Binding(_) => JsValue::Undefined,
                    };
                    (reference.get_value(env)?, this)
                }
                _ => (evaluate_expression(callee, cx, env)?, JsValue::Undefined),
            };
            let args = evaluate_arguments(arguments, cx, env)?;
            call_function(cx, &function, this, args)
        }

        ExpressionType::NewExpression { callee, arguments } => {
            let function = evaluate_expression(callee, cx, env)?;
            let args = evaluate_arguments(arguments, cx, env)?;
            let result = construct(cx, &function, args)?;
            if let JsValue::Object(o) = &result {
                cx.debug_observer().on_new_object(o.borrow().class_name());
            }
            Ok(result)
        }

        ExpressionType::SequenceExpression(expressions) => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, cx, env)?;
            }
            Ok(value)
        }
    }
}

pub fn evaluate_arguments(
    arguments: &[ExpressionType],
    cx: &Context,
    env: &ExecEnv,
) -> Result<Vec<JsValue>, EngineError> {
    arguments
        .iter()
        .map(|a| evaluate_expression(a, cx, env))
        .collect()
}

/// Resolve an identifier or member expression to an assignable location. Primitive
/// bases are wrapped so their prototype methods are reachable.
pub fn evaluate_reference(
    expr: &ExpressionType,
    cx: &Context,
    env: &ExecEnv,
) -> Result<Reference, EngineError> {
    match expr {
        ExpressionType::Identifier(name) => Ok(Reference::Binding(name.clone())),
        ExpressionType::MemberExpression { object, property } => {
            let base_value = evaluate_expression(object, cx, env)?;
            let key = match property {
                MemberProperty::Named(name) => PropertyKey::from_name(name),
                MemberProperty::Computed(e) => {
                    let k = evaluate_expression(e, cx, env)?;
                    to_property_key(cx, &k)?
                }
            };
            let base = property_base(&env.scope, &base_value, &key)?;
            Ok(Reference::Property { base, key })
        }
        _ => Err(EngineError::reference_error("invalid assignment left-hand side")),
    }
}

fn evaluate_assignment(
    operator: &AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    cx: &Context,
    env: &ExecEnv,
) -> ValueResult {
    let reference = evaluate_reference(left, cx, env)?;
    let value = match operator.binary_operator() {
        None => evaluate_expression(right, cx, env)?,
        Some(op) => {
            let current = reference.get_value(env)?;
            let r = evaluate_expression(right, cx, env)?;
            apply_binary(cx, &op, &current, &r)?
        }
    };
    reference.put_value(env, value.clone());
    Ok(value)
}
