use crate::parser::ast::{BinaryOperator, UnaryOperator};
use crate::runner::context::Context;
use crate::runner::ds::error::EngineError;
use crate::runner::ds::operations::type_conversion::{
    get_type, primitive_to_number, primitive_to_string, to_boolean, to_number, to_primitive,
    PreferredType,
};
use crate::runner::ds::value::JsValue;

pub fn same_value(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::Number(x), JsValue::Number(y)) => {
            (x.is_nan() && y.is_nan()) || (x == y && x.is_sign_negative() == y.is_sign_negative())
        }
        _ => a == b,
    }
}

pub fn strict_equality_comparison(a: &JsValue, b: &JsValue) -> bool {
    a == b
}

pub fn abstract_equality_comparison(
    cx: &Context,
    a: &JsValue,
    b: &JsValue,
) -> Result<bool, EngineError> {
    Ok(match (a, b) {
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        (JsValue::Object(_), JsValue::Object(_)) => a == b,
        (JsValue::Object(_), _) => {
            let pa = to_primitive(cx, a, PreferredType::Default)?;
            primitive_loose_equals(&pa, b)
        }
        (_, JsValue::Object(_)) => {
            let pb = to_primitive(cx, b, PreferredType::Default)?;
            primitive_loose_equals(a, &pb)
        }
        _ => primitive_loose_equals(a, b),
    })
}

fn primitive_loose_equals(a: &JsValue, b: &JsValue) -> bool {
    match (a, b) {
        (JsValue::String(x), JsValue::String(y)) => x == y,
        (JsValue::Boolean(x), JsValue::Boolean(y)) => x == y,
        (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
        (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => false,
        _ => primitive_to_number(a) == primitive_to_number(b),
    }
}

/// Binary operators over primitives. Returns `None` for operands that still need
/// object conversion; constant folding relies on this never touching a context.
pub fn primitive_binary(op: &BinaryOperator, a: &JsValue, b: &JsValue) -> Option<JsValue> {
    if a.is_object() || b.is_object() {
        return None;
    }
    let number = |f: fn(f64, f64) -> f64| {
        JsValue::Number(f(primitive_to_number(a), primitive_to_number(b)))
    };
    Some(match op {
        BinaryOperator::Add => match (a, b) {
            (JsValue::String(_), _) | (_, JsValue::String(_)) => {
                let mut s = primitive_to_string(a);
                s.push_str(&primitive_to_string(b));
                JsValue::String(s)
            }
            _ => number(|x, y| x + y),
        },
        BinaryOperator::Subtract => number(|x, y| x - y),
        BinaryOperator::Multiply => number(|x, y| x * y),
        BinaryOperator::Divide => number(|x, y| x / y),
        BinaryOperator::Modulo => number(|x, y| x % y),
        BinaryOperator::LooselyEqual => JsValue::Boolean(primitive_loose_equals(a, b)),
        BinaryOperator::LooselyUnequal => JsValue::Boolean(!primitive_loose_equals(a, b)),
        BinaryOperator::StrictlyEqual => JsValue::Boolean(a == b),
        BinaryOperator::StrictlyUnequal => JsValue::Boolean(a != b),
        BinaryOperator::LessThan => JsValue::Boolean(compare(a, b, |o| o.is_lt())),
        BinaryOperator::LessThanEqual => JsValue::Boolean(compare(a, b, |o| o.is_le())),
        BinaryOperator::GreaterThan => JsValue::Boolean(compare(a, b, |o| o.is_gt())),
        BinaryOperator::GreaterThanEqual => JsValue::Boolean(compare(a, b, |o| o.is_ge())),
    })
}

fn compare(a: &JsValue, b: &JsValue, test: fn(std::cmp::Ordering) -> bool) -> bool {
    match (a, b) {
        (JsValue::String(x), JsValue::String(y)) => test(x.cmp(y)),
        _ => primitive_to_number(a)
            .partial_cmp(&primitive_to_number(b))
            .map(test)
            .unwrap_or(false),
    }
}

pub fn apply_binary(
    cx: &Context,
    op: &BinaryOperator,
    a: &JsValue,
    b: &JsValue,
) -> Result<JsValue, EngineError> {
    match op {
        BinaryOperator::StrictlyEqual => Ok(JsValue::Boolean(strict_equality_comparison(a, b))),
        BinaryOperator::StrictlyUnequal => {
            Ok(JsValue::Boolean(!strict_equality_comparison(a, b)))
        }
        BinaryOperator::LooselyEqual => Ok(JsValue::Boolean(abstract_equality_comparison(cx, a, b)?)),
        BinaryOperator::LooselyUnequal => {
            Ok(JsValue::Boolean(!abstract_equality_comparison(cx, a, b)?))
        }
        _ => {
            let hint = match op {
                BinaryOperator::Add
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanEqual => PreferredType::Default,
                _ => PreferredType::Number,
            };
            let pa = to_primitive(cx, a, hint)?;
            let pb = to_primitive(cx, b, hint)?;
            primitive_binary(op, &pa, &pb)
                .ok_or_else(|| EngineError::type_error("operands did not convert to primitives"))
        }
    }
}

pub fn apply_unary(cx: &Context, op: &UnaryOperator, v: &JsValue) -> Result<JsValue, EngineError> {
    Ok(match op {
        UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(v)),
        UnaryOperator::Minus => JsValue::Number(-to_number(cx, v)?),
        UnaryOperator::Plus => JsValue::Number(to_number(cx, v)?),
        UnaryOperator::TypeOf => JsValue::String(get_type(v).to_string()),
    })
}

/// Context-free unary evaluation used by constant folding.
pub fn primitive_unary(op: &UnaryOperator, v: &JsValue) -> Option<JsValue> {
    if v.is_object() {
        return None;
    }
    Some(match op {
        UnaryOperator::LogicalNot => JsValue::Boolean(!to_boolean(v)),
        UnaryOperator::Minus => JsValue::Number(-primitive_to_number(v)),
        UnaryOperator::Plus => JsValue::Number(primitive_to_number(v)),
        UnaryOperator::TypeOf => JsValue::String(get_type(v).to_string()),
    })
}
