use crate::runner::context::Context;
use crate::runner::ds::error::{EngineError, JErrorType};
use crate::runner::ds::object::{new_object, JsObjectType, NativeObject};
use crate::runner::ds::object_property::PropertyKey;
use crate::runner::ds::operations::object::{
    call_function, class_prototype, get_property, object_to_string,
};
use crate::runner::ds::value::JsValue;

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_NULL: &str = "null";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

pub fn get_type(a: &JsValue) -> &'static str {
    match a {
        JsValue::Undefined => TYPE_STR_UNDEFINED,
        JsValue::Null => TYPE_STR_OBJECT,
        JsValue::Boolean(_) => TYPE_STR_BOOLEAN,
        JsValue::String(_) => TYPE_STR_STRING,
        JsValue::Number(_) => TYPE_STR_NUMBER,
        JsValue::Object(o) => {
            if o.borrow().as_function().is_some() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreferredType {
    Default,
    String,
    Number,
}

pub fn to_boolean(v: &JsValue) -> bool {
    match v {
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => !(n.is_nan() || *n == 0.0),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Object(_) => true,
    }
}

/// Default value of an object: try `toString`/`valueOf` in the order the hint asks for.
/// Objects exposing neither method fall back to their `[object Class]` rendering.
pub fn to_primitive(
    cx: &Context,
    v: &JsValue,
    preferred_type: PreferredType,
) -> Result<JsValue, EngineError> {
    let o = match v {
        JsValue::Object(o) => o,
        _ => return Ok(v.clone()),
    };
    if let Some(p) = o.borrow().primitive_value() {
        if preferred_type != PreferredType::String || matches!(p, JsValue::String(_)) {
            return Ok(p);
        }
    }
    let order = match preferred_type {
        PreferredType::String => ["toString", "valueOf"],
        _ => ["valueOf", "toString"],
    };
    let mut found_method = false;
    for name in order.iter() {
        if let Some(method) = get_property(o, &PropertyKey::from(*name)) {
            if method.is_callable() {
                found_method = true;
                let result = call_function(cx, &method, v.clone(), vec![])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
    }
    if found_method {
        Err(EngineError::type_error(format!(
            "cannot convert {} to primitive",
            v
        )))
    } else {
        Ok(JsValue::String(object_to_string(cx, o)?))
    }
}

/// Wrap a primitive in an object whose prototype is the matching constructor's prototype.
pub fn to_object(scope: &JsObjectType, v: &JsValue) -> Result<JsObjectType, EngineError> {
    let class_name = match v {
        JsValue::Undefined | JsValue::Null => {
            return Err(JErrorType::TypeError(format!("'{}' cannot be converted to object", v)).into())
        }
        JsValue::Object(o) => return Ok(o.clone()),
        JsValue::Boolean(_) => "Boolean",
        JsValue::Number(_) => "Number",
        JsValue::String(_) => "String",
    };
    let wrapper = new_object(NativeObject::wrapping(class_name, v.clone()));
    {
        let mut w = wrapper.borrow_mut();
        let prototype =
            class_prototype(scope, class_name).or_else(|| class_prototype(scope, "Object"));
        w.set_prototype(prototype);
        w.set_parent_scope(Some(scope.clone()));
        if let JsValue::String(s) = v {
            w.define_own(
                "length".into(),
                JsValue::Number(s.encode_utf16().count() as f64),
                crate::runner::ds::object_property::PropertyAttributes::READONLY
                    | crate::runner::ds::object_property::PropertyAttributes::DONTENUM
                    | crate::runner::ds::object_property::PropertyAttributes::PERMANENT,
            );
        }
    }
    Ok(wrapper)
}

pub fn to_number(cx: &Context, v: &JsValue) -> Result<f64, EngineError> {
    match v {
        JsValue::Object(_) => {
            let p = to_primitive(cx, v, PreferredType::Number)?;
            Ok(primitive_to_number(&p))
        }
        _ => Ok(primitive_to_number(v)),
    }
}

pub fn primitive_to_number(v: &JsValue) -> f64 {
    match v {
        JsValue::Undefined => f64::NAN,
        JsValue::Null => 0.0,
        JsValue::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        JsValue::Number(n) => *n,
        JsValue::String(s) => string_to_number(s),
        JsValue::Object(_) => f64::NAN,
    }
}

pub fn to_string(cx: &Context, v: &JsValue) -> Result<String, EngineError> {
    match v {
        JsValue::Object(_) => {
            let p = to_primitive(cx, v, PreferredType::String)?;
            Ok(primitive_to_string(&p))
        }
        _ => Ok(primitive_to_string(v)),
    }
}

pub fn primitive_to_string(v: &JsValue) -> String {
    match v {
        JsValue::Undefined => TYPE_STR_UNDEFINED.to_string(),
        JsValue::Null => TYPE_STR_NULL.to_string(),
        JsValue::Boolean(b) => b.to_string(),
        JsValue::Number(n) => number_to_string(*n),
        JsValue::String(s) => s.to_string(),
        JsValue::Object(_) => v.to_string(),
    }
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

fn is_js_whitespace(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim_matches(is_js_whitespace);
    if s.is_empty() {
        return 0.0;
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return f64::NAN;
        }
        return hex
            .chars()
            .fold(0.0, |acc, c| acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64);
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

pub fn to_uint32(n: f64) -> u32 {
    if n.is_nan() || n.is_infinite() {
        return 0;
    }
    let m = n.trunc().rem_euclid(4294967296.0);
    m as u32
}

/// Escape a string for inclusion in double-quoted source text.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{000B}' => out.push_str("\\v"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units).iter() {
                    if *unit < 256 {
                        out.push_str(&format!("\\x{:02X}", unit));
                    } else {
                        out.push_str(&format!("\\u{:04X}", unit));
                    }
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(1e20), "100000000000000000000");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number("  42 "), 42.0);
        assert_eq!(string_to_number(""), 0.0);
        assert_eq!(string_to_number("0x1F"), 31.0);
        assert_eq!(string_to_number("1.5e2"), 150.0);
        assert_eq!(string_to_number("-Infinity"), f64::NEG_INFINITY);
        assert!(string_to_number("12px").is_nan());
        assert!(string_to_number("inf").is_nan());
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("a\"b"), "a\\\"b");
        assert_eq!(escape_string("tab\there"), "tab\\there");
        assert_eq!(escape_string("back\\slash"), "back\\\\slash");
        assert_eq!(escape_string("\u{0001}"), "\\x01");
        assert_eq!(escape_string("\u{00e9}"), "\\xE9");
        assert_eq!(escape_string("\u{263A}"), "\\u263A");
        assert_eq!(escape_string("\u{000B}"), "\\v");
    }

    #[test]
    fn test_to_uint32_wraps() {
        assert_eq!(to_uint32(-1.0), 4294967295);
        assert_eq!(to_int32(4294967295.0), -1);
        assert_eq!(to_uint32(f64::NAN), 0);
    }
}
