use crate::runner::ds::object::{JsObject, ObjectBase};
use crate::runner::ds::object_property::{PropertyAttributes, PropertyKey};
use crate::runner::ds::value::JsValue;

lazy_static! {
    pub static ref ARRAY_LENGTH_PROP: PropertyKey = PropertyKey::Str("length".to_string());
}

/// Largest value `length` can hold.
pub const MAX_ARRAY_LENGTH: u32 = u32::MAX;

/// Whether `n` is usable as an array length: an integer in `0..=MAX_ARRAY_LENGTH`.
pub fn is_valid_length(n: f64) -> bool {
    n >= 0.0 && n.fract() == 0.0 && n <= MAX_ARRAY_LENGTH as f64
}

/// Dense-or-sparse array. `length` is an ordinary DONTENUM|PERMANENT slot kept one past
/// the highest index; shrinking it drops the indices beyond.
pub struct NativeArray {
    base: ObjectBase,
}
impl NativeArray {
    pub fn with_length(length: u32) -> Self {
        let mut base = ObjectBase::new();
        base.define(
            ARRAY_LENGTH_PROP.clone(),
            JsValue::Number(length as f64),
            PropertyAttributes::DONTENUM | PropertyAttributes::PERMANENT,
        );
        NativeArray { base }
    }

    pub fn from_elements(elements: Vec<JsValue>) -> Self {
        let mut array = Self::with_length(elements.len() as u32);
        for (i, element) in elements.into_iter().enumerate() {
            array.base.put(PropertyKey::Int(i as u32), element);
        }
        array
    }

    pub fn length(&self) -> u32 {
        match self.base.get(&ARRAY_LENGTH_PROP) {
            Some(JsValue::Number(n)) => n as u32,
            _ => 0,
        }
    }

    fn set_length(&mut self, length: u32) {
        let old = self.length();
        if length < old {
            self.base
                .retain(|k, _| !matches!(k, PropertyKey::Int(i) if *i >= length));
        }
        self.base.define(
            ARRAY_LENGTH_PROP.clone(),
            JsValue::Number(length as f64),
            PropertyAttributes::DONTENUM | PropertyAttributes::PERMANENT,
        );
    }
}
impl JsObject for NativeArray {
    fn get_object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn get_object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn class_name(&self) -> &str {
        "Array"
    }

    fn put_own(&mut self, key: PropertyKey, value: JsValue) -> bool {
        if key == *ARRAY_LENGTH_PROP {
            return match value {
                JsValue::Number(n) if is_valid_length(n) => {
                    self.set_length(n as u32);
                    true
                }
                _ => false,
            };
        }
        let index = key.as_index();
        let stored = self.base.put(key, value);
        if let Some(i) = index {
            if stored && i >= self.length() {
                self.set_length(i + 1);
            }
        }
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_tracks_highest_index() {
        let mut array = NativeArray::with_length(0);
        array.put_own(PropertyKey::Int(4), JsValue::Number(1.0));
        assert_eq!(array.length(), 5);
        array.put_own(PropertyKey::Int(1), JsValue::Number(1.0));
        assert_eq!(array.length(), 5);
    }

    #[test]
    fn test_length_accepts_maximum() {
        let mut array = NativeArray::with_length(0);
        assert!(array.put_own("length".into(), JsValue::Number(MAX_ARRAY_LENGTH as f64)));
        assert_eq!(array.length(), MAX_ARRAY_LENGTH);
        assert!(!array.put_own("length".into(), JsValue::Number(MAX_ARRAY_LENGTH as f64 + 1.0)));
        assert!(!array.put_own("length".into(), JsValue::Number(1.5)));
        assert_eq!(array.length(), MAX_ARRAY_LENGTH);
    }

    #[test]
    fn test_truncate_through_length() {
        let mut array = NativeArray::from_elements(vec![
            JsValue::Number(1.0),
            JsValue::Number(2.0),
            JsValue::Number(3.0),
        ]);
        assert!(array.put_own("length".into(), JsValue::Number(1.0)));
        assert_eq!(array.length(), 1);
        assert!(array.has_own(&PropertyKey::Int(0)));
        assert!(!array.has_own(&PropertyKey::Int(2)));
        assert!(array.ids() == vec![PropertyKey::Int(0)]);
    }
}
