//! Data structures of the object model: values, property tables, objects, arrays,
//! function objects, and the operations over them.

pub mod array_object;
pub mod error;
pub mod function_object;
pub mod object;
pub mod object_property;
pub mod value;

pub mod operations {
    pub mod lex_env;
    pub mod object;
    pub mod test_and_comparison;
    pub mod type_conversion;
}
