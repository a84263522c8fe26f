//! The constructors `Context::init_standard_objects` puts on every new global:
//! `Object`, `Array` and `Error`.

pub mod array;
pub mod error;
pub mod object;

use crate::runner::plugin::registry::BuiltInRegistry;

/// Add the standard constructors to `registry`, `Object` first since the others
/// inherit from its prototype.
pub fn register_standard_constructors(registry: &mut BuiltInRegistry) {
    object::register(registry);
    array::register(registry);
    error::register(registry);
}
