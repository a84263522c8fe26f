//! Statically registered standard constructors.
//!
//! Built-ins are described as [`BuiltInObject`] values, collected in a
//! [`BuiltInRegistry`] and installed into a scope in one pass:
//!
//! ```text
//! register_standard_constructors → BuiltInRegistry → install(cx, scope)
//!                                             ├── Object (first)
//!                                             ├── Array, Error, ...
//!                                             └── undefined / NaN / Infinity
//! ```

pub mod registry;
pub mod types;

pub use registry::BuiltInRegistry;
pub use types::{BuiltInObject, PluginInfo};
