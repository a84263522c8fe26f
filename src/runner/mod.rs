//! Execution side of the runtime: contexts, the compilation pipeline, the two
//! backends and the object model they share.

pub mod backend;
pub mod context;
pub mod ds;
pub mod eval;
pub mod jit;
pub mod pipeline;
pub mod plugin;
pub mod std_lib;
