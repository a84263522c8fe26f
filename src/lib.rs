//! # just-runtime - an embeddable JavaScript runtime
//!
//! Execution contexts, a compilation pipeline with two backends and a
//! prototype-based object model:
//! - PEG parser producing a small ECMAScript AST
//! - Tree-walking interpreter (optimization level `-1`)
//! - Constant-folding bytecode compiler and stack VM (levels `0..=9`,
//!   `optimizer` feature)
//! - Per-thread context binding with reentrant enter/exit
//! - Error reporting and security-domain resolution through pluggable
//!   collaborators
//!
//! ## Quick Start
//!
//! ```
//! use just_runtime::runner::context::Context;
//! use just_runtime::runner::ds::value::JsValue;
//!
//! let cx = Context::enter();
//! let scope = cx.init_standard_objects().unwrap();
//! let result = cx
//!     .evaluate_string(&scope, "var x = 5 + 3; x * 2", Some("<doc>"), 1, None)
//!     .unwrap();
//! assert_eq!(result, Some(JsValue::Number(16.0)));
//! Context::exit();
//! ```
//!
//! ### Compiling a function
//!
//! ```
//! use just_runtime::runner::context::Context;
//! use just_runtime::runner::ds::value::JsValue;
//!
//! let cx = Context::new();
//! let scope = cx.init_standard_objects().unwrap();
//! let f = cx
//!     .compile_function(&scope, "function add(a, b) { return a + b; }", None, 1, None)
//!     .unwrap()
//!     .unwrap();
//! let sum = f
//!     .call(&cx, &scope, JsValue::Undefined, vec![JsValue::Number(2.0), JsValue::Number(3.0)])
//!     .unwrap();
//! assert_eq!(sum, JsValue::Number(5.0));
//! ```
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG grammar, token stream, AST and semantic transform
//! - **[`runner`]** - Everything that runs code
//!   - **[`runner::context`]** - `Context`, thread registry, error channel, security
//!   - **[`runner::pipeline`]** - Source to compiled unit
//!   - **[`runner::backend`]** - Backend trait, registry, compiled units
//!   - **[`runner::eval`]** - Tree-walking interpreter
//!   - **[`runner::jit`]** - Bytecode compiler and VM
//!   - **[`runner::ds`]** - Values, objects, coercions, serialization
//!   - **[`runner::plugin`]** / **[`runner::std_lib`]** - Standard constructors

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
