//! Bindex compiler crate.
//!
//! Turns expression ASTs into invocable accessors:
//! - Conversion costs and runtime value coercion
//! - Generic parameter inference with constraints
//! - Cost-based overload selection
//! - Node-by-node compilation with an accessor cache

pub mod compile;
pub mod conversion;
pub mod generics;
pub mod overload;

pub use compile::{
    ArgumentInfo, CompiledAccessor, DelegateShape, ExpressionCompiler,
};
pub use conversion::{convert_value, find_conversion};
pub use generics::{infer, GenericBindings};
pub use overload::{resolve_overload, OverloadMatch};
