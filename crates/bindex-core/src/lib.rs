//! Bindex core crate.
//!
//! Shared vocabulary for the binding-expression pipeline:
//! - Type identity via stable 64-bit hashes
//! - The static type lattice used by resolution and compilation
//! - The runtime value model, object references, and delegates
//! - Member descriptors with get/set/invoke/observe capabilities
//! - Operator token definitions and the precedence table
//! - The error taxonomy for every pipeline phase

pub mod data_type;
pub mod error;
pub mod member;
pub mod metadata;
pub mod token_type;
pub mod type_hash;
pub mod value;

pub use data_type::DataType;
pub use error::{
    BindexError, CompileError, EvalError, ParseError, ParseErrorKind, RegistrationError,
    ResolveError, TokenWindow,
};
pub use member::{
    GenericConstraint, GenericParam, Getter, Invoker, MemberDescriptor, MemberFlags, MemberKind,
    MemberKinds, MemberRequest, Observer, ParamInfo, Setter, Subscription, ValueListener,
};
pub use metadata::Metadata;
pub use token_type::{binary_tokens, unary_tokens, BinaryTokenType, UnaryTokenType};
pub use type_hash::{primitives, TypeHash};
pub use value::{Delegate, ObjectRef, Value};
