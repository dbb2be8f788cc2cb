//! Error taxonomy for every pipeline phase.
//!
//! Each phase has its own error enum; [`BindexError`] is the umbrella the
//! top-level facade returns. Parse errors carry the cursor position and a
//! small source window so a caller can point at the offending token.

use thiserror::Error;

use crate::data_type::DataType;
use crate::type_hash::TypeHash;

/// What went wrong while tokenizing or parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("position is outside the source text")]
    OutOfRange,
    #[error("limit cannot precede the current position")]
    InvalidLimit,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unexpected end of expression")]
    UnexpectedEof,
    #[error("expected an expression")]
    ExpectedExpression,
    #[error("malformed numeric literal")]
    InvalidNumber,
    #[error("unterminated string literal")]
    UnterminatedString,
}

/// The characters around a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenWindow {
    pub previous: String,
    pub current: String,
    pub next: String,
}

/// A tokenizer or parser failure, located in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position}: {message} (near '{current}')", current = .window.current)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub position: u32,
    pub window: TokenWindow,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, position: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            position,
            window: TokenWindow::default(),
            message: message.into(),
        }
    }

    pub fn with_window(mut self, window: TokenWindow) -> Self {
        self.window = window;
        self
    }
}

/// Member resolution failures.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("ambiguous match for '{member}' on {ty:?}: {count} candidates rank equally")]
    AmbiguousMatch {
        member: String,
        ty: TypeHash,
        count: usize,
    },
    #[error("no member '{member}' on {ty:?}")]
    InvalidMember { member: String, ty: TypeHash },
    #[error("cannot infer generic parameter '{param}' of '{member}'")]
    GenericInference { member: String, param: String },
    #[error("no conversion from {from} to {to}")]
    Conversion { from: DataType, to: DataType },
}

/// Compilation failures.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("'{0}' is not a lambda parameter, named argument, or member of the first argument")]
    UnboundIdentifier(String),
    #[error("unknown type name '{0}'")]
    UnknownTypeName(String),
    #[error("'?.' requires a member access or method call on its right side")]
    InvalidNullConditional,
    #[error("no static resource named '{0}'")]
    StaticResourceMissing(String),
    #[error("operator '{op}' is not defined for {left} and {right}")]
    UnsupportedOperator {
        op: String,
        left: DataType,
        right: DataType,
    },
}

/// Invocation-time failures inside compiled accessors.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("null receiver for '{0}'")]
    NullReference(String),
    #[error("member '{member}' has no {capability} capability")]
    MissingCapability {
        member: String,
        capability: &'static str,
    },
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("no resource named '{0}'")]
    UnknownResource(String),
    #[error("invocation failed: {0}")]
    Invocation(String),
    #[error("condition did not evaluate to a boolean")]
    NotBool,
    #[error("operator '{op}' cannot be applied to this operand")]
    InvalidOperand { op: String },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("cannot convert {from} to {to} at runtime")]
    Conversion { from: DataType, to: DataType },
}

/// Registration failures.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("type '{0}' is already registered")]
    DuplicateType(String),
    #[error("member '{member}' with this signature already exists on '{ty}'")]
    DuplicateMember { ty: String, member: String },
}

/// Umbrella error returned by the pipeline facade.
#[derive(Debug, Error)]
pub enum BindexError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}
