//! Dynamic runtime values flowing through compiled accessors.
//!
//! [`Value`] is the tagged runtime representation of everything a binding
//! expression can read, write, or pass as an argument. Host objects are
//! carried as [`ObjectRef`] (a type hash plus a shared `Any`), so the
//! dynamic resolution path can recover the runtime type without the host
//! exposing any reflection of its own.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::data_type::DataType;
use crate::error::EvalError;
use crate::metadata::Metadata;
use crate::type_hash::{TypeHash, primitives};

/// A dynamically-typed runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    Object(ObjectRef),
}

impl Value {
    /// Shared singletons for the literals the compiler embeds most often.
    pub const TRUE: Value = Value::Bool(true);
    pub const FALSE: Value = Value::Bool(false);
    pub const ZERO: Value = Value::I32(0);

    /// Build a string value.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Wrap a host object with its registered type hash.
    pub fn object<T: Any + Send + Sync>(type_hash: TypeHash, value: T) -> Self {
        Value::Object(ObjectRef::new(type_hash, value))
    }

    /// Wrap a compiled delegate as a value.
    pub fn delegate(delegate: Delegate) -> Self {
        Value::Object(ObjectRef {
            type_hash: primitives::DELEGATE,
            data: Arc::new(delegate),
        })
    }

    /// The runtime type hash, used by the dynamic resolution path.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            Value::Null => primitives::NULL,
            Value::Bool(_) => primitives::BOOL,
            Value::I8(_) => primitives::I8,
            Value::I16(_) => primitives::I16,
            Value::I32(_) => primitives::I32,
            Value::I64(_) => primitives::I64,
            Value::U8(_) => primitives::U8,
            Value::U16(_) => primitives::U16,
            Value::U32(_) => primitives::U32,
            Value::U64(_) => primitives::U64,
            Value::F32(_) => primitives::F32,
            Value::F64(_) => primitives::F64,
            Value::Str(_) => primitives::STRING,
            Value::Object(obj) => obj.type_hash,
        }
    }

    /// The static shape of this value, as seen by the compiler.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Object,
            other => DataType::Concrete(other.type_hash()),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The boolean payload, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen any integer variant to i64, losslessly where possible.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::U8(v) => Some(*v as i64),
            Value::U16(v) => Some(*v as i64),
            Value::U32(v) => Some(*v as i64),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Widen any numeric variant to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast an object payload to a concrete host type.
    pub fn downcast_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Object(obj) => obj.downcast(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.type_hash == b.type_hash && Arc::ptr_eq(&a.data, &b.data)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::I8(v) => write!(f, "I8({v})"),
            Value::I16(v) => write!(f, "I16({v})"),
            Value::I32(v) => write!(f, "I32({v})"),
            Value::I64(v) => write!(f, "I64({v})"),
            Value::U8(v) => write!(f, "U8({v})"),
            Value::U16(v) => write!(f, "U16({v})"),
            Value::U32(v) => write!(f, "U32({v})"),
            Value::U64(v) => write!(f, "U64({v})"),
            Value::F32(v) => write!(f, "F32({v})"),
            Value::F64(v) => write!(f, "F64({v})"),
            Value::Str(v) => write!(f, "Str({v:?})"),
            Value::Object(obj) => write!(f, "Object({})", obj.type_hash),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Object(obj) => write!(f, "<{}>", obj.type_hash),
        }
    }
}

/// A shared reference to a host object, tagged with its runtime type.
#[derive(Clone)]
pub struct ObjectRef {
    /// The registered type of the payload.
    pub type_hash: TypeHash,
    /// The payload itself, shared across accessors.
    pub data: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    /// Wrap a host value.
    pub fn new<T: Any + Send + Sync>(type_hash: TypeHash, value: T) -> Self {
        Self {
            type_hash,
            data: Arc::new(value),
        }
    }

    /// Downcast the payload to a concrete type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.data).downcast::<T>().ok()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.type_hash)
    }
}

/// A compiled callable carried as a value (lambda results, callbacks).
///
/// The shape matches compiled accessors: a metadata context plus an
/// argument array.
#[derive(Clone)]
pub struct Delegate {
    body: Arc<dyn Fn(&Metadata, &[Value]) -> Result<Value, EvalError> + Send + Sync>,
    arity: usize,
}

impl Delegate {
    /// Wrap a callable with its expected argument count.
    pub fn new(
        arity: usize,
        body: Arc<dyn Fn(&Metadata, &[Value]) -> Result<Value, EvalError> + Send + Sync>,
    ) -> Self {
        Self { body, arity }
    }

    /// Number of arguments the callable expects.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Invoke the callable.
    pub fn invoke(&self, metadata: &Metadata, args: &[Value]) -> Result<Value, EvalError> {
        if args.len() != self.arity {
            return Err(EvalError::ArgumentCount {
                expected: self.arity,
                actual: args.len(),
            });
        }
        (self.body)(metadata, args)
    }
}

impl fmt::Debug for Delegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delegate(arity={})", self.arity)
    }
}
