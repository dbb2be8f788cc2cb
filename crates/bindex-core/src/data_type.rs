//! Static type shape of expression operands and member signatures.
//!
//! [`DataType`] describes what the compiler knows about a value before
//! invocation: a concrete registered type, the statically-unknown `Object`,
//! a generic parameter slot awaiting inference, or an array/container of
//! those. Conversions and overload scoring operate on these shapes.

use std::fmt;

use crate::type_hash::{TypeHash, primitive_name, primitives};

/// The static type of an expression or signature slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// No value (method with no return).
    Void,
    /// Statically unknown; any runtime value is acceptable.
    Object,
    /// A concrete type identified by hash.
    Concrete(TypeHash),
    /// An unresolved generic parameter, by declaration index.
    Generic(u8),
    /// A homogeneous array of the element type.
    Array(Box<DataType>),
    /// A generic container instantiation, e.g. `List<T>`.
    Container {
        base: TypeHash,
        args: Vec<DataType>,
    },
}

impl DataType {
    /// Shorthand for a concrete type.
    #[inline]
    pub fn concrete(hash: TypeHash) -> Self {
        DataType::Concrete(hash)
    }

    /// The concrete hash, when this shape has one.
    pub fn type_hash(&self) -> Option<TypeHash> {
        match self {
            DataType::Concrete(hash) => Some(*hash),
            DataType::Container { base, .. } => Some(*base),
            _ => None,
        }
    }

    /// Whether this is a numeric primitive shape.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Concrete(
                primitives::I8
                    | primitives::I16
                    | primitives::I32
                    | primitives::I64
                    | primitives::U8
                    | primitives::U16
                    | primitives::U32
                    | primitives::U64
                    | primitives::F32
                    | primitives::F64
            )
        )
    }

    /// Whether this shape is a value type (numeric or bool).
    pub fn is_value_type(&self) -> bool {
        self.is_numeric() || matches!(self, DataType::Concrete(primitives::BOOL))
    }

    /// Whether this shape is a reference type (string, object, user type,
    /// array, or container).
    pub fn is_reference_type(&self) -> bool {
        match self {
            DataType::Object | DataType::Array(_) | DataType::Container { .. } => true,
            DataType::Concrete(hash) => {
                !self.is_value_type() && *hash != primitives::NULL && !hash.is_empty()
            }
            _ => false,
        }
    }

    /// Whether any generic parameter slot remains in this shape.
    pub fn contains_generic(&self) -> bool {
        match self {
            DataType::Generic(_) => true,
            DataType::Array(elem) => elem.contains_generic(),
            DataType::Container { args, .. } => args.iter().any(DataType::contains_generic),
            _ => false,
        }
    }

    /// Substitute generic slots using inferred bindings.
    ///
    /// Slots without a binding stay as placeholders; callers track that via
    /// [`DataType::contains_generic`] on the result.
    pub fn substitute(&self, bindings: &[Option<DataType>]) -> DataType {
        match self {
            DataType::Generic(index) => bindings
                .get(*index as usize)
                .and_then(|b| b.clone())
                .unwrap_or(DataType::Generic(*index)),
            DataType::Array(elem) => DataType::Array(Box::new(elem.substitute(bindings))),
            DataType::Container { base, args } => DataType::Container {
                base: *base,
                args: args.iter().map(|a| a.substitute(bindings)).collect(),
            },
            other => other.clone(),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Void => f.write_str("void"),
            DataType::Object => f.write_str("object"),
            DataType::Concrete(hash) => match primitive_name(*hash) {
                Some(name) => f.write_str(name),
                None => write!(f, "{hash}"),
            },
            DataType::Generic(index) => write!(f, "T{index}"),
            DataType::Array(elem) => write!(f, "{elem}[]"),
            DataType::Container { base, args } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_classification() {
        assert!(DataType::concrete(primitives::I32).is_numeric());
        assert!(DataType::concrete(primitives::F64).is_numeric());
        assert!(!DataType::concrete(primitives::BOOL).is_numeric());
        assert!(!DataType::Object.is_numeric());
    }

    #[test]
    fn reference_classification() {
        assert!(DataType::concrete(primitives::STRING).is_reference_type());
        assert!(DataType::Object.is_reference_type());
        assert!(DataType::concrete(TypeHash::from_name("Player")).is_reference_type());
        assert!(!DataType::concrete(primitives::I32).is_reference_type());
    }

    #[test]
    fn generic_detection_through_structure() {
        let nested = DataType::Array(Box::new(DataType::Generic(0)));
        assert!(nested.contains_generic());

        let container = DataType::Container {
            base: TypeHash::from_name("List"),
            args: vec![DataType::Generic(1)],
        };
        assert!(container.contains_generic());
        assert!(!DataType::concrete(primitives::I32).contains_generic());
    }

    #[test]
    fn substitution_fills_slots() {
        let shape = DataType::Array(Box::new(DataType::Generic(0)));
        let bound = shape.substitute(&[Some(DataType::concrete(primitives::F64))]);
        assert_eq!(
            bound,
            DataType::Array(Box::new(DataType::concrete(primitives::F64)))
        );

        // Unbound slot stays a placeholder.
        let unbound = shape.substitute(&[None]);
        assert!(unbound.contains_generic());
    }

    #[test]
    fn display_shapes() {
        assert_eq!(DataType::concrete(primitives::I32).to_string(), "i32");
        assert_eq!(
            DataType::Array(Box::new(DataType::concrete(primitives::F64))).to_string(),
            "f64[]"
        );
        assert_eq!(DataType::Generic(2).to_string(), "T2");
    }
}
