//! Deterministic hash-based type identity.
//!
//! Provides [`TypeHash`], a 64-bit hash identifying every type that can flow
//! through a binding expression. Primitive types use reserved constants so
//! they can appear in `match` patterns; user types hash their registered
//! name with a domain-mixing constant, so the same name always yields the
//! same hash regardless of registration order.

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-mixing constants keeping type, member, and signature hashes
/// from colliding when they share a name.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for member hashes.
    pub const MEMBER: u64 = 0x7d3c8b4a92e15f6d;

    /// Separator constant mixed in per signature component.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;
}

/// A deterministic 64-bit hash identifying a runtime type.
///
/// Primitive hashes are reserved constants (see [`primitives`]); user type
/// hashes are computed from the registered name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a registered type name.
    ///
    /// Well-known primitive names resolve to their reserved constants so
    /// that `TypeHash::from_name("i32") == primitives::I32`.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        if let Some(primitive) = resolve_type_name(name) {
            return primitive;
        }
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a member hash from the owner type and member name.
    ///
    /// Used for cache slotting; overloads of the same member share a hash.
    #[inline]
    pub fn from_member(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::MEMBER ^ owner.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a signature hash from a name and parameter type hashes.
    ///
    /// Parameter order matters, so `(i32, f64)` and `(f64, i32)` differ.
    #[inline]
    pub fn from_signature(name: &str, params: &[TypeHash]) -> Self {
        let mut hash = hash_constants::MEMBER ^ xxh64(name.as_bytes(), 0);
        for param in params {
            hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(param.0);
        }
        TypeHash(hash)
    }

    /// Whether this is the empty/invalid hash.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match primitive_name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#018x}", self.0),
        }
    }
}

/// Reserved hashes for the primitive types.
///
/// These are constants rather than name-derived hashes so they can be used
/// in `match` patterns throughout the conversion and compilation code.
pub mod primitives {
    use super::TypeHash;

    pub const NULL: TypeHash = TypeHash(0xb1de_0000_0000_0001);
    pub const BOOL: TypeHash = TypeHash(0xb1de_0000_0000_0002);
    pub const I8: TypeHash = TypeHash(0xb1de_0000_0000_0003);
    pub const I16: TypeHash = TypeHash(0xb1de_0000_0000_0004);
    pub const I32: TypeHash = TypeHash(0xb1de_0000_0000_0005);
    pub const I64: TypeHash = TypeHash(0xb1de_0000_0000_0006);
    pub const U8: TypeHash = TypeHash(0xb1de_0000_0000_0007);
    pub const U16: TypeHash = TypeHash(0xb1de_0000_0000_0008);
    pub const U32: TypeHash = TypeHash(0xb1de_0000_0000_0009);
    pub const U64: TypeHash = TypeHash(0xb1de_0000_0000_000a);
    pub const F32: TypeHash = TypeHash(0xb1de_0000_0000_000b);
    pub const F64: TypeHash = TypeHash(0xb1de_0000_0000_000c);
    pub const STRING: TypeHash = TypeHash(0xb1de_0000_0000_000d);
    pub const OBJECT: TypeHash = TypeHash(0xb1de_0000_0000_000e);
    pub const DELEGATE: TypeHash = TypeHash(0xb1de_0000_0000_000f);
}

/// Resolve a textual type name to a primitive hash.
///
/// This is the type-resolver collaborator used by explicit generic
/// arguments (`Method<Double>(x)`). Accepts both the Rust spellings and
/// the CLR-style aliases the original binding syntax used.
pub fn resolve_type_name(name: &str) -> Option<TypeHash> {
    let hash = match name {
        "bool" | "Boolean" => primitives::BOOL,
        "i8" | "SByte" => primitives::I8,
        "i16" | "Int16" | "Short" => primitives::I16,
        "i32" | "Int32" | "Int" | "int" => primitives::I32,
        "i64" | "Int64" | "Long" | "long" => primitives::I64,
        "u8" | "Byte" | "byte" => primitives::U8,
        "u16" | "UInt16" => primitives::U16,
        "u32" | "UInt32" => primitives::U32,
        "u64" | "UInt64" => primitives::U64,
        "f32" | "Single" | "float" => primitives::F32,
        "f64" | "Double" | "Decimal" | "double" => primitives::F64,
        "string" | "String" | "str" => primitives::STRING,
        "object" | "Object" => primitives::OBJECT,
        _ => return None,
    };
    Some(hash)
}

/// Readable name for a primitive hash, if it is one.
pub fn primitive_name(hash: TypeHash) -> Option<&'static str> {
    let name = match hash {
        primitives::NULL => "null",
        primitives::BOOL => "bool",
        primitives::I8 => "i8",
        primitives::I16 => "i16",
        primitives::I32 => "i32",
        primitives::I64 => "i64",
        primitives::U8 => "u8",
        primitives::U16 => "u16",
        primitives::U32 => "u32",
        primitives::U64 => "u64",
        primitives::F32 => "f32",
        primitives::F64 => "f64",
        primitives::STRING => "string",
        primitives::OBJECT => "object",
        primitives::DELEGATE => "delegate",
        _ => return None,
    };
    Some(name)
}
