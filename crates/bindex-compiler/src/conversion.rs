//! The conversion cost table shared by operator promotion and overload
//! scoring.
//!
//! Costs order candidate quality: identity beats widening, widening
//! beats crossing into floats, crossing beats narrowing, and boxing into
//! an untyped object loses to everything else. The same table drives
//! runtime value conversion so a selected overload always receives the
//! types it was scored against.

use bindex_core::data_type::DataType;
use bindex_core::error::EvalError;
use bindex_core::type_hash::{primitives, TypeHash};
use bindex_core::value::Value;

pub const COST_IDENTITY: u32 = 0;
/// Same-kind numeric widening, plus one per step of distance.
pub const COST_WIDENING: u32 = 10;
/// Integer to float, plus distance.
pub const COST_INT_TO_FLOAT: u32 = 60;
/// Lossy numeric conversion.
pub const COST_NARROWING: u32 = 200;
/// Target is an unresolved generic placeholder.
pub const COST_GENERIC: u32 = 500;
/// Anything into the untyped object. Loses to any typed route.
pub const COST_BOXING: u32 = 1000;

/// Widening rank inside the signed chain; unsigned types join one size
/// up, which keeps their full range representable.
fn integer_rank(hash: TypeHash) -> Option<u32> {
    use primitives::*;
    match hash {
        I8 => Some(0),
        U8 | I16 => Some(1),
        U16 | I32 => Some(2),
        U32 | I64 => Some(3),
        U64 => Some(4),
        _ => None,
    }
}

fn is_signed(hash: TypeHash) -> bool {
    use primitives::*;
    matches!(hash, I8 | I16 | I32 | I64)
}

fn is_unsigned(hash: TypeHash) -> bool {
    use primitives::*;
    matches!(hash, U8 | U16 | U32 | U64)
}

fn float_rank(hash: TypeHash) -> Option<u32> {
    use primitives::*;
    match hash {
        F32 => Some(0),
        F64 => Some(1),
        _ => None,
    }
}

pub fn is_integer(hash: TypeHash) -> bool {
    is_signed(hash) || is_unsigned(hash)
}

pub fn is_float(hash: TypeHash) -> bool {
    float_rank(hash).is_some()
}

pub fn is_numeric(hash: TypeHash) -> bool {
    is_integer(hash) || is_float(hash)
}

/// Cost of converting between two primitive types, if a route exists.
pub fn primitive_conversion_cost(from: TypeHash, to: TypeHash) -> Option<u32> {
    if from == to {
        return Some(COST_IDENTITY);
    }

    if let (Some(f), Some(t)) = (integer_rank(from), integer_rank(to)) {
        // Same-rank pairs (u8/i16 and friends) widen unsigned-to-signed
        // and narrow the other way. Signed into unsigned always narrows:
        // no unsigned type holds a negative.
        let widens = (t > f || (t == f && is_unsigned(from) && is_signed(to)))
            && !(is_signed(from) && is_unsigned(to));
        return Some(if widens {
            COST_WIDENING + (t - f)
        } else {
            COST_NARROWING + f.abs_diff(t)
        });
    }
    if let (Some(f), Some(t)) = (float_rank(from), float_rank(to)) {
        return Some(if t > f {
            COST_WIDENING + (t - f)
        } else {
            COST_NARROWING
        });
    }
    if integer_rank(from).is_some() && float_rank(to).is_some() {
        return Some(COST_INT_TO_FLOAT + (1 - float_rank(to).unwrap()));
    }
    if float_rank(from).is_some() && integer_rank(to).is_some() {
        return Some(COST_NARROWING + 50);
    }
    None
}

/// Cost of converting a value of type `from` into a parameter of type
/// `to`. `None` means no route exists and the candidate is not viable.
pub fn find_conversion(from: &DataType, to: &DataType) -> Option<u32> {
    if from == to {
        return Some(COST_IDENTITY);
    }
    match to {
        DataType::Object => Some(COST_BOXING),
        DataType::Generic(_) => Some(COST_GENERIC),
        DataType::Concrete(to_hash) => match from {
            DataType::Concrete(from_hash) => primitive_conversion_cost(*from_hash, *to_hash),
            // An untyped source defers the check to runtime.
            DataType::Object => Some(COST_BOXING),
            _ => None,
        },
        DataType::Array(to_inner) => match from {
            DataType::Array(from_inner) if from_inner == to_inner => Some(COST_IDENTITY),
            DataType::Array(from_inner) => {
                find_conversion(from_inner, to_inner).map(|c| c + COST_WIDENING)
            }
            DataType::Object => Some(COST_BOXING),
            _ => None,
        },
        DataType::Container { base, args } => match from {
            DataType::Container {
                base: from_base,
                args: from_args,
            } if from_base == base && from_args.len() == args.len() => {
                let mut total = 0;
                for (f, t) in from_args.iter().zip(args) {
                    total += find_conversion(f, t)?;
                }
                Some(total)
            }
            DataType::Object => Some(COST_BOXING),
            _ => None,
        },
        DataType::Void => None,
    }
}

/// Convert a runtime value to the given type. Narrowing truncates the
/// way an unchecked cast would.
pub fn convert_value(value: Value, to: &DataType) -> Result<Value, EvalError> {
    let from = value.data_type();
    if from == *to {
        return Ok(value);
    }
    let err = |from: DataType, to: &DataType| EvalError::Conversion {
        from,
        to: to.clone(),
    };
    match to {
        // Values are uniformly represented; boxing is a no-op.
        DataType::Object | DataType::Generic(_) | DataType::Array(_)
        | DataType::Container { .. } => Ok(value),
        DataType::Concrete(hash) => {
            use primitives::*;
            if value.is_null() {
                return Ok(value);
            }
            let converted = match *hash {
                I8 => numeric_lane(&value).map(|n| Value::I8(n.as_i64() as i8)),
                I16 => numeric_lane(&value).map(|n| Value::I16(n.as_i64() as i16)),
                I32 => numeric_lane(&value).map(|n| Value::I32(n.as_i64() as i32)),
                I64 => numeric_lane(&value).map(|n| Value::I64(n.as_i64())),
                U8 => numeric_lane(&value).map(|n| Value::U8(n.as_i64() as u8)),
                U16 => numeric_lane(&value).map(|n| Value::U16(n.as_i64() as u16)),
                U32 => numeric_lane(&value).map(|n| Value::U32(n.as_i64() as u32)),
                U64 => numeric_lane(&value).map(|n| Value::U64(n.as_u64())),
                F32 => numeric_lane(&value).map(|n| Value::F32(n.as_f64() as f32)),
                F64 => numeric_lane(&value).map(|n| Value::F64(n.as_f64())),
                STRING => Some(Value::string(value.to_string())),
                _ => None,
            };
            converted.ok_or_else(|| err(from, to))
        }
        DataType::Void => Err(err(from, to)),
    }
}

/// A numeric value viewed through integer and float lanes.
pub enum NumericLane {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl NumericLane {
    pub fn as_i64(&self) -> i64 {
        match *self {
            NumericLane::Int(v) => v,
            NumericLane::UInt(v) => v as i64,
            NumericLane::Float(v) => v as i64,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match *self {
            NumericLane::Int(v) => v as u64,
            NumericLane::UInt(v) => v,
            NumericLane::Float(v) => v as u64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            NumericLane::Int(v) => v as f64,
            NumericLane::UInt(v) => v as f64,
            NumericLane::Float(v) => v,
        }
    }
}

pub fn numeric_lane(value: &Value) -> Option<NumericLane> {
    match *value {
        Value::I8(v) => Some(NumericLane::Int(v as i64)),
        Value::I16(v) => Some(NumericLane::Int(v as i64)),
        Value::I32(v) => Some(NumericLane::Int(v as i64)),
        Value::I64(v) => Some(NumericLane::Int(v)),
        Value::U8(v) => Some(NumericLane::UInt(v as u64)),
        Value::U16(v) => Some(NumericLane::UInt(v as u64)),
        Value::U32(v) => Some(NumericLane::UInt(v as u64)),
        Value::U64(v) => Some(NumericLane::UInt(v)),
        Value::F32(v) => Some(NumericLane::Float(v as f64)),
        Value::F64(v) => Some(NumericLane::Float(v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(hash: TypeHash) -> DataType {
        DataType::Concrete(hash)
    }

    #[test]
    fn identity_beats_widening_beats_crossing() {
        use primitives::*;
        let identity = find_conversion(&ty(I32), &ty(I32)).unwrap();
        let widen = find_conversion(&ty(I32), &ty(I64)).unwrap();
        let cross = find_conversion(&ty(I32), &ty(F64)).unwrap();
        let narrow = find_conversion(&ty(I64), &ty(I32)).unwrap();
        let boxed = find_conversion(&ty(I32), &DataType::Object).unwrap();
        assert!(identity < widen);
        assert!(widen < cross);
        assert!(cross < narrow);
        assert!(narrow < boxed);
    }

    #[test]
    fn distance_ranks_widening() {
        use primitives::*;
        let near = find_conversion(&ty(I32), &ty(I64)).unwrap();
        let far = find_conversion(&ty(I8), &ty(I64)).unwrap();
        assert!(near < far);
    }

    #[test]
    fn unsigned_joins_one_size_up() {
        use primitives::*;
        let up = primitive_conversion_cost(U8, I16).unwrap();
        assert!(up >= COST_WIDENING && up < COST_NARROWING);
        let down = primitive_conversion_cost(I16, U8).unwrap();
        assert!(down >= COST_NARROWING);
        assert!(primitive_conversion_cost(I64, U64).unwrap() >= COST_NARROWING);
    }

    #[test]
    fn no_route_between_unrelated_types() {
        use primitives::*;
        assert!(find_conversion(&ty(BOOL), &ty(I32)).is_none());
        assert!(find_conversion(&ty(STRING), &ty(F64)).is_none());
        let custom = DataType::Concrete(TypeHash::from_name("Player"));
        assert!(find_conversion(&custom, &ty(I32)).is_none());
        assert_eq!(
            find_conversion(&custom, &DataType::Object),
            Some(COST_BOXING)
        );
    }

    #[test]
    fn runtime_conversion_follows_the_table() {
        use primitives::*;
        assert_eq!(
            convert_value(Value::I32(7), &ty(F64)).unwrap(),
            Value::F64(7.0)
        );
        assert_eq!(
            convert_value(Value::F64(1.9), &ty(I32)).unwrap(),
            Value::I32(1)
        );
        assert_eq!(
            convert_value(Value::U8(200), &ty(I16)).unwrap(),
            Value::I16(200)
        );
        assert!(convert_value(Value::TRUE, &ty(I32)).is_err());
    }
}
