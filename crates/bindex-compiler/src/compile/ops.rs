//! Direct primitive operations for compiled binary and unary nodes.
//!
//! Operands promote through the same widening table the overload scorer
//! uses: small integers compute as 32-bit, mixed signedness widens, any
//! float pulls the pair into float math. Short-circuiting forms (`&&`,
//! `||`, `??`, `?.`) never reach this module.

use bindex_core::data_type::DataType;
use bindex_core::error::EvalError;
use bindex_core::token_type::{BinaryTokenType, UnaryTokenType};
use bindex_core::type_hash::{primitives, TypeHash};
use bindex_core::value::Value;

use crate::conversion::{is_float, is_integer, is_numeric, numeric_lane, NumericLane};

/// The numeric type a pair of operands computes in.
fn promote_hash(left: TypeHash, right: TypeHash) -> Option<TypeHash> {
    use primitives::*;
    if !is_numeric(left) || !is_numeric(right) {
        return None;
    }
    if left == F64 || right == F64 {
        return Some(F64);
    }
    if left == F32 || right == F32 {
        return Some(F32);
    }
    // Integers: everything below 32 bits computes as i32.
    let step = |h: TypeHash| match h {
        I8 | I16 | U8 | U16 | I32 => I32,
        other => other,
    };
    let (l, r) = (step(left), step(right));
    Some(match (l, r) {
        (a, b) if a == b => a,
        (I32, U32) | (U32, I32) => I64,
        (I32, I64) | (I64, I32) | (U32, I64) | (I64, U32) => I64,
        (U32, U64) | (U64, U32) => U64,
        // A signed/u64 mix has no common integer; compute signed.
        _ => I64,
    })
}

/// Static result type of a binary operation, `Object` when an operand
/// type is unknown until runtime.
pub fn binary_result_type(token: &BinaryTokenType, left: &DataType, right: &DataType) -> DataType {
    use primitives::*;
    match token.symbol {
        "<" | ">" | "<=" | ">=" | "==" | "!=" | "&&" | "||" => DataType::Concrete(BOOL),
        "??" => {
            if left == right {
                left.clone()
            } else {
                DataType::Object
            }
        }
        "+" if left == &DataType::Concrete(STRING) || right == &DataType::Concrete(STRING) => {
            DataType::Concrete(STRING)
        }
        "<<" | ">>" => match left.type_hash() {
            Some(hash) if is_integer(hash) => {
                DataType::Concrete(promote_hash(hash, I32).unwrap_or(I32))
            }
            _ => DataType::Object,
        },
        _ => match (left.type_hash(), right.type_hash()) {
            (Some(l), Some(r)) => promote_hash(l, r)
                .map(DataType::Concrete)
                .unwrap_or(DataType::Object),
            _ => DataType::Object,
        },
    }
}

pub fn unary_result_type(token: &UnaryTokenType, operand: &DataType) -> DataType {
    use primitives::*;
    match token.symbol {
        "!" => DataType::Concrete(BOOL),
        "-" | "+" | "~" => match operand.type_hash() {
            Some(hash) if is_numeric(hash) => {
                DataType::Concrete(promote_hash(hash, I32).unwrap_or(hash))
            }
            _ => DataType::Object,
        },
        _ => DataType::Object,
    }
}

fn invalid(op: &str) -> EvalError {
    EvalError::InvalidOperand { op: op.to_owned() }
}

/// Rebuild a value of the promoted kind from an i64/u64/f64 lane result.
fn with_kind(kind: TypeHash, int: i64, float: f64) -> Value {
    use primitives::*;
    match kind {
        I32 => Value::I32(int as i32),
        I64 => Value::I64(int),
        U32 => Value::U32(int as u32),
        U64 => Value::U64(int as u64),
        F32 => Value::F32(float as f32),
        F64 => Value::F64(float),
        _ => Value::I64(int),
    }
}

struct Promoted {
    kind: TypeHash,
    left: NumericLane,
    right: NumericLane,
}

fn promote(op: &str, left: &Value, right: &Value) -> Result<Promoted, EvalError> {
    let kind = promote_hash(left.type_hash(), right.type_hash()).ok_or_else(|| invalid(op))?;
    Ok(Promoted {
        kind,
        left: numeric_lane(left).ok_or_else(|| invalid(op))?,
        right: numeric_lane(right).ok_or_else(|| invalid(op))?,
    })
}

/// Apply a non-short-circuiting binary operator to two runtime values.
pub fn apply_binary(token: &BinaryTokenType, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let op = token.symbol;
    match op {
        "+" => {
            if let (Value::Str(_), _) | (_, Value::Str(_)) = (left, right) {
                return Ok(Value::string(format!("{left}{right}")));
            }
            arithmetic(op, left, right)
        }
        "-" | "*" | "/" | "%" => arithmetic(op, left, right),
        "<<" | ">>" => shift(op, left, right),
        "&" | "^" | "|" => bitwise(op, left, right),
        "<" | ">" | "<=" | ">=" => compare(op, left, right),
        "==" => Ok(Value::Bool(values_equal(left, right))),
        "!=" => Ok(Value::Bool(!values_equal(left, right))),
        _ => Err(invalid(op)),
    }
}

fn arithmetic(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let p = promote(op, left, right)?;
    if is_float(p.kind) {
        let (l, r) = (p.left.as_f64(), p.right.as_f64());
        let out = match op {
            "+" => l + r,
            "-" => l - r,
            "*" => l * r,
            "/" => l / r,
            "%" => l % r,
            _ => unreachable!(),
        };
        return Ok(with_kind(p.kind, 0, out));
    }
    let (l, r) = (p.left.as_i64(), p.right.as_i64());
    if matches!(op, "/" | "%") && r == 0 {
        return Err(EvalError::Invocation("division by zero".into()));
    }
    let out = match op {
        "+" => l.wrapping_add(r),
        "-" => l.wrapping_sub(r),
        "*" => l.wrapping_mul(r),
        "/" => l.wrapping_div(r),
        "%" => l.wrapping_rem(r),
        _ => unreachable!(),
    };
    Ok(with_kind(p.kind, out, 0.0))
}

fn shift(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let p = promote(op, left, right)?;
    if is_float(p.kind) {
        return Err(invalid(op));
    }
    let amount = (p.right.as_i64() as u32) & 63;
    let l = p.left.as_i64();
    let out = match op {
        "<<" => l.wrapping_shl(amount),
        ">>" => l.wrapping_shr(amount),
        _ => unreachable!(),
    };
    // Shift results take the left operand's promoted kind.
    let kind = promote_hash(left.type_hash(), primitives::I32).unwrap_or(primitives::I64);
    Ok(with_kind(kind, out, 0.0))
}

fn bitwise(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::Bool(l), Value::Bool(r)) = (left, right) {
        return Ok(Value::Bool(match op {
            "&" => l & r,
            "^" => l ^ r,
            "|" => l | r,
            _ => unreachable!(),
        }));
    }
    let p = promote(op, left, right)?;
    if is_float(p.kind) {
        return Err(invalid(op));
    }
    let (l, r) = (p.left.as_i64(), p.right.as_i64());
    let out = match op {
        "&" => l & r,
        "^" => l ^ r,
        "|" => l | r,
        _ => unreachable!(),
    };
    Ok(with_kind(p.kind, out, 0.0))
}

fn compare(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Str(l), Value::Str(r)) => l.cmp(r),
        _ => {
            let p = promote(op, left, right)?;
            if is_float(p.kind) {
                p.left
                    .as_f64()
                    .partial_cmp(&p.right.as_f64())
                    .ok_or_else(|| invalid(op))?
            } else {
                p.left.as_i64().cmp(&p.right.as_i64())
            }
        }
    };
    Ok(Value::Bool(match op {
        "<" => ordering.is_lt(),
        ">" => ordering.is_gt(),
        "<=" => ordering.is_le(),
        ">=" => ordering.is_ge(),
        _ => unreachable!(),
    }))
}

/// Equality across numeric kinds compares by value; everything else
/// falls back to structural equality.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    match (numeric_lane(left), numeric_lane(right)) {
        (Some(l), Some(r)) => {
            if matches!(l, NumericLane::Float(_)) || matches!(r, NumericLane::Float(_)) {
                l.as_f64() == r.as_f64()
            } else {
                l.as_i64() == r.as_i64()
            }
        }
        _ => false,
    }
}

/// Apply a prefix operator. Resource macros never reach this.
pub fn apply_unary(token: &UnaryTokenType, operand: &Value) -> Result<Value, EvalError> {
    let op = token.symbol;
    match op {
        "!" => match operand {
            Value::Bool(v) => Ok(Value::Bool(!v)),
            _ => Err(EvalError::NotBool),
        },
        "-" => match operand {
            Value::F32(v) => Ok(Value::F32(-v)),
            Value::F64(v) => Ok(Value::F64(-v)),
            _ => {
                let lane = numeric_lane(operand).ok_or_else(|| invalid(op))?;
                let kind = promote_hash(operand.type_hash(), primitives::I32)
                    .unwrap_or(primitives::I64);
                Ok(with_kind(kind, lane.as_i64().wrapping_neg(), 0.0))
            }
        },
        "+" => {
            numeric_lane(operand).ok_or_else(|| invalid(op))?;
            Ok(operand.clone())
        }
        "~" => {
            let lane = numeric_lane(operand).ok_or_else(|| invalid(op))?;
            if matches!(lane, NumericLane::Float(_)) {
                return Err(invalid(op));
            }
            let kind =
                promote_hash(operand.type_hash(), primitives::I32).unwrap_or(primitives::I64);
            Ok(with_kind(kind, !lane.as_i64(), 0.0))
        }
        _ => Err(invalid(op)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindex_core::token_type::{binary_tokens, unary_tokens};

    #[test]
    fn integer_arithmetic_stays_i32() {
        let out = apply_binary(&binary_tokens::ADD, &Value::I32(2), &Value::I32(3)).unwrap();
        assert_eq!(out, Value::I32(5));
        let out =
            apply_binary(&binary_tokens::REMAINDER, &Value::I32(7), &Value::I32(3)).unwrap();
        assert_eq!(out, Value::I32(1));
    }

    #[test]
    fn float_pulls_the_pair_into_float_math() {
        let out = apply_binary(&binary_tokens::DIVIDE, &Value::I32(7), &Value::F64(2.0)).unwrap();
        assert_eq!(out, Value::F64(3.5));
    }

    #[test]
    fn string_concatenation() {
        let out = apply_binary(
            &binary_tokens::ADD,
            &Value::string("age: "),
            &Value::I32(4),
        )
        .unwrap();
        assert_eq!(out, Value::string("age: 4"));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(apply_binary(&binary_tokens::DIVIDE, &Value::I32(1), &Value::I32(0)).is_err());
    }

    #[test]
    fn cross_kind_equality() {
        assert!(values_equal(&Value::I32(3), &Value::I64(3)));
        assert!(values_equal(&Value::F64(3.0), &Value::I32(3)));
        assert!(!values_equal(&Value::string("3"), &Value::I32(3)));
        let out =
            apply_binary(&binary_tokens::EQUAL, &Value::U8(7), &Value::I32(7)).unwrap();
        assert_eq!(out, Value::TRUE);
    }

    #[test]
    fn comparisons_and_logic_need_the_right_kinds() {
        let out = apply_binary(&binary_tokens::LESS, &Value::I32(1), &Value::F64(1.5)).unwrap();
        assert_eq!(out, Value::TRUE);
        assert!(apply_binary(&binary_tokens::LESS, &Value::TRUE, &Value::I32(1)).is_err());
        assert!(apply_unary(&unary_tokens::NOT, &Value::I32(1)).is_err());
        assert_eq!(
            apply_unary(&unary_tokens::NOT, &Value::TRUE).unwrap(),
            Value::FALSE
        );
    }

    #[test]
    fn negation_promotes_small_integers() {
        assert_eq!(
            apply_unary(&unary_tokens::MINUS, &Value::I8(5)).unwrap(),
            Value::I32(-5)
        );
        assert_eq!(
            apply_unary(&unary_tokens::MINUS, &Value::F64(2.5)).unwrap(),
            Value::F64(-2.5)
        );
    }

    #[test]
    fn static_result_types() {
        use bindex_core::type_hash::primitives::*;
        let i32_ty = DataType::Concrete(I32);
        let f64_ty = DataType::Concrete(F64);
        assert_eq!(
            binary_result_type(&binary_tokens::ADD, &i32_ty, &f64_ty),
            f64_ty
        );
        assert_eq!(
            binary_result_type(&binary_tokens::LESS, &i32_ty, &f64_ty),
            DataType::Concrete(BOOL)
        );
        assert_eq!(
            binary_result_type(&binary_tokens::ADD, &DataType::Object, &i32_ty),
            DataType::Object
        );
    }
}
