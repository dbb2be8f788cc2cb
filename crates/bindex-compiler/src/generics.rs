//! Generic parameter inference for method candidates.
//!
//! Parameter types are unified structurally against argument types,
//! through arrays and one level of generic containers. Explicit textual
//! type arguments pre-seed the bindings. An inferred type that violates
//! its constraint rejects the candidate; a parameter that stays unbound
//! leaves a placeholder and marks the candidate as weaker.

use bindex_core::data_type::DataType;
use bindex_core::member::{GenericConstraint, MemberDescriptor};

/// Bindings for a candidate's generic parameters, indexed by
/// declaration order.
#[derive(Debug, Clone, Default)]
pub struct GenericBindings {
    slots: Vec<Option<DataType>>,
}

impl GenericBindings {
    pub fn get(&self, index: u8) -> Option<&DataType> {
        self.slots.get(index as usize).and_then(Option::as_ref)
    }

    pub fn has_unresolved(&self) -> bool {
        self.slots.iter().any(Option::is_none)
    }

    /// Replace generic placeholders in a type with bound types.
    pub fn substitute(&self, ty: &DataType) -> DataType {
        ty.substitute(&self.slots)
    }
}

/// Infer bindings for one candidate. `None` rejects the candidate:
/// conflicting unifications or a violated constraint.
pub fn infer(
    descriptor: &MemberDescriptor,
    arg_types: &[DataType],
    explicit: &[DataType],
) -> Option<GenericBindings> {
    let mut bindings = GenericBindings {
        slots: vec![None; descriptor.generic_params.len()],
    };
    if explicit.len() > descriptor.generic_params.len() {
        return None;
    }
    for (slot, ty) in bindings.slots.iter_mut().zip(explicit) {
        *slot = Some(ty.clone());
    }

    for (param, arg) in descriptor.params.iter().zip(arg_types) {
        if !unify(&param.ty, arg, &mut bindings.slots) {
            return None;
        }
    }

    for (index, generic) in descriptor.generic_params.iter().enumerate() {
        if let Some(bound) = &bindings.slots[index] {
            if !satisfies(bound, generic.constraint) {
                return None;
            }
        }
    }
    Some(bindings)
}

fn unify(param: &DataType, arg: &DataType, slots: &mut [Option<DataType>]) -> bool {
    match (param, arg) {
        (DataType::Generic(index), arg) => {
            let Some(slot) = slots.get_mut(*index as usize) else {
                return false;
            };
            match slot {
                Some(bound) => bound == arg || *arg == DataType::Object,
                None => {
                    // An untyped argument teaches us nothing but does
                    // not conflict either.
                    if *arg != DataType::Object {
                        *slot = Some(arg.clone());
                    }
                    true
                }
            }
        }
        (DataType::Array(p), DataType::Array(a)) => unify(p, a, slots),
        (
            DataType::Container {
                base: pb,
                args: pa,
            },
            DataType::Container {
                base: ab,
                args: aa,
            },
        ) => {
            pb == ab
                && pa.len() == aa.len()
                && pa.iter().zip(aa).all(|(p, a)| unify(p, a, slots))
        }
        // Non-generic parameters carry no inference weight; viability is
        // the overload scorer's call.
        _ => true,
    }
}

fn satisfies(bound: &DataType, constraint: GenericConstraint) -> bool {
    match constraint {
        GenericConstraint::None => true,
        GenericConstraint::Reference => bound.is_reference_type() || *bound == DataType::Object,
        GenericConstraint::ValueType => bound.is_value_type(),
        GenericConstraint::Base(hash) => {
            *bound == DataType::Concrete(hash) || *bound == DataType::Object
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindex_core::member::{GenericParam, Invoker, MemberDescriptor, ParamInfo};
    use bindex_core::type_hash::{primitives, TypeHash};
    use bindex_core::value::Value;
    use std::sync::Arc;

    fn invoker() -> Invoker {
        Arc::new(|_, _, _| Ok(Value::Null))
    }

    fn generic_method(params: Vec<ParamInfo>, generics: Vec<GenericParam>) -> MemberDescriptor {
        MemberDescriptor::method(
            "First",
            TypeHash::EMPTY,
            DataType::Generic(0),
            params,
            invoker(),
        )
        .with_generics(generics)
    }

    #[test]
    fn infers_from_array_argument() {
        let m = generic_method(
            vec![ParamInfo::new(
                "items",
                DataType::Array(Box::new(DataType::Generic(0))),
            )],
            vec![GenericParam::new("T")],
        );
        let bindings = infer(
            &m,
            &[DataType::Array(Box::new(DataType::concrete(primitives::I32)))],
            &[],
        )
        .unwrap();
        assert_eq!(
            bindings.get(0),
            Some(&DataType::concrete(primitives::I32))
        );
        assert!(!bindings.has_unresolved());
        assert_eq!(
            bindings.substitute(&DataType::Generic(0)),
            DataType::concrete(primitives::I32)
        );
    }

    #[test]
    fn infers_through_one_container_level() {
        let list = TypeHash::from_name("List");
        let m = generic_method(
            vec![ParamInfo::new(
                "items",
                DataType::Container {
                    base: list,
                    args: vec![DataType::Generic(0)],
                },
            )],
            vec![GenericParam::new("T")],
        );
        let bindings = infer(
            &m,
            &[DataType::Container {
                base: list,
                args: vec![DataType::concrete(primitives::STRING)],
            }],
            &[],
        )
        .unwrap();
        assert_eq!(
            bindings.get(0),
            Some(&DataType::concrete(primitives::STRING))
        );
    }

    #[test]
    fn explicit_argument_preseeds_and_wins() {
        let m = generic_method(
            vec![ParamInfo::new("value", DataType::Generic(0))],
            vec![GenericParam::new("T")],
        );
        let bindings = infer(
            &m,
            &[DataType::Object],
            &[DataType::concrete(primitives::F64)],
        )
        .unwrap();
        assert_eq!(bindings.get(0), Some(&DataType::concrete(primitives::F64)));
    }

    #[test]
    fn conflicting_unification_rejects() {
        let m = generic_method(
            vec![
                ParamInfo::new("a", DataType::Generic(0)),
                ParamInfo::new("b", DataType::Generic(0)),
            ],
            vec![GenericParam::new("T")],
        );
        assert!(infer(
            &m,
            &[
                DataType::concrete(primitives::I32),
                DataType::concrete(primitives::STRING),
            ],
            &[],
        )
        .is_none());
    }

    #[test]
    fn constraints_reject_bad_bindings() {
        let m = generic_method(
            vec![ParamInfo::new("value", DataType::Generic(0))],
            vec![GenericParam::constrained("T", GenericConstraint::ValueType)],
        );
        assert!(infer(&m, &[DataType::concrete(primitives::I32)], &[]).is_some());
        assert!(infer(&m, &[DataType::concrete(primitives::STRING)], &[]).is_none());
    }

    #[test]
    fn untyped_argument_leaves_placeholder()
    {
        let m = generic_method(
            vec![ParamInfo::new("value", DataType::Generic(0))],
            vec![GenericParam::new("T")],
        );
        let bindings = infer(&m, &[DataType::Object], &[]).unwrap();
        assert!(bindings.has_unresolved());
    }
}
