//! Overload selection over resolved member candidates.
//!
//! Candidates are filtered by arity, run through generic inference, and
//! scored by summed conversion cost. Candidates with unresolved generics
//! rank below fully resolved ones. Ties break on exact-match count; a
//! tie that survives that is an error, never a first-found pick.

use std::sync::Arc;

use bindex_core::data_type::DataType;
use bindex_core::error::ResolveError;
use bindex_core::member::{MemberDescriptor, MemberFlags, MemberKind};
use bindex_core::type_hash::TypeHash;

use crate::conversion::find_conversion;
use crate::generics::{infer, GenericBindings};

/// A selected overload: the descriptor plus its substituted parameter
/// types, ready for argument conversion.
#[derive(Debug, Clone)]
pub struct OverloadMatch {
    pub descriptor: Arc<MemberDescriptor>,
    pub params: Vec<DataType>,
    pub return_type: DataType,
    pub bindings: GenericBindings,
    pub cost: u32,
    pub exact: usize,
    pub has_unresolved: bool,
}

/// Pick the best candidate for the given argument types.
pub fn resolve_overload(
    candidates: &[Arc<MemberDescriptor>],
    arg_types: &[DataType],
    explicit_type_args: &[DataType],
    member_name: &str,
    receiver: TypeHash,
) -> Result<OverloadMatch, ResolveError> {
    let mut viable: Vec<OverloadMatch> = Vec::new();
    let mut inference_failed = false;

    for candidate in candidates {
        // Extension methods declare the receiver as their first parameter;
        // call sites never pass it explicitly.
        let is_extension = candidate.flags.contains(MemberFlags::EXTENSION);
        let declared = if is_extension {
            candidate.params.get(1..).unwrap_or(&[])
        } else {
            candidate.params.as_slice()
        };
        if candidate.kind != MemberKind::Method || declared.len() != arg_types.len() {
            continue;
        }

        let bindings = if candidate.generic_params.is_empty() {
            GenericBindings::default()
        } else {
            let infer_args: Vec<DataType> = if is_extension {
                std::iter::once(DataType::Concrete(receiver))
                    .chain(arg_types.iter().cloned())
                    .collect()
            } else {
                arg_types.to_vec()
            };
            match infer(candidate, &infer_args, explicit_type_args) {
                Some(bindings) => bindings,
                None => {
                    inference_failed = true;
                    continue;
                }
            }
        };

        let params: Vec<DataType> = declared
            .iter()
            .map(|p| bindings.substitute(&p.ty))
            .collect();
        let has_unresolved = params.iter().any(DataType::contains_generic);

        let mut cost = 0u32;
        let mut exact = 0usize;
        let mut ok = true;
        for (arg, param) in arg_types.iter().zip(&params) {
            match find_conversion(arg, param) {
                Some(0) => exact += 1,
                Some(step) => cost += step,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }

        let return_type = bindings.substitute(&candidate.value_type);
        viable.push(OverloadMatch {
            descriptor: Arc::clone(candidate),
            params,
            return_type,
            bindings,
            cost,
            exact,
            has_unresolved,
        });
    }

    if viable.is_empty() {
        if inference_failed {
            return Err(ResolveError::GenericInference {
                member: member_name.to_owned(),
                param: "T".to_owned(),
            });
        }
        return Err(ResolveError::InvalidMember {
            member: member_name.to_owned(),
            ty: receiver,
        });
    }

    find_best_match(viable, member_name, receiver)
}

fn find_best_match(
    mut viable: Vec<OverloadMatch>,
    member_name: &str,
    receiver: TypeHash,
) -> Result<OverloadMatch, ResolveError> {
    // Resolved generics beat placeholders regardless of cost.
    if viable.iter().any(|m| !m.has_unresolved) {
        viable.retain(|m| !m.has_unresolved);
    }

    let best_cost = viable.iter().map(|m| m.cost).min().unwrap_or(0);
    viable.retain(|m| m.cost == best_cost);
    let best_exact = viable.iter().map(|m| m.exact).max().unwrap_or(0);
    viable.retain(|m| m.exact == best_exact);

    match viable.len() {
        1 => Ok(viable.pop().unwrap()),
        count => Err(ResolveError::AmbiguousMatch {
            member: member_name.to_owned(),
            ty: receiver,
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindex_core::member::{GenericParam, Invoker, ParamInfo};
    use bindex_core::type_hash::primitives;
    use bindex_core::value::Value;

    fn invoker() -> Invoker {
        Arc::new(|_, _, _| Ok(Value::Null))
    }

    fn int() -> DataType {
        DataType::concrete(primitives::I32)
    }

    fn double() -> DataType {
        DataType::concrete(primitives::F64)
    }

    fn method(params: Vec<DataType>) -> Arc<MemberDescriptor> {
        Arc::new(MemberDescriptor::method(
            "Max",
            TypeHash::EMPTY,
            params.first().cloned().unwrap_or(DataType::Void),
            params
                .into_iter()
                .enumerate()
                .map(|(i, ty)| ParamInfo::new(format!("p{i}"), ty))
                .collect(),
            invoker(),
        ))
    }

    fn candidates() -> Vec<Arc<MemberDescriptor>> {
        vec![
            method(vec![int(), int()]),
            method(vec![double(), double()]),
            method(vec![DataType::Object, DataType::Object]),
        ]
    }

    #[test]
    fn exact_integer_arguments_pick_the_integer_overload() {
        let chosen = resolve_overload(
            &candidates(),
            &[int(), int()],
            &[],
            "Max",
            TypeHash::EMPTY,
        )
        .unwrap();
        assert_eq!(chosen.params, vec![int(), int()]);
        assert_eq!(chosen.cost, 0);
    }

    #[test]
    fn mixed_arguments_widen_to_the_float_overload() {
        let chosen = resolve_overload(
            &candidates(),
            &[double(), int()],
            &[],
            "Max",
            TypeHash::EMPTY,
        )
        .unwrap();
        assert_eq!(chosen.params, vec![double(), double()]);
    }

    #[test]
    fn unrelated_arguments_fall_through_to_object() {
        let chosen = resolve_overload(
            &candidates(),
            &[
                DataType::concrete(primitives::STRING),
                DataType::concrete(primitives::BOOL),
            ],
            &[],
            "Max",
            TypeHash::EMPTY,
        )
        .unwrap();
        assert_eq!(chosen.params, vec![DataType::Object, DataType::Object]);
    }

    #[test]
    fn arity_filters_before_scoring() {
        let cands = vec![method(vec![int()]), method(vec![int(), int()])];
        let chosen =
            resolve_overload(&cands, &[int()], &[], "Max", TypeHash::EMPTY).unwrap();
        assert_eq!(chosen.params.len(), 1);
    }

    #[test]
    fn equal_scores_are_ambiguous_not_first_found() {
        let cands = vec![
            method(vec![int(), double()]),
            method(vec![double(), int()]),
        ];
        let err = resolve_overload(
            &cands,
            &[int(), int()],
            &[],
            "Max",
            TypeHash::EMPTY,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousMatch { count: 2, .. }));
    }

    #[test]
    fn resolved_generics_beat_placeholders() {
        let generic = Arc::new(
            MemberDescriptor::method(
                "Echo",
                TypeHash::EMPTY,
                DataType::Generic(0),
                vec![
                    ParamInfo::new("a", DataType::Generic(0)),
                    ParamInfo::new("b", DataType::Object),
                ],
                invoker(),
            )
            .with_generics(vec![GenericParam::new("T")]),
        );
        // The generic binds from the argument, so it resolves and wins
        // over nothing; with an untyped argument it stays a placeholder.
        let resolved = resolve_overload(
            &[Arc::clone(&generic)],
            &[int(), DataType::Object],
            &[],
            "Echo",
            TypeHash::EMPTY,
        )
        .unwrap();
        assert!(!resolved.has_unresolved);
        assert_eq!(resolved.return_type, int());

        let placeholder = resolve_overload(
            &[generic],
            &[DataType::Object, DataType::Object],
            &[],
            "Echo",
            TypeHash::EMPTY,
        )
        .unwrap();
        assert!(placeholder.has_unresolved);
    }

    #[test]
    fn explicit_type_argument_resolves_the_return() {
        let generic = Arc::new(
            MemberDescriptor::method(
                "Parse",
                TypeHash::EMPTY,
                DataType::Generic(0),
                vec![ParamInfo::new("text", DataType::concrete(primitives::STRING))],
                invoker(),
            )
            .with_generics(vec![GenericParam::new("T")]),
        );
        let chosen = resolve_overload(
            &[generic],
            &[DataType::concrete(primitives::STRING)],
            &[double()],
            "Parse",
            TypeHash::EMPTY,
        )
        .unwrap();
        assert_eq!(chosen.return_type, double());
    }
}
