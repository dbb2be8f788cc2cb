//! Host-facing member registration.
//!
//! A type is registered once, as a whole, through [`TypeRegistration`];
//! after that its entry is immutable and shared. Methods may overload by
//! parameter list; duplicate signatures are rejected at registration, not
//! discovered at resolution.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use bindex_core::data_type::DataType;
use bindex_core::error::RegistrationError;
use bindex_core::member::{MemberDescriptor, MemberFlags, MemberKind};
use bindex_core::type_hash::{resolve_type_name, TypeHash};

/// An immutable registered type: its name and its members, overloads
/// grouped under one name.
#[derive(Debug)]
pub struct TypeEntry {
    pub name: String,
    pub type_hash: TypeHash,
    members: FxHashMap<String, Vec<Arc<MemberDescriptor>>>,
}

impl TypeEntry {
    pub fn members(&self, name: &str) -> &[Arc<MemberDescriptor>] {
        self.members.get(name).map_or(&[], Vec::as_slice)
    }
}

/// Builder for a type and all of its members.
#[derive(Debug)]
pub struct TypeRegistration {
    name: String,
    type_hash: TypeHash,
    members: FxHashMap<String, Vec<Arc<MemberDescriptor>>>,
}

impl TypeRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let type_hash = TypeHash::from_name(&name);
        Self {
            name,
            type_hash,
            members: FxHashMap::default(),
        }
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Add a member. Accessors (fields, properties, events) are unique
    /// by name; methods are unique by name plus parameter types.
    pub fn with_member(
        mut self,
        mut descriptor: MemberDescriptor,
    ) -> Result<Self, RegistrationError> {
        descriptor.declaring_type = self.type_hash;
        let overloads = self.members.entry(descriptor.name.clone()).or_default();

        let duplicate = overloads.iter().any(|existing| {
            if descriptor.kind != MemberKind::Method || existing.kind != MemberKind::Method {
                true
            } else {
                param_types(existing) == param_types(&descriptor)
            }
        });
        if duplicate {
            return Err(RegistrationError::DuplicateMember {
                ty: self.name.clone(),
                member: descriptor.name.clone(),
            });
        }

        overloads.push(Arc::new(descriptor));
        Ok(self)
    }
}

fn param_types(descriptor: &MemberDescriptor) -> Vec<&DataType> {
    descriptor.params.iter().map(|p| &p.ty).collect()
}

/// The process-wide registry of types and extension methods.
#[derive(Default)]
pub struct MemberRegistry {
    types: RwLock<FxHashMap<TypeHash, Arc<TypeEntry>>>,
    names: RwLock<FxHashMap<String, TypeHash>>,
    extensions: RwLock<FxHashMap<String, Vec<Arc<MemberDescriptor>>>>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a complete type. Fails without side effects when the
    /// name or hash is already taken.
    pub fn register(&self, registration: TypeRegistration) -> Result<TypeHash, RegistrationError> {
        let TypeRegistration {
            name,
            type_hash,
            members,
        } = registration;

        let mut types = self.types.write().unwrap();
        let mut names = self.names.write().unwrap();
        if types.contains_key(&type_hash) || names.contains_key(&name) {
            return Err(RegistrationError::DuplicateType(name));
        }
        names.insert(name.clone(), type_hash);
        types.insert(
            type_hash,
            Arc::new(TypeEntry {
                name,
                type_hash,
                members,
            }),
        );
        Ok(type_hash)
    }

    /// Register a free function as an extension method. Its first
    /// declared parameter is the receiver.
    pub fn register_extension(
        &self,
        mut descriptor: MemberDescriptor,
    ) -> Result<(), RegistrationError> {
        descriptor.flags |= MemberFlags::EXTENSION;
        let mut extensions = self.extensions.write().unwrap();
        let overloads = extensions.entry(descriptor.name.clone()).or_default();
        if overloads
            .iter()
            .any(|existing| param_types(existing) == param_types(&descriptor))
        {
            return Err(RegistrationError::DuplicateMember {
                ty: "<extension>".into(),
                member: descriptor.name,
            });
        }
        overloads.push(Arc::new(descriptor));
        Ok(())
    }

    pub fn entry(&self, type_hash: TypeHash) -> Option<Arc<TypeEntry>> {
        self.types.read().unwrap().get(&type_hash).cloned()
    }

    /// Members declared on a type under the given name.
    pub fn members_of(&self, type_hash: TypeHash, name: &str) -> Vec<Arc<MemberDescriptor>> {
        self.entry(type_hash)
            .map(|entry| entry.members(name).to_vec())
            .unwrap_or_default()
    }

    /// Extension methods under a name whose receiver accepts the type.
    pub fn extensions_for(&self, receiver: TypeHash, name: &str) -> Vec<Arc<MemberDescriptor>> {
        let extensions = self.extensions.read().unwrap();
        let Some(overloads) = extensions.get(name) else {
            return Vec::new();
        };
        overloads
            .iter()
            .filter(|d| receiver_accepts(d, receiver))
            .cloned()
            .collect()
    }

    /// Resolve a textual type name: well-known primitive spellings
    /// first, then registered type names.
    pub fn resolve_type(&self, name: &str) -> Option<TypeHash> {
        if let Some(hash) = resolve_type_name(name) {
            return Some(hash);
        }
        self.names.read().unwrap().get(name).copied()
    }

    pub fn type_name(&self, type_hash: TypeHash) -> Option<String> {
        self.entry(type_hash).map(|entry| entry.name.clone())
    }
}

fn receiver_accepts(descriptor: &MemberDescriptor, receiver: TypeHash) -> bool {
    match descriptor.params.first().map(|p| &p.ty) {
        Some(DataType::Concrete(hash)) => *hash == receiver,
        // An untyped or generic receiver takes anything.
        Some(DataType::Object) | Some(DataType::Generic(_)) => true,
        Some(DataType::Array(_)) | Some(DataType::Container { .. }) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindex_core::member::ParamInfo;
    use bindex_core::type_hash::primitives;
    use bindex_core::value::Value;

    fn getter() -> bindex_core::member::Getter {
        Arc::new(|_, _| Ok(Value::Null))
    }

    fn invoker() -> bindex_core::member::Invoker {
        Arc::new(|_, _, _| Ok(Value::Null))
    }

    fn int_ty() -> DataType {
        DataType::concrete(primitives::I32)
    }

    #[test]
    fn register_and_look_up() {
        let registry = MemberRegistry::new();
        let player = registry
            .register(
                TypeRegistration::new("Player")
                    .with_member(MemberDescriptor::property(
                        "Health",
                        TypeHash::EMPTY,
                        int_ty(),
                        getter(),
                        None,
                    ))
                    .unwrap(),
            )
            .unwrap();

        let members = registry.members_of(player, "Health");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].declaring_type, player);
        assert!(registry.members_of(player, "Missing").is_empty());
        assert_eq!(registry.resolve_type("Player"), Some(player));
        assert_eq!(registry.resolve_type("Int32"), Some(primitives::I32));
    }

    #[test]
    fn duplicate_type_rejected() {
        let registry = MemberRegistry::new();
        registry.register(TypeRegistration::new("Player")).unwrap();
        assert!(matches!(
            registry.register(TypeRegistration::new("Player")),
            Err(RegistrationError::DuplicateType(_))
        ));
    }

    #[test]
    fn method_overloads_allowed_same_signature_rejected() {
        let registration = TypeRegistration::new("Math")
            .with_member(MemberDescriptor::method(
                "Max",
                TypeHash::EMPTY,
                int_ty(),
                vec![ParamInfo::new("a", int_ty()), ParamInfo::new("b", int_ty())],
                invoker(),
            ))
            .unwrap()
            .with_member(MemberDescriptor::method(
                "Max",
                TypeHash::EMPTY,
                DataType::concrete(primitives::F64),
                vec![
                    ParamInfo::new("a", DataType::concrete(primitives::F64)),
                    ParamInfo::new("b", DataType::concrete(primitives::F64)),
                ],
                invoker(),
            ))
            .unwrap();

        let err = registration
            .with_member(MemberDescriptor::method(
                "Max",
                TypeHash::EMPTY,
                int_ty(),
                vec![ParamInfo::new("a", int_ty()), ParamInfo::new("b", int_ty())],
                invoker(),
            ))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateMember { .. }));
    }

    #[test]
    fn extensions_filter_by_receiver() {
        let registry = MemberRegistry::new();
        let player = registry.register(TypeRegistration::new("Player")).unwrap();
        let enemy = registry.register(TypeRegistration::new("Enemy")).unwrap();

        registry
            .register_extension(MemberDescriptor::method(
                "Describe",
                TypeHash::EMPTY,
                DataType::concrete(primitives::STRING),
                vec![ParamInfo::new("self", DataType::Concrete(player))],
                invoker(),
            ))
            .unwrap();

        assert_eq!(registry.extensions_for(player, "Describe").len(), 1);
        assert!(registry.extensions_for(enemy, "Describe").is_empty());
        assert!(registry.extensions_for(player, "Describe")[0]
            .flags
            .contains(MemberFlags::EXTENSION));
    }
}
