//! The resolution engine: provider chain + result cache.

use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;

use bindex_core::error::ResolveError;
use bindex_core::member::{MemberDescriptor, MemberRequest};
use bindex_core::metadata::Metadata;

use crate::providers::{
    AttachedMemberProvider, ExtensionMethodProvider, MemberProvider, RegistryMemberProvider,
};
use crate::registry::MemberRegistry;

/// Resolves member requests through an ordered provider chain, caching
/// hits for the process lifetime.
///
/// Failures are never cached: a member attached after a failed lookup is
/// found by the next attempt. Concurrent first lookups may both compute;
/// the first inserted slice wins and both callers observe it afterwards.
pub struct MemberResolver {
    providers: Vec<Arc<dyn MemberProvider>>,
    cache: Mutex<FxHashMap<MemberRequest, Arc<[Arc<MemberDescriptor>]>>>,
}

impl MemberResolver {
    pub fn new(providers: Vec<Arc<dyn MemberProvider>>) -> Self {
        Self {
            providers,
            cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// The standard chain: registry members, then attached members, then
    /// extension methods.
    pub fn with_registry(
        registry: Arc<MemberRegistry>,
        attached: Arc<AttachedMemberProvider>,
    ) -> Self {
        let providers: Vec<Arc<dyn MemberProvider>> = vec![
            Arc::new(RegistryMemberProvider::new(Arc::clone(&registry))),
            attached,
            Arc::new(ExtensionMethodProvider::new(registry)),
        ];
        Self::new(providers)
    }

    /// Resolve a request to its candidate set.
    ///
    /// Repeat lookups return the identical cached slice.
    pub fn resolve(
        &self,
        request: &MemberRequest,
        metadata: &Metadata,
    ) -> Result<Arc<[Arc<MemberDescriptor>]>, ResolveError> {
        if let Some(hit) = self.cache.lock().unwrap().get(request) {
            return Ok(Arc::clone(hit));
        }

        for provider in &self.providers {
            let mut candidates = provider.try_get_members(request, metadata);
            candidates.retain(|candidate| request.accepts(candidate));
            if candidates.is_empty() {
                continue;
            }
            let slice: Arc<[Arc<MemberDescriptor>]> = candidates.into();
            let mut cache = self.cache.lock().unwrap();
            let entry = cache
                .entry(request.clone())
                .or_insert_with(|| Arc::clone(&slice));
            return Ok(Arc::clone(entry));
        }

        Err(ResolveError::InvalidMember {
            member: request.name.clone(),
            ty: request.ty,
        })
    }

    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistration;
    use bindex_core::data_type::DataType;
    use bindex_core::member::{MemberFlags, MemberKinds};
    use bindex_core::type_hash::{primitives, TypeHash};
    use bindex_core::value::Value;

    fn getter(v: i32) -> bindex_core::member::Getter {
        Arc::new(move |_, _| Ok(Value::I32(v)))
    }

    fn setup() -> (Arc<MemberRegistry>, Arc<AttachedMemberProvider>, MemberResolver) {
        let registry = Arc::new(MemberRegistry::new());
        registry
            .register(
                TypeRegistration::new("Player")
                    .with_member(MemberDescriptor::property(
                        "Health",
                        TypeHash::EMPTY,
                        DataType::concrete(primitives::I32),
                        getter(100),
                        None,
                    ))
                    .unwrap(),
            )
            .unwrap();
        let attached = Arc::new(AttachedMemberProvider::new());
        let resolver = MemberResolver::with_registry(Arc::clone(&registry), Arc::clone(&attached));
        (registry, attached, resolver)
    }

    fn request(name: &str) -> MemberRequest {
        MemberRequest::new(
            TypeHash::from_name("Player"),
            MemberKinds::accessor(),
            MemberFlags::all_access(),
            name,
        )
    }

    #[test]
    fn repeat_lookups_share_the_cached_slice() {
        let (_registry, _attached, resolver) = setup();
        let metadata = Metadata::new();

        let first = resolver.resolve(&request("Health"), &metadata).unwrap();
        let second = resolver.resolve(&request("Health"), &metadata).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);

        resolver.clear_cache();
        let third = resolver.resolve(&request("Health"), &metadata).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn failures_are_not_cached() {
        let (_registry, attached, resolver) = setup();
        let metadata = Metadata::new();
        let player = TypeHash::from_name("Player");

        assert!(matches!(
            resolver.resolve(&request("Mana"), &metadata),
            Err(ResolveError::InvalidMember { .. })
        ));

        attached.attach(
            player,
            MemberDescriptor::property(
                "Mana",
                TypeHash::EMPTY,
                DataType::concrete(primitives::I32),
                getter(30),
                None,
            ),
        );

        let found = resolver.resolve(&request("Mana"), &metadata).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].flags.contains(MemberFlags::ATTACHED));
    }

    #[test]
    fn earlier_provider_shadows_later() {
        let (_registry, attached, resolver) = setup();
        let metadata = Metadata::new();
        let player = TypeHash::from_name("Player");

        attached.attach(
            player,
            MemberDescriptor::property(
                "Health",
                TypeHash::EMPTY,
                DataType::concrete(primitives::I32),
                getter(1),
                None,
            ),
        );

        let found = resolver.resolve(&request("Health"), &metadata).unwrap();
        assert_eq!(found.len(), 1);
        assert!(!found[0].flags.contains(MemberFlags::ATTACHED));
    }

    #[test]
    fn flag_filter_rejects_mismatches() {
        let (_registry, _attached, resolver) = setup();
        let metadata = Metadata::new();
        let static_only = MemberRequest::new(
            TypeHash::from_name("Player"),
            MemberKinds::accessor(),
            MemberFlags::STATIC | MemberFlags::PUBLIC,
            "Health",
        );
        assert!(resolver.resolve(&static_only, &metadata).is_err());
    }
}
