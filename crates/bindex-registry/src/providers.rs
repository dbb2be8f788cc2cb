//! The member provider chain.
//!
//! Providers are asked in order and the first one that yields candidates
//! wins. Kind/flag filtering belongs to the resolver; a provider returns
//! everything it knows under the requested (type, name) pair.

use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use bindex_core::member::{MemberDescriptor, MemberFlags, MemberRequest};
use bindex_core::metadata::Metadata;
use bindex_core::type_hash::TypeHash;

use crate::registry::MemberRegistry;

pub trait MemberProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_get_members(
        &self,
        request: &MemberRequest,
        metadata: &Metadata,
    ) -> Vec<Arc<MemberDescriptor>>;
}

/// Members declared when the type was registered.
pub struct RegistryMemberProvider {
    registry: Arc<MemberRegistry>,
}

impl RegistryMemberProvider {
    pub fn new(registry: Arc<MemberRegistry>) -> Self {
        Self { registry }
    }
}

impl MemberProvider for RegistryMemberProvider {
    fn name(&self) -> &'static str {
        "registry"
    }

    fn try_get_members(
        &self,
        request: &MemberRequest,
        _metadata: &Metadata,
    ) -> Vec<Arc<MemberDescriptor>> {
        self.registry.members_of(request.ty, &request.name)
    }
}

/// Members attached to a type at runtime, outside its declaration.
///
/// Shared between the resolver chain and whoever attaches; holds its own
/// lock.
#[derive(Default)]
pub struct AttachedMemberProvider {
    members: RwLock<FxHashMap<(TypeHash, String), Vec<Arc<MemberDescriptor>>>>,
}

impl AttachedMemberProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a member to a type. Later attachments under the same name
    /// become additional overloads.
    pub fn attach(&self, ty: TypeHash, mut descriptor: MemberDescriptor) {
        descriptor.declaring_type = ty;
        descriptor.flags |= MemberFlags::ATTACHED;
        let name = descriptor.name.clone();
        self.members
            .write()
            .unwrap()
            .entry((ty, name))
            .or_default()
            .push(Arc::new(descriptor));
    }
}

impl MemberProvider for AttachedMemberProvider {
    fn name(&self) -> &'static str {
        "attached"
    }

    fn try_get_members(
        &self,
        request: &MemberRequest,
        _metadata: &Metadata,
    ) -> Vec<Arc<MemberDescriptor>> {
        self.members
            .read()
            .unwrap()
            .get(&(request.ty, request.name.clone()))
            .cloned()
            .unwrap_or_default()
    }
}

/// Extension methods whose receiver parameter accepts the request type.
pub struct ExtensionMethodProvider {
    registry: Arc<MemberRegistry>,
}

impl ExtensionMethodProvider {
    pub fn new(registry: Arc<MemberRegistry>) -> Self {
        Self { registry }
    }
}

impl MemberProvider for ExtensionMethodProvider {
    fn name(&self) -> &'static str {
        "extension"
    }

    fn try_get_members(
        &self,
        request: &MemberRequest,
        _metadata: &Metadata,
    ) -> Vec<Arc<MemberDescriptor>> {
        self.registry.extensions_for(request.ty, &request.name)
    }
}
