//! Bindex registry crate.
//!
//! Member registration and resolution:
//! - `MemberRegistry`: process-wide type and extension-method registry
//! - Provider chain: registry, runtime-attached, extension methods
//! - `MemberResolver`: ordered lookup with a process-lifetime cache

pub mod providers;
pub mod registry;
pub mod resolver;

pub use providers::{
    AttachedMemberProvider, ExtensionMethodProvider, MemberProvider, RegistryMemberProvider,
};
pub use registry::{MemberRegistry, TypeEntry, TypeRegistration};
pub use resolver::MemberResolver;
