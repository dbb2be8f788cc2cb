//! Bindex: a binding-expression pipeline.
//!
//! Expression text such as `Target.Text, Source.Name, Converter=Foo`
//! flows through three stages:
//!
//! 1. **Parse** — a token-parser component chain builds an immutable,
//!    `Arc`-shared AST ([`ExprNode`]) and splits the statement list
//!    into target, source, and named parameters.
//! 2. **Resolve** — a [`MemberResolver`] looks members up through an
//!    ordered provider chain (registry, runtime-attached, extension
//!    methods) with a request-keyed cache.
//! 3. **Compile** — an [`ExpressionCompiler`] turns a node plus a
//!    [`DelegateShape`] into an invocable accessor, selecting overloads
//!    by conversion cost and inferring generic arguments.
//!
//! [`ExpressionPipeline`] wires the stages together. Nothing in the
//! crate is process-global: every pipeline owns its registry, caches,
//! and resources.
//!
//! ```
//! use bindex::{ExpressionPipeline, Metadata};
//!
//! let pipeline = ExpressionPipeline::new();
//! let results = pipeline
//!     .parse("Target.Text, Source.Name, Converter=Foo", &Metadata::new())
//!     .unwrap();
//! assert_eq!(results[0].target.to_string(), "Target.Text");
//! assert_eq!(results[0].parameters.len(), 1);
//! ```

use std::sync::Arc;

pub use bindex_compiler::{
    ArgumentInfo, CompiledAccessor, DelegateShape, ExpressionCompiler, GenericBindings,
    OverloadMatch, convert_value, find_conversion, resolve_overload,
};
pub use bindex_core::{
    BindexError, CompileError, DataType, Delegate, EvalError, GenericConstraint, GenericParam,
    Getter, Invoker, MemberDescriptor, MemberFlags, MemberKind, MemberKinds, MemberRequest,
    Metadata, ObjectRef, Observer, ParamInfo, ParseError, ParseErrorKind, RegistrationError,
    ResolveError, Setter, Subscription, TokenWindow, TypeHash, Value, ValueListener, primitives,
};
pub use bindex_parser::{
    ExprNode, ExprVisitor, ExpressionParser, ExpressionResult, TraversalOrder, rewrite,
};
pub use bindex_registry::{
    AttachedMemberProvider, MemberProvider, MemberRegistry, MemberResolver, TypeRegistration,
};

/// The assembled pipeline: parser, registry, resolver, compiler.
///
/// Cheap to share behind an `Arc`; all interior state is synchronized.
pub struct ExpressionPipeline {
    parser: ExpressionParser,
    registry: Arc<MemberRegistry>,
    attached: Arc<AttachedMemberProvider>,
    resolver: Arc<MemberResolver>,
    compiler: ExpressionCompiler,
}

impl ExpressionPipeline {
    /// A pipeline with an empty registry and the standard provider
    /// chain.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(MemberRegistry::new()))
    }

    /// A pipeline over an existing registry.
    pub fn with_registry(registry: Arc<MemberRegistry>) -> Self {
        let attached = Arc::new(AttachedMemberProvider::new());
        let resolver = Arc::new(MemberResolver::with_registry(
            Arc::clone(&registry),
            Arc::clone(&attached),
        ));
        let compiler = ExpressionCompiler::new(Arc::clone(&resolver), Arc::clone(&registry));
        Self {
            parser: ExpressionParser::new(),
            registry,
            attached,
            resolver,
            compiler,
        }
    }

    pub fn registry(&self) -> &Arc<MemberRegistry> {
        &self.registry
    }

    /// Register a type and its members.
    pub fn register(&self, registration: TypeRegistration) -> Result<TypeHash, RegistrationError> {
        let hash = self.registry.register(registration)?;
        // New members may shadow previously cached lookups.
        self.resolver.clear_cache();
        Ok(hash)
    }

    /// Attach a member to a type at runtime, outside its registration.
    pub fn attach_member(&self, ty: TypeHash, descriptor: MemberDescriptor) {
        self.attached.attach(ty, descriptor);
        self.resolver.clear_cache();
    }

    /// Register a named resource for `$Name` and `$$Name` macros.
    pub fn register_resource(&self, name: impl Into<String>, value: Value) {
        self.compiler.register_resource(name, value);
    }

    /// Parse a statement list into expression results.
    pub fn parse(
        &self,
        source: &str,
        metadata: &Metadata,
    ) -> Result<Vec<ExpressionResult>, ParseError> {
        self.parser.parse(source, metadata)
    }

    /// Compile a node against a delegate shape. Repeat calls for the
    /// same node and shape return the identical cached accessor.
    pub fn compile(
        &self,
        node: &ExprNode,
        shape: &DelegateShape,
        metadata: &Metadata,
    ) -> Result<CompiledAccessor, CompileError> {
        self.compiler.compile(node, shape, metadata)
    }

    /// Resolve a member request through the provider chain.
    pub fn resolve_member(
        &self,
        ty: TypeHash,
        kinds: MemberKinds,
        flags: MemberFlags,
        name: &str,
        metadata: &Metadata,
    ) -> Result<Arc<[Arc<MemberDescriptor>]>, ResolveError> {
        self.resolver
            .resolve(&MemberRequest::new(ty, kinds, flags, name), metadata)
    }

    /// Drop the resolution and accessor caches.
    pub fn clear_caches(&self) {
        self.resolver.clear_cache();
        self.compiler.clear_cache();
    }
}

impl Default for ExpressionPipeline {
    fn default() -> Self {
        Self::new()
    }
}
